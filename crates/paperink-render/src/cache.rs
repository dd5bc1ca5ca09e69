//! Disk-backed page bitmap cache.
//!
//! One JPEG per page (`page_{i}.jpg`) in a per-document directory. Reads
//! serve both bitmaps and header-only dimensions (for placeholder sizing
//! when the source document cannot be opened); writes are best-effort.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult, RgbaImage};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone)]
pub struct PageCache {
    dir: PathBuf,
}

impl PageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory under the platform cache location
    /// (e.g. `~/.cache/paperink/<document>` on Linux).
    pub fn in_default_location(document_stem: &str) -> Option<Self> {
        dirs::cache_dir().map(|base| Self::new(base.join("paperink").join(document_stem)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn page_path(&self, page: usize) -> PathBuf {
        self.dir.join(format!("page_{page}.jpg"))
    }

    /// Load a cached page bitmap, if present and decodable.
    pub fn load(&self, page: usize) -> Option<RgbaImage> {
        let path = self.page_path(page);
        if !path.exists() {
            return None;
        }
        image::open(&path).ok().map(|img| img.to_rgba8())
    }

    /// Pixel dimensions of a cached page without decoding the full image.
    pub fn dimensions(&self, page: usize) -> Option<(u32, u32)> {
        image::image_dimensions(self.page_path(page)).ok()
    }

    /// Write a page bitmap to the cache. Callers treat failure as
    /// fire-and-forget: the in-memory bitmap is still delivered.
    pub fn store(&self, page: usize, image: &RgbaImage) -> ImageResult<()> {
        fs::create_dir_all(&self.dir).map_err(image::ImageError::IoError)?;
        let file = File::create(self.page_path(page)).map_err(image::ImageError::IoError)?;
        let writer = BufWriter::new(file);
        // JPEG has no alpha channel; flatten before encoding.
        let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, JPEG_QUALITY))
    }

    /// Number of consecutively cached pages starting at page 0. Used to
    /// recover a page count when only the cache exists.
    pub fn page_count(&self) -> usize {
        let mut count = 0;
        while self.page_path(count).exists() {
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    fn solid_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([200, 180, 40, 255]))
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempdir().unwrap();
        let cache = PageCache::new(dir.path().join("doc"));
        assert!(cache.load(0).is_none());

        cache.store(0, &solid_image(40, 60)).unwrap();
        let loaded = cache.load(0).expect("cached page loads");
        assert_eq!(loaded.dimensions(), (40, 60));
    }

    #[test]
    fn test_dimensions_without_decode() {
        let dir = tempdir().unwrap();
        let cache = PageCache::new(dir.path());
        cache.store(3, &solid_image(123, 456)).unwrap();
        assert_eq!(cache.dimensions(3), Some((123, 456)));
        assert_eq!(cache.dimensions(4), None);
    }

    #[test]
    fn test_page_count_counts_consecutive_pages() {
        let dir = tempdir().unwrap();
        let cache = PageCache::new(dir.path());
        assert_eq!(cache.page_count(), 0);
        cache.store(0, &solid_image(10, 10)).unwrap();
        cache.store(1, &solid_image(10, 10)).unwrap();
        // A gap stops the count.
        cache.store(3, &solid_image(10, 10)).unwrap();
        assert_eq!(cache.page_count(), 2);
    }
}
