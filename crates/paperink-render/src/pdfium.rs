//! PDFium-backed document source.
//!
//! The library binding is process-wide and initialized once; every
//! [`PdfiumOpener::open`] call loads an independent document handle on top
//! of it, which is what lets render workers run without sharing state.

use crate::document::{DocumentOpener, PageSource, RenderError, RenderResult};
use image::RgbaImage;
use kurbo::{Point, Rect, Size};
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::OnceLock;

static PDFIUM: OnceLock<Pdfium> = OnceLock::new();

/// Bind the PDFium library once per process: next to the executable first
/// (bundled installs), then the working directory, then the system paths.
fn pdfium() -> RenderResult<&'static Pdfium> {
    if let Some(bound) = PDFIUM.get() {
        return Ok(bound);
    }
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
    let bindings = exe_dir
        .and_then(|dir| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)).ok()
        })
        .map(Ok)
        .unwrap_or_else(|| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
        })
        .map_err(|err| RenderError::Backend(err.to_string()))?;
    Ok(PDFIUM.get_or_init(|| Pdfium::new(bindings)))
}

/// Opens independent PDFium handles to one document file.
#[derive(Debug, Clone)]
pub struct PdfiumOpener {
    path: PathBuf,
}

impl PdfiumOpener {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentOpener for PdfiumOpener {
    fn open(&self) -> RenderResult<Box<dyn PageSource>> {
        let document = pdfium()?
            .load_pdf_from_file(&self.path, None)
            .map_err(|err| RenderError::Backend(err.to_string()))?;
        Ok(Box::new(PdfiumSource { document }))
    }
}

/// One open PDFium document handle.
pub struct PdfiumSource {
    document: PdfDocument<'static>,
}

impl PdfiumSource {
    fn page(&self, page: usize) -> RenderResult<PdfPage<'_>> {
        let index = u16::try_from(page).map_err(|_| RenderError::InvalidPage(page))?;
        self.document
            .pages()
            .get(index)
            .map_err(|_| RenderError::InvalidPage(page))
    }
}

impl PageSource for PdfiumSource {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, page: usize) -> RenderResult<Size> {
        let page = self.page(page)?;
        Ok(Size::new(
            f64::from(page.width().value),
            f64::from(page.height().value),
        ))
    }

    fn render_page(&self, page: usize, scale: f64) -> RenderResult<RgbaImage> {
        let page = self.page(page)?;
        let width = (f64::from(page.width().value) * scale).round() as i32;
        let height = (f64::from(page.height().value) * scale).round() as i32;
        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|err| RenderError::Render(err.to_string()))?;
        let (w, h) = (bitmap.width() as u32, bitmap.height() as u32);
        let pixels = bitmap.as_rgba_bytes().to_vec();
        RgbaImage::from_raw(w, h, pixels)
            .ok_or_else(|| RenderError::Render("bitmap buffer size mismatch".to_string()))
    }

    fn text_in_rect(&self, page: usize, rect: Rect) -> RenderResult<String> {
        let page = self.page(page)?;
        let page_height = f64::from(page.height().value);
        let text = page
            .text()
            .map_err(|err| RenderError::Render(err.to_string()))?;

        // Collect characters whose center falls inside the rectangle.
        // PDFium bounds are bottom-left origin; convert to top-left.
        let chars = text.chars();
        let mut out = String::new();
        for ch in chars.iter() {
            let Some(c) = ch.unicode_char() else {
                continue;
            };
            let Ok(bounds) = ch.loose_bounds() else {
                continue;
            };
            let cx = f64::from(bounds.left().value + bounds.right().value) / 2.0;
            let cy = page_height - f64::from(bounds.top().value + bounds.bottom().value) / 2.0;
            if rect.contains(Point::new(cx, cy)) {
                out.push(c);
            }
        }
        Ok(out)
    }
}
