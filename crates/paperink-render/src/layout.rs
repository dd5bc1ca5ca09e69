//! Scene layout of page frames.
//!
//! Pages stack vertically with fixed padding, horizontally centered on the
//! widest page. Frames are placed synchronously at document open (from
//! placeholder dimensions) so scrolling works before any bitmap arrives;
//! rotation changes page dimensions and triggers a full relayout.

use kurbo::{Point, Rect, Size};

/// Fixed vertical gap between pages, in scene units.
pub const PAGE_PADDING: f64 = 20.0;

/// Position and size of one page in scene coordinates (pixels at the base
/// render scale).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageFrame {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    frames: Vec<PageFrame>,
}

impl PageLayout {
    /// Build a layout from per-page pixel dimensions.
    pub fn from_sizes(sizes: &[(f64, f64)]) -> Self {
        let mut layout = Self {
            frames: sizes
                .iter()
                .map(|&(width, height)| PageFrame {
                    x: 0.0,
                    y: 0.0,
                    width,
                    height,
                })
                .collect(),
        };
        layout.relayout();
        layout
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, page: usize) -> Option<&PageFrame> {
        self.frames.get(page)
    }

    pub fn frames(&self) -> &[PageFrame] {
        &self.frames
    }

    /// Replace a page's dimensions (e.g. when its real bitmap differs from
    /// the placeholder guess). Callers follow with [`PageLayout::relayout`].
    pub fn set_page_size(&mut self, page: usize, width: f64, height: f64) {
        if let Some(frame) = self.frames.get_mut(page) {
            frame.width = width;
            frame.height = height;
        }
    }

    /// Swap a page's width and height (90° / 270° rotation).
    pub fn swap_page_dimensions(&mut self, page: usize) {
        if let Some(frame) = self.frames.get_mut(page) {
            std::mem::swap(&mut frame.width, &mut frame.height);
        }
    }

    /// Recompute every page's vertical offset and horizontal centering.
    /// Needed after rotation since pages may then differ in width.
    pub fn relayout(&mut self) {
        let max_width = self
            .frames
            .iter()
            .map(|f| f.width)
            .fold(0.0f64, f64::max);
        let mut y = 0.0;
        for frame in &mut self.frames {
            frame.x = (max_width - frame.width) / 2.0;
            frame.y = y;
            y += frame.height + PAGE_PADDING;
        }
    }

    /// Total scene extent.
    pub fn scene_size(&self) -> Size {
        let width = self.frames.iter().map(|f| f.width).fold(0.0f64, f64::max);
        let height = self
            .frames
            .last()
            .map(|f| f.y + f.height)
            .unwrap_or(0.0);
        Size::new(width, height)
    }

    /// Page whose vertical span contains `y` (scene units); pages are
    /// separated by padding, so fall back to the nearest preceding page.
    pub fn page_at(&self, y: f64) -> usize {
        for (index, frame) in self.frames.iter().enumerate() {
            if y < frame.y + frame.height + PAGE_PADDING {
                return index;
            }
        }
        self.frames.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_stacking_with_padding() {
        let layout = PageLayout::from_sizes(&[(100.0, 200.0), (100.0, 300.0)]);
        let first = layout.frame(0).unwrap();
        let second = layout.frame(1).unwrap();
        assert_eq!(first.y, 0.0);
        assert_eq!(second.y, 200.0 + PAGE_PADDING);
        assert_eq!(layout.scene_size(), Size::new(100.0, 520.0));
    }

    #[test]
    fn test_narrow_pages_are_centered() {
        let layout = PageLayout::from_sizes(&[(200.0, 100.0), (100.0, 100.0)]);
        assert_eq!(layout.frame(0).unwrap().x, 0.0);
        assert_eq!(layout.frame(1).unwrap().x, 50.0);
    }

    #[test]
    fn test_rotation_changes_layout() {
        let mut layout = PageLayout::from_sizes(&[(100.0, 200.0), (100.0, 200.0)]);
        layout.swap_page_dimensions(0);
        layout.relayout();
        // Page 0 is now 200 wide; page 1 centers under it and moves up.
        assert_eq!(layout.frame(0).unwrap().width, 200.0);
        assert_eq!(layout.frame(1).unwrap().x, 50.0);
        assert_eq!(layout.frame(1).unwrap().y, 100.0 + PAGE_PADDING);
    }

    #[test]
    fn test_page_at() {
        let layout = PageLayout::from_sizes(&[(100.0, 200.0), (100.0, 200.0), (100.0, 200.0)]);
        assert_eq!(layout.page_at(-5.0), 0);
        assert_eq!(layout.page_at(100.0), 0);
        assert_eq!(layout.page_at(250.0), 1);
        assert_eq!(layout.page_at(10_000.0), 2);
    }

    #[test]
    fn test_empty_layout() {
        let layout = PageLayout::from_sizes(&[]);
        assert!(layout.is_empty());
        assert_eq!(layout.page_at(50.0), 0);
        assert_eq!(layout.scene_size(), Size::ZERO);
    }
}
