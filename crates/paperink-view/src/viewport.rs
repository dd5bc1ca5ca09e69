//! Viewport transform: zoom and scroll over the page scene.
//!
//! Three coordinate spaces: *view* (widget pixels), *scene* (pixels at the
//! base render scale, pages stacked vertically) and *page-local* (unscaled
//! document points relative to one page's origin). Strokes are captured in
//! page-local units so they survive any change to the render scale.

use kurbo::{Point, Size, Vec2};
use paperink_render::PageLayout;

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 10.0;
/// Multiplicative step per zoom wheel notch.
pub const ZOOM_STEP: f64 = 1.1;

#[derive(Debug, Clone)]
pub struct Viewport {
    /// 1.0 = 100%.
    zoom: f64,
    /// Scene pixels per document point (the oversampling render scale).
    base_scale: f64,
    /// Scene position of the view's top-left corner.
    scroll: Vec2,
    view_size: Size,
    scene_size: Size,
}

impl Viewport {
    pub fn new(base_scale: f64) -> Self {
        Self {
            zoom: 1.0,
            base_scale,
            scroll: Vec2::ZERO,
            view_size: Size::new(800.0, 600.0),
            scene_size: Size::ZERO,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn base_scale(&self) -> f64 {
        self.base_scale
    }

    /// View pixels per scene unit.
    pub fn view_scale(&self) -> f64 {
        self.zoom / self.base_scale
    }

    pub fn set_view_size(&mut self, size: Size) {
        self.view_size = size;
        self.clamp_scroll();
    }

    pub fn set_scene_size(&mut self, size: Size) {
        self.scene_size = size;
        self.clamp_scroll();
    }

    /// Set the zoom level, clamped into [0.2, 10.0]. Returns whether it
    /// changed.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if (zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }
        self.zoom = zoom;
        self.clamp_scroll();
        true
    }

    /// Zoom by `factor`, keeping the scene point under `view_anchor` fixed.
    pub fn zoom_at(&mut self, view_anchor: Point, factor: f64) -> bool {
        let anchor_scene = self.to_scene(view_anchor);
        if !self.set_zoom(self.zoom * factor) {
            return false;
        }
        self.scroll = anchor_scene.to_vec2() - view_anchor.to_vec2() / self.view_scale();
        self.clamp_scroll();
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom * ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom / ZOOM_STEP)
    }

    /// Map a view point to scene coordinates.
    pub fn to_scene(&self, view: Point) -> Point {
        let s = self.view_scale();
        Point::new(self.scroll.x + view.x / s, self.scroll.y + view.y / s)
    }

    /// Map a scene point back to view coordinates.
    pub fn to_view(&self, scene: Point) -> Point {
        let s = self.view_scale();
        Point::new((scene.x - self.scroll.x) * s, (scene.y - self.scroll.y) * s)
    }

    /// Scene point at the center of the view, used for current-page
    /// detection.
    pub fn visible_center(&self) -> Point {
        self.to_scene(Point::new(
            self.view_size.width / 2.0,
            self.view_size.height / 2.0,
        ))
    }

    /// Drag the content by a view-space delta (right-button pan): content
    /// follows the cursor.
    pub fn pan_by(&mut self, view_delta: Vec2) {
        self.scroll -= view_delta / self.view_scale();
        self.clamp_scroll();
    }

    fn max_scroll(&self) -> Vec2 {
        let s = self.view_scale();
        Vec2::new(
            (self.scene_size.width - self.view_size.width / s).max(0.0),
            (self.scene_size.height - self.view_size.height / s).max(0.0),
        )
    }

    fn clamp_scroll(&mut self) {
        let max = self.max_scroll();
        self.scroll = Vec2::new(self.scroll.x.clamp(0.0, max.x), self.scroll.y.clamp(0.0, max.y));
    }

    /// Scroll position as fractions of the scrollable range, for linked
    /// viewports whose documents may differ in length.
    pub fn scroll_fraction(&self) -> (f64, f64) {
        let max = self.max_scroll();
        let fx = if max.x > 0.0 { self.scroll.x / max.x } else { 0.0 };
        let fy = if max.y > 0.0 { self.scroll.y / max.y } else { 0.0 };
        (fx, fy)
    }

    pub fn set_scroll_fraction(&mut self, fx: f64, fy: f64) {
        let max = self.max_scroll();
        self.scroll = Vec2::new(max.x * fx.clamp(0.0, 1.0), max.y * fy.clamp(0.0, 1.0));
    }

    /// Scroll so that a page's top edge is at the top of the view.
    pub fn scroll_to_page(&mut self, layout: &PageLayout, page: usize) {
        if let Some(frame) = layout.frame(page) {
            self.scroll = Vec2::new(self.scroll.x, frame.y);
            self.clamp_scroll();
        }
    }

    /// Resolve a scene point to `(page index, page-local point)`. Points in
    /// the padding between pages resolve to the nearest preceding page.
    pub fn scene_to_page(&self, layout: &PageLayout, scene: Point) -> (usize, Point) {
        let page = layout.page_at(scene.y);
        let origin = layout
            .frame(page)
            .map(|f| f.origin())
            .unwrap_or(Point::ZERO);
        (
            page,
            Point::new(
                (scene.x - origin.x) / self.base_scale,
                (scene.y - origin.y) / self.base_scale,
            ),
        )
    }

    /// Map a page-local point back to scene coordinates.
    pub fn page_to_scene(&self, layout: &PageLayout, page: usize, local: Point) -> Point {
        let origin = layout
            .frame(page)
            .map(|f| f.origin())
            .unwrap_or(Point::ZERO);
        Point::new(
            origin.x + local.x * self.base_scale,
            origin.y + local.y * self.base_scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport_with_scene() -> Viewport {
        let mut vp = Viewport::new(2.5);
        vp.set_view_size(Size::new(400.0, 400.0));
        vp.set_scene_size(Size::new(2000.0, 6000.0));
        vp
    }

    #[test]
    fn test_zoom_clamp() {
        let mut vp = viewport_with_scene();
        vp.set_zoom(0.001);
        assert_eq!(vp.zoom(), MIN_ZOOM);
        vp.set_zoom(1000.0);
        assert_eq!(vp.zoom(), MAX_ZOOM);
    }

    #[test]
    fn test_view_scene_round_trip() {
        let mut vp = viewport_with_scene();
        vp.set_zoom(1.5);
        vp.set_scroll_fraction(0.3, 0.7);
        let view = Point::new(123.0, 45.0);
        let back = vp.to_view(vp.to_scene(view));
        assert!((back.x - view.x).abs() < 1e-9);
        assert!((back.y - view.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut vp = viewport_with_scene();
        vp.set_scroll_fraction(0.5, 0.5);
        let anchor = Point::new(200.0, 100.0);
        let before = vp.to_scene(anchor);
        assert!(vp.zoom_at(anchor, 1.1));
        let after = vp.to_scene(anchor);
        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);
    }

    #[test]
    fn test_scroll_fraction_round_trip() {
        let mut vp = viewport_with_scene();
        vp.set_scroll_fraction(0.25, 0.5);
        let (fx, fy) = vp.scroll_fraction();
        assert!((fx - 0.25).abs() < 1e-9);
        assert!((fy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_pan_is_clamped() {
        let mut vp = viewport_with_scene();
        vp.pan_by(Vec2::new(10_000.0, 10_000.0));
        assert_eq!(vp.scroll_fraction(), (0.0, 0.0));
        vp.pan_by(Vec2::new(-1e9, -1e9));
        assert_eq!(vp.scroll_fraction(), (1.0, 1.0));
    }

    #[test]
    fn test_scene_to_page_round_trip() {
        let layout = PageLayout::from_sizes(&[(1000.0, 1500.0), (1000.0, 1500.0)]);
        let vp = Viewport::new(2.5);
        let scene = vp.page_to_scene(&layout, 1, Point::new(40.0, 80.0));
        let (page, local) = vp.scene_to_page(&layout, scene);
        assert_eq!(page, 1);
        assert!((local.x - 40.0).abs() < 1e-9);
        assert!((local.y - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_base_scale_maps_points_to_scene_pixels() {
        let layout = PageLayout::from_sizes(&[(1000.0, 1500.0)]);
        let vp = Viewport::new(2.5);
        // One document point is base_scale scene pixels.
        let scene = vp.page_to_scene(&layout, 0, Point::new(10.0, 10.0));
        assert_eq!(scene, Point::new(25.0, 25.0));
    }
}
