//! Rectangular text-selection state (alt + drag rubber band).

use kurbo::{Point, Rect};

#[derive(Debug, Default)]
pub struct TextSelector {
    start: Option<Point>,
    current: Option<Point>,
}

impl TextSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selecting(&self) -> bool {
        self.start.is_some()
    }

    /// Begin a selection at a scene point.
    pub fn begin(&mut self, scene: Point) {
        self.start = Some(scene);
        self.current = Some(scene);
    }

    /// Update the moving corner. No-op unless a selection is active.
    pub fn update(&mut self, scene: Point) {
        if self.start.is_some() {
            self.current = Some(scene);
        }
    }

    /// Normalized selection rectangle, for rubber-band display.
    pub fn rect(&self) -> Option<Rect> {
        match (self.start, self.current) {
            (Some(a), Some(b)) => Some(Rect::from_points(a, b)),
            _ => None,
        }
    }

    /// Finish the selection, returning the final rectangle.
    pub fn take(&mut self) -> Option<Rect> {
        let rect = self.rect();
        self.start = None;
        self.current = None;
        rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_lifecycle() {
        let mut sel = TextSelector::new();
        assert!(!sel.is_selecting());
        assert!(sel.rect().is_none());

        sel.begin(Point::new(10.0, 20.0));
        sel.update(Point::new(4.0, 50.0));
        assert!(sel.is_selecting());
        let rect = sel.rect().unwrap();
        // Normalized regardless of drag direction.
        assert_eq!(rect, Rect::new(4.0, 20.0, 10.0, 50.0));

        let taken = sel.take().unwrap();
        assert_eq!(taken, rect);
        assert!(!sel.is_selecting());
        assert!(sel.take().is_none());
    }

    #[test]
    fn test_update_without_begin_is_noop() {
        let mut sel = TextSelector::new();
        sel.update(Point::new(5.0, 5.0));
        assert!(sel.rect().is_none());
    }
}
