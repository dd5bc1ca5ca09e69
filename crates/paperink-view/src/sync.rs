//! Linked side-by-side viewports (original + translated document).
//!
//! One viewport's scroll or zoom change is broadcast to the other; the
//! `syncing` flag is a re-entrancy guard so a change applied by the
//! broadcast cannot echo back and feed a loop.

use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug)]
pub struct DualView {
    left: Viewport,
    right: Viewport,
    syncing: bool,
}

impl DualView {
    pub fn new(left: Viewport, right: Viewport) -> Self {
        Self {
            left,
            right,
            syncing: false,
        }
    }

    pub fn viewport(&self, side: Side) -> &Viewport {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn viewport_mut(&mut self, side: Side) -> &mut Viewport {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// True while a broadcast is being applied; hosts that re-enter from
    /// scroll/zoom notifications must not rebroadcast.
    pub fn is_syncing(&self) -> bool {
        self.syncing
    }

    /// Mirror `side`'s scroll position (as fractions of the scrollable
    /// range, since the two documents may differ in length) to the other
    /// viewport.
    pub fn scrolled(&mut self, side: Side) {
        if self.syncing {
            return;
        }
        self.syncing = true;
        let (fx, fy) = self.viewport(side).scroll_fraction();
        self.viewport_mut(side.other()).set_scroll_fraction(fx, fy);
        self.syncing = false;
    }

    /// Mirror `side`'s zoom level to the other viewport.
    pub fn zoomed(&mut self, side: Side) {
        if self.syncing {
            return;
        }
        self.syncing = true;
        let zoom = self.viewport(side).zoom();
        self.viewport_mut(side.other()).set_zoom(zoom);
        self.syncing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    fn pair() -> DualView {
        let mut left = Viewport::new(2.5);
        left.set_view_size(Size::new(400.0, 400.0));
        left.set_scene_size(Size::new(1500.0, 6000.0));
        let mut right = Viewport::new(2.5);
        right.set_view_size(Size::new(400.0, 400.0));
        // The translated document is longer.
        right.set_scene_size(Size::new(1500.0, 9000.0));
        DualView::new(left, right)
    }

    #[test]
    fn test_scroll_broadcast_mirrors_fractions() {
        let mut dual = pair();
        dual.viewport_mut(Side::Left).set_scroll_fraction(0.0, 0.5);
        dual.scrolled(Side::Left);
        let (_, fy) = dual.viewport(Side::Right).scroll_fraction();
        assert!((fy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_broadcast() {
        let mut dual = pair();
        dual.viewport_mut(Side::Right).set_zoom(2.0);
        dual.zoomed(Side::Right);
        assert_eq!(dual.viewport(Side::Left).zoom(), 2.0);
    }

    #[test]
    fn test_guard_blocks_reentrant_broadcast() {
        let mut dual = pair();
        dual.syncing = true;
        dual.viewport_mut(Side::Left).set_scroll_fraction(0.0, 1.0);
        dual.scrolled(Side::Left);
        // Broadcast suppressed while syncing.
        let (_, fy) = dual.viewport(Side::Right).scroll_fraction();
        assert_eq!(fy, 0.0);
        dual.syncing = false;
        dual.scrolled(Side::Left);
        let (_, fy) = dual.viewport(Side::Right).scroll_fraction();
        assert!((fy - 1.0).abs() < 1e-9);
    }
}
