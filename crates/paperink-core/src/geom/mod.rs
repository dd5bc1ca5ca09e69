//! Geometry kernel for the brush engine.
//!
//! Strokes and eraser regions are evaluated as signed scalar fields
//! (negative inside), combined with min/max, and traced back into closed
//! polygon loops. This gives outline expansion, boolean subtraction and
//! self-intersection cleanup with a single mechanism.

mod field;
mod march;

pub use field::{CapsuleField, Difference, FilledLoops, ScalarField, StrokeBody};
pub use march::trace_loops;

use kurbo::{Point, Rect};

/// Distance from `p` to the segment `a`-`b`.
pub fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq < f64::EPSILON {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

/// Distance between the segments `a1`-`a2` and `b1`-`b2` (zero when they cross).
pub fn segment_segment_distance(a1: Point, a2: Point, b1: Point, b2: Point) -> f64 {
    if segments_cross(a1, a2, b1, b2) {
        return 0.0;
    }
    segment_distance(a1, b1, b2)
        .min(segment_distance(a2, b1, b2))
        .min(segment_distance(b1, a1, a2))
        .min(segment_distance(b2, a1, a2))
}

fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b - a).cross(c - a)
}

/// Proper-crossing test; touching and collinear overlap are handled by the
/// endpoint distances in [`segment_segment_distance`].
fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);
    (d1 > 0.0) != (d2 > 0.0) && (d3 > 0.0) != (d4 > 0.0)
}

/// The swept eraser region: a stadium between two pointer samples, or a
/// circle when the gesture has no previous sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub a: Point,
    pub b: Point,
    pub radius: f64,
}

impl Capsule {
    pub fn new(a: Point, b: Point, radius: f64) -> Self {
        Self { a, b, radius }
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center, center, radius)
    }

    /// Signed distance: negative inside the capsule.
    pub fn distance(&self, p: Point) -> f64 {
        segment_distance(p, self.a, self.b) - self.radius
    }

    pub fn contains(&self, p: Point) -> bool {
        self.distance(p) <= 0.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.a, self.b).inflate(self.radius, self.radius)
    }
}

/// Minimum distance from `p` to a polyline.
pub fn polyline_distance(p: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [single] => (p - *single).hypot(),
        _ => points
            .windows(2)
            .map(|w| segment_distance(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Axis-aligned bounds of a point sequence.
pub fn points_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    let mut bounds = Rect::from_points(*first, *first);
    for p in &points[1..] {
        bounds = bounds.union_pt(*p);
    }
    bounds
}

/// Axis-aligned bounds of a set of loops.
pub fn loops_bounds(loops: &[Vec<Point>]) -> Rect {
    loops
        .iter()
        .map(|lp| points_bounds(lp))
        .reduce(|a, b| a.union(b))
        .unwrap_or(Rect::ZERO)
}

/// Even-odd containment test over a set of closed loops.
pub fn point_in_loops(p: Point, loops: &[Vec<Point>]) -> bool {
    let mut inside = false;
    for lp in loops {
        let n = lp.len();
        for i in 0..n {
            let a = lp[i];
            let b = lp[(i + 1) % n];
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if x > p.x {
                    inside = !inside;
                }
            }
        }
    }
    inside
}

/// Signed distance to a filled loop set: negative inside (even-odd rule).
pub fn loops_signed_distance(p: Point, loops: &[Vec<Point>]) -> f64 {
    let mut dist = f64::INFINITY;
    for lp in loops {
        let n = lp.len();
        for i in 0..n {
            dist = dist.min(segment_distance(p, lp[i], lp[(i + 1) % n]));
        }
    }
    if point_in_loops(p, loops) { -dist } else { dist }
}

/// Signed shoelace area of one closed loop.
pub fn loop_signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Net area of a loop set with consistent orientation (holes cancel out).
pub fn loops_area(loops: &[Vec<Point>]) -> f64 {
    loops.iter().map(|lp| loop_signed_area(lp)).sum::<f64>().abs()
}

/// Does the eraser capsule touch a polyline stroke of the given half-width?
pub fn capsule_hits_polyline(eraser: &Capsule, points: &[Point], half_width: f64) -> bool {
    let reach = eraser.radius + half_width;
    match points {
        [] => false,
        [single] => segment_distance(*single, eraser.a, eraser.b) <= reach,
        _ => points
            .windows(2)
            .any(|w| segment_segment_distance(eraser.a, eraser.b, w[0], w[1]) <= reach),
    }
}

/// Does the eraser capsule touch a filled loop set?
pub fn capsule_hits_loops(eraser: &Capsule, loops: &[Vec<Point>]) -> bool {
    for lp in loops {
        let n = lp.len();
        for i in 0..n {
            if segment_segment_distance(eraser.a, eraser.b, lp[i], lp[(i + 1) % n])
                <= eraser.radius
            {
                return true;
            }
        }
    }
    // No boundary contact: the capsule is either fully inside or fully outside.
    point_in_loops(eraser.a, loops)
}

/// Grid resolution used when tracing a brush of the given width.
pub fn grid_step_for_width(width: f64) -> f64 {
    (width / 6.0).clamp(0.35, 1.5)
}

/// Expand a raw polyline into the filled loops of its stroked outline
/// (round caps and joins, self-intersections resolved).
pub fn expand_polyline(points: &[Point], width: f64) -> Vec<Vec<Point>> {
    if points.is_empty() {
        return Vec::new();
    }
    let radius = width / 2.0;
    let body = StrokeBody { points, radius };
    let region = points_bounds(points).inflate(radius, radius);
    trace_loops(&body, region, grid_step_for_width(width))
}

/// Subtract an eraser capsule from a filled loop set, returning the
/// remaining loops (empty when the shape is fully erased).
pub fn subtract_capsule(loops: &[Vec<Point>], eraser: &Capsule, step: f64) -> Vec<Vec<Point>> {
    if loops.is_empty() {
        return Vec::new();
    }
    let shape = FilledLoops { loops };
    let cut = CapsuleField(*eraser);
    let region = loops_bounds(loops);
    trace_loops(&Difference { shape, cut }, region, step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((segment_distance(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-9);
        assert!((segment_distance(Point::new(-4.0, 0.0), a, b) - 4.0).abs() < 1e-9);
        // Degenerate segment collapses to a point.
        assert!((segment_distance(Point::new(3.0, 4.0), a, a) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_segment_distance_crossing() {
        let d = segment_segment_distance(
            Point::new(-5.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(0.0, -5.0),
            Point::new(0.0, 5.0),
        );
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_segment_segment_distance_parallel() {
        let d = segment_segment_distance(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(10.0, 4.0),
        );
        assert!((d - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_in_loops_square() {
        let square = vec![vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]];
        assert!(point_in_loops(Point::new(5.0, 5.0), &square));
        assert!(!point_in_loops(Point::new(15.0, 5.0), &square));
        assert!(!point_in_loops(Point::new(-1.0, -1.0), &square));
    }

    #[test]
    fn test_loops_signed_distance() {
        let square = vec![vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]];
        assert!((loops_signed_distance(Point::new(5.0, 5.0), &square) + 5.0).abs() < 1e-9);
        assert!((loops_signed_distance(Point::new(13.0, 5.0), &square) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_loop_area() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!((loop_signed_area(&square).abs() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_capsule_contains() {
        let cap = Capsule::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 2.0);
        assert!(cap.contains(Point::new(5.0, 1.5)));
        assert!(!cap.contains(Point::new(5.0, 2.5)));
        assert!(cap.contains(Point::new(-1.5, 0.0)));
    }

    #[test]
    fn test_capsule_hits_polyline() {
        let line = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let near = Capsule::circle(Point::new(50.0, 8.0), 3.0);
        let far = Capsule::circle(Point::new(50.0, 20.0), 3.0);
        assert!(capsule_hits_polyline(&near, &line, 6.0));
        assert!(!capsule_hits_polyline(&far, &line, 6.0));
    }

    #[test]
    fn test_capsule_inside_loops_counts_as_hit() {
        let square = vec![vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]];
        let inner = Capsule::circle(Point::new(50.0, 50.0), 5.0);
        assert!(capsule_hits_loops(&inner, &square));
        let outer = Capsule::circle(Point::new(200.0, 50.0), 5.0);
        assert!(!capsule_hits_loops(&outer, &square));
    }

    #[test]
    fn test_expand_polyline_area() {
        // A straight stroke expands to roughly a stadium: L*w + pi*r^2.
        let width = 20.0;
        let points = [Point::new(0.0, 0.0), Point::new(60.0, 0.0)];
        let loops = expand_polyline(&points, width);
        assert!(!loops.is_empty());
        let expected = 60.0 * width + std::f64::consts::PI * 100.0;
        let area = loops_area(&loops);
        assert!(
            (area - expected).abs() / expected < 0.05,
            "area {area} vs expected {expected}"
        );
    }

    #[test]
    fn test_expand_self_intersecting_polyline() {
        // An X-shaped stroke: the crossing region must be filled, not a hole.
        let points = [
            Point::new(0.0, 0.0),
            Point::new(40.0, 40.0),
            Point::new(0.0, 40.0),
            Point::new(40.0, 0.0),
        ];
        let loops = expand_polyline(&points, 8.0);
        assert!(!loops.is_empty());
        assert!(point_in_loops(Point::new(20.0, 20.0), &loops));
    }

    #[test]
    fn test_subtract_capsule_partial() {
        let loops = expand_polyline(&[Point::new(0.0, 0.0), Point::new(60.0, 0.0)], 10.0);
        let before = loops_area(&loops);
        let eraser = Capsule::circle(Point::new(0.0, 0.0), 10.0);
        let remaining = subtract_capsule(&loops, &eraser, 0.5);
        assert!(!remaining.is_empty());
        let after = loops_area(&remaining);
        assert!(after < before);
        // The erased end is gone, the far end survives.
        assert!(!point_in_loops(Point::new(0.0, 0.0), &remaining));
        assert!(point_in_loops(Point::new(55.0, 0.0), &remaining));
    }

    #[test]
    fn test_subtract_capsule_full() {
        let loops = expand_polyline(&[Point::new(0.0, 0.0), Point::new(20.0, 0.0)], 6.0);
        let eraser = Capsule::new(Point::new(-10.0, 0.0), Point::new(30.0, 0.0), 20.0);
        assert!(subtract_capsule(&loops, &eraser, 0.5).is_empty());
    }
}
