//! Signed scalar fields over the page plane.

use super::{Capsule, loops_signed_distance, polyline_distance};
use kurbo::Point;

/// A signed, distance-like field: negative inside the filled region,
/// positive outside, with magnitude approximating the distance to the
/// boundary. The zero level set is the region boundary.
pub trait ScalarField {
    fn value(&self, p: Point) -> f64;
}

/// The filled body of a polyline stroke with round caps and joins.
pub struct StrokeBody<'a> {
    pub points: &'a [Point],
    pub radius: f64,
}

impl ScalarField for StrokeBody<'_> {
    fn value(&self, p: Point) -> f64 {
        polyline_distance(p, self.points) - self.radius
    }
}

/// A filled loop set under the even-odd rule.
pub struct FilledLoops<'a> {
    pub loops: &'a [Vec<Point>],
}

impl ScalarField for FilledLoops<'_> {
    fn value(&self, p: Point) -> f64 {
        loops_signed_distance(p, self.loops)
    }
}

/// The eraser region.
pub struct CapsuleField(pub Capsule);

impl ScalarField for CapsuleField {
    fn value(&self, p: Point) -> f64 {
        self.0.distance(p)
    }
}

/// Boolean subtraction: `shape` minus `cut`.
pub struct Difference<A, B> {
    pub shape: A,
    pub cut: B,
}

impl<A: ScalarField, B: ScalarField> ScalarField for Difference<A, B> {
    fn value(&self, p: Point) -> f64 {
        self.shape.value(p).max(-self.cut.value(p))
    }
}
