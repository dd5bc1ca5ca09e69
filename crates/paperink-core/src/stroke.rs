//! Brush stroke data model.

use crate::geom::{self, Capsule};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable stroke identifier, unique within a document's stroke set.
pub type StrokeId = Uuid;

/// Serializable RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Default highlighter color: semi-transparent yellow.
    pub fn highlighter() -> Self {
        Self::new(255, 255, 0, 100)
    }

    pub fn channels(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_channels(c: [u8; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::highlighter()
    }
}

/// Geometric representation of a stroke.
///
/// Exactly one representation is authoritative at a time: a stroke starts as
/// a raw polyline and converts permanently to filled loops the first time an
/// eraser touches it (undo restores the prior form from a snapshot).
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeGeometry {
    /// Ordered pen positions in page-local units, ≥2 points.
    Polyline(Vec<Point>),
    /// Closed loops of a filled area (post-erase), non-empty.
    Shape(Vec<Vec<Point>>),
}

/// One continuous annotation mark, anchored to a single page.
#[derive(Debug, Clone)]
pub struct Stroke {
    pub id: StrokeId,
    /// Page index the stroke is anchored to.
    pub page: usize,
    pub color: Rgba,
    /// Brush diameter in page-local (unscaled) units.
    pub width: f64,
    pub geometry: StrokeGeometry,
}

impl Stroke {
    /// Create a fresh polyline stroke with a new id.
    pub fn new_polyline(page: usize, color: Rgba, width: f64, points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            color,
            width,
            geometry: StrokeGeometry::Polyline(points),
        }
    }

    pub fn is_polyline(&self) -> bool {
        matches!(self.geometry, StrokeGeometry::Polyline(_))
    }

    pub fn as_polyline(&self) -> Option<&[Point]> {
        match &self.geometry {
            StrokeGeometry::Polyline(points) => Some(points),
            StrokeGeometry::Shape(_) => None,
        }
    }

    pub fn as_shape(&self) -> Option<&[Vec<Point>]> {
        match &self.geometry {
            StrokeGeometry::Shape(loops) => Some(loops),
            StrokeGeometry::Polyline(_) => None,
        }
    }

    /// Bounds of the painted area (the polyline body includes the brush
    /// radius on every side).
    pub fn bounds(&self) -> Rect {
        match &self.geometry {
            StrokeGeometry::Polyline(points) => {
                let half = self.width / 2.0;
                geom::points_bounds(points).inflate(half, half)
            }
            StrokeGeometry::Shape(loops) => geom::loops_bounds(loops),
        }
    }

    /// Convert to the filled-shape representation by expanding the polyline
    /// outline at the stored width. No-op when already a shape.
    pub fn convert_to_shape(&mut self) {
        if let StrokeGeometry::Polyline(points) = &self.geometry {
            let loops = geom::expand_polyline(points, self.width);
            self.geometry = StrokeGeometry::Shape(loops);
        }
    }

    /// Exact intersection test against an eraser region (callers should
    /// pre-filter with [`Stroke::bounds`]).
    pub fn hits_eraser(&self, eraser: &Capsule) -> bool {
        match &self.geometry {
            StrokeGeometry::Polyline(points) => {
                geom::capsule_hits_polyline(eraser, points, self.width / 2.0)
            }
            StrokeGeometry::Shape(loops) => geom::capsule_hits_loops(eraser, loops),
        }
    }
}
