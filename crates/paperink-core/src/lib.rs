//! PaperInk Core Library
//!
//! Stroke model, annotation engine, geometry kernel and sidecar persistence
//! for the PaperInk PDF annotation reader.

pub mod engine;
pub mod geom;
pub mod rotation;
pub mod store;
pub mod stroke;
pub mod toc;

pub use engine::{BrushEngine, BrushTool, DEFAULT_BRUSH_WIDTH, MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH};
pub use rotation::RotationMap;
pub use store::{StoreError, StoreResult};
pub use stroke::{Rgba, Stroke, StrokeGeometry, StrokeId};
pub use toc::{Toc, TocEntry};
