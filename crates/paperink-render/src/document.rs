//! Document backend abstraction.
//!
//! Handles are not assumed safe for concurrent page access, so the pipeline
//! never shares one: every render worker opens its own `PageSource` through
//! the shared `DocumentOpener`.

use image::RgbaImage;
use kurbo::{Rect, Size};
use thiserror::Error;

/// Rendering and document-access errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document backend unavailable: {0}")]
    Backend(String),
    #[error("invalid page index {0}")]
    InvalidPage(usize),
    #[error("render failed: {0}")]
    Render(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for document operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// One entry of a document's embedded outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    /// 1-based nesting depth.
    pub level: u32,
    pub title: String,
    /// 0-based page index.
    pub page: usize,
    /// Vertical target offset within the page, in document points.
    pub dest_y: Option<f64>,
}

/// Read access to one open document handle.
pub trait PageSource: Send {
    fn page_count(&self) -> usize;

    /// Page size in document points.
    fn page_size(&self, page: usize) -> RenderResult<Size>;

    /// Rasterize a page at `scale` pixels per document point.
    fn render_page(&self, page: usize, scale: f64) -> RenderResult<RgbaImage>;

    /// Plain text whose glyphs fall inside a page-local rectangle
    /// (document points, top-left origin).
    fn text_in_rect(&self, page: usize, rect: Rect) -> RenderResult<String>;

    /// The document's embedded outline. Backends without outline access
    /// return an empty list; the saved TOC sidecar wins over it anyway.
    fn outline(&self) -> RenderResult<Vec<OutlineEntry>> {
        Ok(Vec::new())
    }
}

/// Factory producing independent document handles. Shared across render
/// workers; each call opens a fresh handle.
pub trait DocumentOpener: Send + Sync {
    fn open(&self) -> RenderResult<Box<dyn PageSource>>;
}
