//! PaperInk Render Library
//!
//! Background, cancellable, disk-cached page rasterization feeding the
//! scrollable document view.

pub mod cache;
pub mod cancel;
pub mod document;
pub mod layout;
pub mod pipeline;

#[cfg(feature = "pdfium")]
pub mod pdfium;

pub use cache::PageCache;
pub use cancel::CancelToken;
pub use document::{DocumentOpener, OutlineEntry, PageSource, RenderError, RenderResult};
pub use layout::{PAGE_PADDING, PageFrame, PageLayout};
pub use pipeline::{
    BASE_RENDER_SCALE, MAX_CONCURRENT_WORKERS, PageEvent, PageState, RenderPipeline,
    placeholder_sizes,
};

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumOpener;
