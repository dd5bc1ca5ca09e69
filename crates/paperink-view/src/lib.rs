//! PaperInk View Library
//!
//! Maps pointer, wheel and key events onto the annotation engine, render
//! pipeline and viewport transform, and keeps linked side-by-side
//! viewports in sync.

pub mod input;
pub mod selection;
pub mod session;
pub mod sync;
pub mod viewport;

pub use input::{Gesture, Modifiers, PointerButton, WheelAction};
pub use selection::TextSelector;
pub use session::{DocumentSession, OpenRequest, SessionEvent};
pub use sync::{DualView, Side};
pub use viewport::{MAX_ZOOM, MIN_ZOOM, Viewport, ZOOM_STEP};
