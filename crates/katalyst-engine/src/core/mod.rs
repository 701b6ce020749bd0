//! Contracts between the runtime loop and the application.
//!
//! The runtime owns windows, surfaces and canvases; the application sees them
//! only through `FrameCtx` and the `App` callbacks.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
