//! Immediate-mode drawing on top of the batching core.
//!
//! Convention:
//! - CPU geometry is in pixels (top-left origin, +Y down).
//! - The device maps pixels to clip space with the matrix from `Projection`.

mod canvas;
mod projection;

pub use canvas::{Canvas, CanvasConfig};
pub use projection::{Projection, ProjectionCache};
