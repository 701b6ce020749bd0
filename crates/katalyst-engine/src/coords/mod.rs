//! Coordinate, geometry and color types shared by the batcher and the devices.
//!
//! Canonical CPU space:
//! - Pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! The projection (see `render::Projection`) maps this space to device coordinates.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::{ColorRgba, PackedColor};
pub use rect::{Rect, UvRect};
pub use vec2::Vec2;
pub use viewport::Viewport;
