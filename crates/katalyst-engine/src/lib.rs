//! Katalyst engine crate.
//!
//! An immediate-mode 2D sprite batcher (`transform`, `batch`, `render`) over a
//! small graphics device interface (`device`), plus the winit/wgpu runtime
//! used to put it on screen.

pub mod batch;
pub mod coords;
pub mod device;
pub mod render;
pub mod transform;

pub mod core;
pub mod time;
pub mod window;

pub mod logging;
