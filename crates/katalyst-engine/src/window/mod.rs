//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and windows, and gives each window a GPU
//! surface and a sprite canvas.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
