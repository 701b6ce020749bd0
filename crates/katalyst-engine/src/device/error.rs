use thiserror::Error;

use super::{BufferHandle, BufferKind, TextureHandle};

/// Failure reported by a graphics device.
///
/// The batching core never interprets these; they propagate to the caller
/// unchanged and are treated as fatal for the renderer instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("unknown buffer handle {0:?}")]
    UnknownBuffer(BufferHandle),

    #[error("unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),

    #[error("upload of {len} bytes at offset {offset} exceeds buffer {buffer:?} of {size} bytes")]
    OutOfBounds {
        buffer: BufferHandle,
        offset: u64,
        len: u64,
        size: u64,
    },

    #[error("{what} must be a multiple of {align} bytes (got {value})")]
    Misaligned {
        what: &'static str,
        value: u64,
        align: u64,
    },

    #[error("no {0:?} buffer is bound")]
    NoBufferBound(BufferKind),

    #[error("no texture is bound")]
    NoTextureBound,

    #[error("draw of {count} indices at offset {offset} exceeds the bound index buffer ({available} indices)")]
    IndexRange {
        offset: u32,
        count: u32,
        available: u64,
    },

    #[error("draw command issued outside of a frame")]
    NoActiveFrame,

    #[error("texture data is {got} bytes, expected {expected} for {width}x{height} RGBA8")]
    InvalidTexture {
        width: u32,
        height: u32,
        expected: usize,
        got: usize,
    },

    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
}
