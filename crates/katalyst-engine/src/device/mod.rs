//! Graphics device layer.
//!
//! - `GraphicsDevice`: the capability interface the batching core draws through
//! - `RecordingDevice`: headless backend that validates and logs every call
//! - `WgpuDevice`: wgpu backend recording into one command encoder per frame
//! - `Gpu`: instance/adapter/surface ownership and frame acquisition

mod api;
mod error;
mod frame;
mod gpu;
mod pipeline;
mod recording;
mod wgpu_device;

pub use api::{
    BlendFactor, BlendMode, BufferHandle, BufferKind, BufferUsage, GraphicsDevice, Index,
    PrimitiveKind, TextureHandle, COPY_ALIGNMENT,
};
pub use error::DeviceError;
pub use frame::{GpuFrame, SurfaceErrorAction};
pub use gpu::{Gpu, GpuInit};
pub use recording::{DeviceCall, RecordingDevice};
pub use wgpu_device::WgpuDevice;
