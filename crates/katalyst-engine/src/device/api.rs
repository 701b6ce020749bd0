use crate::coords::ColorRgba;
use crate::transform::Affine2;

use super::DeviceError;

/// Element type of every index buffer.
pub type Index = u16;

/// Buffer sizes and upload offsets/lengths must be multiples of this.
pub const COPY_ALIGNMENT: u64 = 4;

/// Opaque reference to a device-owned buffer object.
///
/// Only devices mint handles; the batching core stores and passes them back.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferHandle(u32);

impl BufferHandle {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Opaque reference to a device-owned texture.
///
/// Texture lifetime is managed entirely by the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

impl TextureHandle {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Bind point of a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Update frequency hint for a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times (the quad index buffer).
    Static,
    /// Rewritten every batch (the vertex buffer).
    Dynamic,
}

/// Primitive assembly for indexed draws. Quads are always two triangles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Triangles,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcColor,
    OneMinusSrcColor,
}

/// Source/destination blend factors, configured once when a canvas is created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlendMode {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendMode {
    /// Straight-alpha compositing.
    pub const ALPHA: BlendMode = BlendMode::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
    /// Alpha-weighted additive blending (glows, particles).
    pub const ADDITIVE: BlendMode = BlendMode::new(BlendFactor::SrcAlpha, BlendFactor::One);
    /// Premultiplied-alpha compositing.
    pub const PREMULTIPLIED: BlendMode = BlendMode::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);

    #[inline]
    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::ALPHA
    }
}

/// Capability interface the batching core requires from a graphics backend.
///
/// Calls are synchronous and issued from a single thread in the order they must
/// take effect; a backend must make each draw observe exactly the uploads and
/// binds issued before it.
pub trait GraphicsDevice {
    /// Creates a buffer of `size_bytes` and binds it to the `kind` bind point.
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size_bytes: u64,
        usage: BufferUsage,
    ) -> Result<BufferHandle, DeviceError>;

    /// Binds `buffer` to the bind point of the kind it was created with.
    ///
    /// Draws read from whichever vertex and index buffers were bound last, so
    /// a caller sharing the device with other batchers must bind its own
    /// buffers before drawing.
    fn bind_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError>;

    /// Writes `data` into `buffer` starting at `offset_bytes`.
    fn upload_sub_range(
        &mut self,
        buffer: BufferHandle,
        offset_bytes: u64,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Makes `texture` the sampled texture for subsequent draws.
    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), DeviceError>;

    /// Draws `index_count` indices from the bound index buffer starting at `index_offset`.
    fn draw_indexed(
        &mut self,
        primitive: PrimitiveKind,
        index_count: u32,
        index_offset: u32,
    ) -> Result<(), DeviceError>;

    /// Clears the whole target to `color`.
    fn clear(&mut self, color: ColorRgba) -> Result<(), DeviceError>;

    fn set_blend_mode(&mut self, src: BlendFactor, dst: BlendFactor) -> Result<(), DeviceError>;

    /// Sets the pixel → device-space matrix applied to every vertex position.
    fn set_projection(&mut self, projection: &Affine2) -> Result<(), DeviceError>;
}

impl<D: GraphicsDevice + ?Sized> GraphicsDevice for &mut D {
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size_bytes: u64,
        usage: BufferUsage,
    ) -> Result<BufferHandle, DeviceError> {
        (**self).create_buffer(kind, size_bytes, usage)
    }

    fn bind_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError> {
        (**self).bind_buffer(buffer)
    }

    fn upload_sub_range(
        &mut self,
        buffer: BufferHandle,
        offset_bytes: u64,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        (**self).upload_sub_range(buffer, offset_bytes, data)
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), DeviceError> {
        (**self).bind_texture(texture)
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveKind,
        index_count: u32,
        index_offset: u32,
    ) -> Result<(), DeviceError> {
        (**self).draw_indexed(primitive, index_count, index_offset)
    }

    fn clear(&mut self, color: ColorRgba) -> Result<(), DeviceError> {
        (**self).clear(color)
    }

    fn set_blend_mode(&mut self, src: BlendFactor, dst: BlendFactor) -> Result<(), DeviceError> {
        (**self).set_blend_mode(src, dst)
    }

    fn set_projection(&mut self, projection: &Affine2) -> Result<(), DeviceError> {
        (**self).set_projection(projection)
    }
}
