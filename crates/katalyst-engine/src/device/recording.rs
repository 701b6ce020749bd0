//! Headless device that validates and records every call.
//!
//! Buffers are mirrored in CPU memory so callers can inspect exactly what a
//! real device would have received. Validation follows the strictest backend
//! rules (4-byte copy alignment, bounds, bound index buffer and texture on draw).

use crate::coords::ColorRgba;
use crate::transform::Affine2;

use super::{
    BlendFactor, BlendMode, BufferHandle, BufferKind, BufferUsage, DeviceError, GraphicsDevice,
    Index, PrimitiveKind, TextureHandle, COPY_ALIGNMENT,
};

/// One recorded device call, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateBuffer {
        buffer: BufferHandle,
        kind: BufferKind,
        size_bytes: u64,
        usage: BufferUsage,
    },
    BindBuffer {
        buffer: BufferHandle,
        kind: BufferKind,
    },
    UploadSubRange {
        buffer: BufferHandle,
        offset_bytes: u64,
        len: u64,
    },
    BindTexture(TextureHandle),
    DrawIndexed {
        primitive: PrimitiveKind,
        index_count: u32,
        index_offset: u32,
        /// Texture bound when the draw was issued.
        texture: TextureHandle,
    },
    Clear(ColorRgba),
    SetBlendMode {
        src: BlendFactor,
        dst: BlendFactor,
    },
    SetProjection(Affine2),
}

#[derive(Debug)]
struct RecordedBuffer {
    kind: BufferKind,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    buffers: Vec<RecordedBuffer>,
    textures: Vec<(u32, u32)>,

    bound_vertex: Option<BufferHandle>,
    bound_index: Option<BufferHandle>,
    bound_texture: Option<TextureHandle>,
    blend: Option<BlendMode>,
    projection: Option<Affine2>,

    calls: Vec<DeviceCall>,
    pending_failure: Option<DeviceError>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a texture handle. Only the size is tracked.
    pub fn create_texture(&mut self, width: u32, height: u32) -> TextureHandle {
        let handle = TextureHandle::from_raw(self.textures.len() as u32);
        self.textures.push((width, height));
        handle
    }

    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture.raw() as usize).copied()
    }

    /// Makes the next device call fail with `err` (the call is not recorded).
    ///
    /// Any variant may be injected; the batching core never inspects it.
    pub fn fail_next(&mut self, err: DeviceError) {
        self.pending_failure = Some(err);
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Returns and forgets the recorded calls. Device state is kept.
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    /// Recorded draws as `(index_count, index_offset, texture)`.
    pub fn draws(&self) -> Vec<(u32, u32, TextureHandle)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                DeviceCall::DrawIndexed { index_count, index_offset, texture, .. } => {
                    Some((index_count, index_offset, texture))
                }
                _ => None,
            })
            .collect()
    }

    /// Recorded texture binds, in order.
    pub fn binds(&self) -> Vec<TextureHandle> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                DeviceCall::BindTexture(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    /// CPU mirror of a buffer's contents.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer.raw() as usize).map(|b| b.data.as_slice())
    }

    pub fn bound_buffer(&self, kind: BufferKind) -> Option<BufferHandle> {
        match kind {
            BufferKind::Vertex => self.bound_vertex,
            BufferKind::Index => self.bound_index,
        }
    }

    pub fn bound_texture(&self) -> Option<TextureHandle> {
        self.bound_texture
    }

    pub fn blend_mode(&self) -> Option<BlendMode> {
        self.blend
    }

    pub fn projection(&self) -> Option<Affine2> {
        self.projection
    }

    fn check_failure(&mut self) -> Result<(), DeviceError> {
        match self.pending_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn buffer_mut(&mut self, buffer: BufferHandle) -> Result<&mut RecordedBuffer, DeviceError> {
        self.buffers
            .get_mut(buffer.raw() as usize)
            .ok_or(DeviceError::UnknownBuffer(buffer))
    }
}

fn check_aligned(what: &'static str, value: u64) -> Result<(), DeviceError> {
    if value % COPY_ALIGNMENT != 0 {
        return Err(DeviceError::Misaligned { what, value, align: COPY_ALIGNMENT });
    }
    Ok(())
}

impl GraphicsDevice for RecordingDevice {
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size_bytes: u64,
        usage: BufferUsage,
    ) -> Result<BufferHandle, DeviceError> {
        self.check_failure()?;
        check_aligned("buffer size", size_bytes)?;

        let buffer = BufferHandle::from_raw(self.buffers.len() as u32);
        self.buffers.push(RecordedBuffer {
            kind,
            data: vec![0; size_bytes as usize],
        });
        match kind {
            BufferKind::Vertex => self.bound_vertex = Some(buffer),
            BufferKind::Index => self.bound_index = Some(buffer),
        }

        self.calls.push(DeviceCall::CreateBuffer { buffer, kind, size_bytes, usage });
        Ok(buffer)
    }

    fn bind_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError> {
        self.check_failure()?;
        let kind = self.buffer_mut(buffer)?.kind;
        match kind {
            BufferKind::Vertex => self.bound_vertex = Some(buffer),
            BufferKind::Index => self.bound_index = Some(buffer),
        }
        self.calls.push(DeviceCall::BindBuffer { buffer, kind });
        Ok(())
    }

    fn upload_sub_range(
        &mut self,
        buffer: BufferHandle,
        offset_bytes: u64,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        self.check_failure()?;
        check_aligned("upload offset", offset_bytes)?;
        check_aligned("upload size", data.len() as u64)?;

        let target = self.buffer_mut(buffer)?;
        let size = target.data.len() as u64;
        let len = data.len() as u64;
        if offset_bytes.checked_add(len).is_none_or(|end| end > size) {
            return Err(DeviceError::OutOfBounds { buffer, offset: offset_bytes, len, size });
        }

        let start = offset_bytes as usize;
        target.data[start..start + data.len()].copy_from_slice(data);

        self.calls.push(DeviceCall::UploadSubRange { buffer, offset_bytes, len });
        Ok(())
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), DeviceError> {
        self.check_failure()?;
        if self.texture_size(texture).is_none() {
            return Err(DeviceError::UnknownTexture(texture));
        }
        self.bound_texture = Some(texture);
        self.calls.push(DeviceCall::BindTexture(texture));
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveKind,
        index_count: u32,
        index_offset: u32,
    ) -> Result<(), DeviceError> {
        self.check_failure()?;
        self.bound_vertex.ok_or(DeviceError::NoBufferBound(BufferKind::Vertex))?;
        let index_buffer = self
            .bound_index
            .ok_or(DeviceError::NoBufferBound(BufferKind::Index))?;
        let texture = self.bound_texture.ok_or(DeviceError::NoTextureBound)?;

        let ib = self.buffer_mut(index_buffer)?;
        debug_assert_eq!(ib.kind, BufferKind::Index);
        let available = ib.data.len() as u64 / size_of::<Index>() as u64;
        if index_offset as u64 + index_count as u64 > available {
            return Err(DeviceError::IndexRange {
                offset: index_offset,
                count: index_count,
                available,
            });
        }

        self.calls.push(DeviceCall::DrawIndexed {
            primitive,
            index_count,
            index_offset,
            texture,
        });
        Ok(())
    }

    fn clear(&mut self, color: ColorRgba) -> Result<(), DeviceError> {
        self.check_failure()?;
        self.calls.push(DeviceCall::Clear(color));
        Ok(())
    }

    fn set_blend_mode(&mut self, src: BlendFactor, dst: BlendFactor) -> Result<(), DeviceError> {
        self.check_failure()?;
        self.blend = Some(BlendMode::new(src, dst));
        self.calls.push(DeviceCall::SetBlendMode { src, dst });
        Ok(())
    }

    fn set_projection(&mut self, projection: &Affine2) -> Result<(), DeviceError> {
        self.check_failure()?;
        self.projection = Some(*projection);
        self.calls.push(DeviceCall::SetProjection(*projection));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_buffer_binds_its_kind() {
        let mut dev = RecordingDevice::new();
        let vb = dev.create_buffer(BufferKind::Vertex, 64, BufferUsage::Dynamic).unwrap();
        let ib = dev.create_buffer(BufferKind::Index, 12, BufferUsage::Static).unwrap();
        assert_eq!(dev.bound_buffer(BufferKind::Vertex), Some(vb));
        assert_eq!(dev.bound_buffer(BufferKind::Index), Some(ib));
        assert_eq!(dev.buffer_data(vb).map(<[u8]>::len), Some(64));
    }

    #[test]
    fn bind_buffer_restores_an_earlier_buffer() {
        let mut dev = RecordingDevice::new();
        let first = dev.create_buffer(BufferKind::Index, 12, BufferUsage::Static).unwrap();
        let second = dev.create_buffer(BufferKind::Index, 24, BufferUsage::Static).unwrap();
        let vb = dev.create_buffer(BufferKind::Vertex, 80, BufferUsage::Dynamic).unwrap();
        assert_eq!(dev.bound_buffer(BufferKind::Index), Some(second));

        dev.bind_buffer(first).unwrap();
        assert_eq!(dev.bound_buffer(BufferKind::Index), Some(first));
        assert_eq!(dev.bound_buffer(BufferKind::Vertex), Some(vb));
        assert_eq!(
            dev.calls().last(),
            Some(&DeviceCall::BindBuffer { buffer: first, kind: BufferKind::Index })
        );
    }

    #[test]
    fn bind_unknown_buffer_is_rejected() {
        let mut dev = RecordingDevice::new();
        let bogus = BufferHandle::from_raw(3);
        assert_eq!(dev.bind_buffer(bogus), Err(DeviceError::UnknownBuffer(bogus)));
        assert!(dev.calls().is_empty());
    }

    #[test]
    fn upload_writes_sub_range_only() {
        let mut dev = RecordingDevice::new();
        let vb = dev.create_buffer(BufferKind::Vertex, 16, BufferUsage::Dynamic).unwrap();
        dev.upload_sub_range(vb, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(dev.buffer_data(vb).unwrap(), &[0, 0, 0, 0, 1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn upload_past_end_is_rejected() {
        let mut dev = RecordingDevice::new();
        let vb = dev.create_buffer(BufferKind::Vertex, 8, BufferUsage::Dynamic).unwrap();
        let err = dev.upload_sub_range(vb, 4, &[0; 8]).unwrap_err();
        assert!(matches!(err, DeviceError::OutOfBounds { size: 8, .. }));
    }

    #[test]
    fn misaligned_upload_is_rejected() {
        let mut dev = RecordingDevice::new();
        let vb = dev.create_buffer(BufferKind::Vertex, 8, BufferUsage::Dynamic).unwrap();
        let err = dev.upload_sub_range(vb, 2, &[0; 4]).unwrap_err();
        assert!(matches!(err, DeviceError::Misaligned { what: "upload offset", .. }));
    }

    #[test]
    fn unknown_texture_fails_fast() {
        let mut dev = RecordingDevice::new();
        let err = dev.bind_texture(TextureHandle::from_raw(7)).unwrap_err();
        assert_eq!(err, DeviceError::UnknownTexture(TextureHandle::from_raw(7)));
        assert!(dev.calls().is_empty());
    }

    #[test]
    fn draw_requires_bound_state() {
        let mut dev = RecordingDevice::new();
        assert_eq!(
            dev.draw_indexed(PrimitiveKind::Triangles, 6, 0),
            Err(DeviceError::NoBufferBound(BufferKind::Vertex))
        );

        dev.create_buffer(BufferKind::Vertex, 80, BufferUsage::Dynamic).unwrap();
        dev.create_buffer(BufferKind::Index, 12, BufferUsage::Static).unwrap();
        assert_eq!(
            dev.draw_indexed(PrimitiveKind::Triangles, 6, 0),
            Err(DeviceError::NoTextureBound)
        );

        let tex = dev.create_texture(1, 1);
        dev.bind_texture(tex).unwrap();
        dev.draw_indexed(PrimitiveKind::Triangles, 6, 0).unwrap();
        assert!(matches!(
            dev.draw_indexed(PrimitiveKind::Triangles, 12, 0),
            Err(DeviceError::IndexRange { available: 6, .. })
        ));
        assert_eq!(dev.draws(), vec![(6, 0, tex)]);
    }

    #[test]
    fn injected_failure_hits_next_call_once() {
        let mut dev = RecordingDevice::new();
        dev.fail_next(DeviceError::NoActiveFrame);
        assert!(dev.clear(ColorRgba::black()).is_err());
        assert!(dev.clear(ColorRgba::black()).is_ok());
        assert_eq!(dev.calls(), &[DeviceCall::Clear(ColorRgba::black())]);
    }
}
