use wgpu::util::DeviceExt;

use crate::coords::ColorRgba;
use crate::transform::Affine2;

use super::pipeline::{GlobalsUniform, SpritePipeline};
use super::{
    BlendFactor, BlendMode, BufferHandle, BufferKind, BufferUsage, DeviceError, GraphicsDevice,
    Index, PrimitiveKind, TextureHandle, COPY_ALIGNMENT,
};

struct GpuBuffer {
    buffer: wgpu::Buffer,
    kind: BufferKind,
    size: u64,
}

struct GpuTexture {
    bind_group: wgpu::BindGroup,
    // Kept alive for the bind group's view.
    _texture: wgpu::Texture,
}

/// Commands recorded between `begin_frame` and `end_frame`.
struct FrameRecording {
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// `GraphicsDevice` backed by wgpu.
///
/// Every call that touches the render target is recorded into one command
/// encoder per frame, in call order. Buffer uploads made while a frame is open
/// are encoded as staging copies so each draw sees exactly the data uploaded
/// before it; uploads outside a frame go straight to the queue.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline: SpritePipeline,
    globals_ubo: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,

    buffers: Vec<GpuBuffer>,
    textures: Vec<GpuTexture>,

    bound_vertex: Option<BufferHandle>,
    bound_index: Option<BufferHandle>,
    bound_texture: Option<TextureHandle>,

    frame: Option<FrameRecording>,
}

impl WgpuDevice {
    /// Builds the sprite pipeline for `format`.
    ///
    /// Fails with `DeviceError::ShaderCompilation` if the sprite shader does not compile.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        blend: BlendMode,
    ) -> Result<Self, DeviceError> {
        let pipeline = SpritePipeline::new(device, format, blend)?;

        let globals_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("katalyst globals ubo"),
            contents: bytemuck::bytes_of(&GlobalsUniform::from_projection(&Affine2::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("katalyst globals bind group"),
            layout: &pipeline.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_ubo.as_entire_binding(),
            }],
        });

        // Pixel-art friendly: nearest filtering, clamped edges.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("katalyst sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        log::debug!("wgpu sprite device ready (format={format:?})");

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            pipeline,
            globals_ubo,
            globals_bind_group,
            sampler,
            buffers: Vec::new(),
            textures: Vec::new(),
            bound_vertex: None,
            bound_index: None,
            bound_texture: None,
            frame: None,
        })
    }

    /// Uploads tightly packed RGBA8 pixels as a new sampled texture.
    pub fn create_texture_rgba(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, DeviceError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(DeviceError::InvalidTexture {
                width,
                height,
                expected,
                got: rgba.len(),
            });
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("katalyst sprite texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("katalyst texture bind group"),
            layout: &self.pipeline.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let handle = TextureHandle::from_raw(self.textures.len() as u32);
        self.textures.push(GpuTexture {
            bind_group,
            _texture: texture,
        });
        log::debug!("created texture {handle:?} ({width}x{height})");
        Ok(handle)
    }

    /// Starts recording commands that target `view`.
    ///
    /// An unfinished previous frame is discarded.
    pub fn begin_frame(&mut self, view: wgpu::TextureView) {
        if self.frame.is_some() {
            log::warn!("begin_frame called with a frame still open; discarding it");
        }
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("katalyst frame encoder"),
            });
        self.frame = Some(FrameRecording { view, encoder });
    }

    /// Finishes the open frame. Returns `None` if no frame was open.
    pub fn end_frame(&mut self) -> Option<wgpu::CommandBuffer> {
        self.frame.take().map(|f| f.encoder.finish())
    }

    pub fn in_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Writes `data` at `offset` in call order relative to recorded passes.
    fn write_ordered(&mut self, target: &wgpu::Buffer, offset: u64, data: &[u8]) {
        match self.frame.as_mut() {
            Some(frame) => {
                let staging = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("katalyst upload staging"),
                    contents: data,
                    usage: wgpu::BufferUsages::COPY_SRC,
                });
                frame.encoder.copy_buffer_to_buffer(
                    &staging,
                    0,
                    target,
                    offset,
                    data.len() as u64,
                );
            }
            None => self.queue.write_buffer(target, offset, data),
        }
    }

    fn buffer(&self, handle: BufferHandle) -> Result<&GpuBuffer, DeviceError> {
        self.buffers
            .get(handle.raw() as usize)
            .ok_or(DeviceError::UnknownBuffer(handle))
    }
}

fn check_aligned(what: &'static str, value: u64) -> Result<(), DeviceError> {
    if value % COPY_ALIGNMENT != 0 {
        return Err(DeviceError::Misaligned { what, value, align: COPY_ALIGNMENT });
    }
    Ok(())
}

impl GraphicsDevice for WgpuDevice {
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size_bytes: u64,
        usage: BufferUsage,
    ) -> Result<BufferHandle, DeviceError> {
        check_aligned("buffer size", size_bytes)?;

        let bind_usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        let label = match (kind, usage) {
            (BufferKind::Vertex, BufferUsage::Dynamic) => "katalyst dynamic vbo",
            (BufferKind::Vertex, BufferUsage::Static) => "katalyst static vbo",
            (BufferKind::Index, BufferUsage::Dynamic) => "katalyst dynamic ibo",
            (BufferKind::Index, BufferUsage::Static) => "katalyst static ibo",
        };

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size_bytes,
            usage: bind_usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let handle = BufferHandle::from_raw(self.buffers.len() as u32);
        self.buffers.push(GpuBuffer {
            buffer,
            kind,
            size: size_bytes,
        });
        match kind {
            BufferKind::Vertex => self.bound_vertex = Some(handle),
            BufferKind::Index => self.bound_index = Some(handle),
        }
        Ok(handle)
    }

    fn bind_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError> {
        match self.buffer(buffer)?.kind {
            BufferKind::Vertex => self.bound_vertex = Some(buffer),
            BufferKind::Index => self.bound_index = Some(buffer),
        }
        Ok(())
    }

    fn upload_sub_range(
        &mut self,
        buffer: BufferHandle,
        offset_bytes: u64,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        check_aligned("upload offset", offset_bytes)?;
        check_aligned("upload size", data.len() as u64)?;

        let target = self.buffer(buffer)?;
        let len = data.len() as u64;
        if offset_bytes.checked_add(len).is_none_or(|end| end > target.size) {
            return Err(DeviceError::OutOfBounds {
                buffer,
                offset: offset_bytes,
                len,
                size: target.size,
            });
        }
        if data.is_empty() {
            return Ok(());
        }

        let target = target.buffer.clone();
        self.write_ordered(&target, offset_bytes, data);
        Ok(())
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), DeviceError> {
        if texture.raw() as usize >= self.textures.len() {
            return Err(DeviceError::UnknownTexture(texture));
        }
        self.bound_texture = Some(texture);
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveKind,
        index_count: u32,
        index_offset: u32,
    ) -> Result<(), DeviceError> {
        let PrimitiveKind::Triangles = primitive;

        let vb = self
            .bound_vertex
            .ok_or(DeviceError::NoBufferBound(BufferKind::Vertex))?;
        let ib = self
            .bound_index
            .ok_or(DeviceError::NoBufferBound(BufferKind::Index))?;
        let tex = self.bound_texture.ok_or(DeviceError::NoTextureBound)?;

        // Field-level borrows: the frame encoder is borrowed mutably below.
        let vb = &self
            .buffers
            .get(vb.raw() as usize)
            .ok_or(DeviceError::UnknownBuffer(vb))?
            .buffer;
        let ib_entry = self
            .buffers
            .get(ib.raw() as usize)
            .ok_or(DeviceError::UnknownBuffer(ib))?;
        let available = ib_entry.size / size_of::<Index>() as u64;
        if index_offset as u64 + index_count as u64 > available {
            return Err(DeviceError::IndexRange {
                offset: index_offset,
                count: index_count,
                available,
            });
        }
        let ib = &ib_entry.buffer;
        let texture_bind_group = &self
            .textures
            .get(tex.raw() as usize)
            .ok_or(DeviceError::UnknownTexture(tex))?
            .bind_group;

        let frame = self.frame.as_mut().ok_or(DeviceError::NoActiveFrame)?;

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("katalyst sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline.pipeline);
        rpass.set_bind_group(0, &self.globals_bind_group, &[]);
        rpass.set_bind_group(1, texture_bind_group, &[]);
        rpass.set_vertex_buffer(0, vb.slice(..));
        rpass.set_index_buffer(ib.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(index_offset..index_offset + index_count, 0, 0..1);
        Ok(())
    }

    fn clear(&mut self, color: ColorRgba) -> Result<(), DeviceError> {
        let frame = self.frame.as_mut().ok_or(DeviceError::NoActiveFrame)?;

        let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("katalyst clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: color.r as f64,
                        g: color.g as f64,
                        b: color.b as f64,
                        a: color.a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(())
    }

    fn set_blend_mode(&mut self, src: BlendFactor, dst: BlendFactor) -> Result<(), DeviceError> {
        if !self.pipeline.set_blend(&self.device, BlendMode::new(src, dst)) {
            log::trace!("blend mode unchanged; pipeline kept");
        }
        Ok(())
    }

    fn set_projection(&mut self, projection: &Affine2) -> Result<(), DeviceError> {
        let uniform = GlobalsUniform::from_projection(projection);
        let ubo = self.globals_ubo.clone();
        self.write_ordered(&ubo, 0, bytemuck::bytes_of(&uniform));
        Ok(())
    }
}
