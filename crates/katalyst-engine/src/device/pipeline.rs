//! Sprite shader, bind group layouts and render pipeline for `WgpuDevice`.

use bytemuck::{Pod, Zeroable};

use crate::batch::Vertex;
use crate::transform::Affine2;

use super::{BlendFactor, BlendMode, DeviceError};

// ── globals uniform ───────────────────────────────────────────────────────

/// Projection as two vec4 rows: `(a, b, c, d)` and `(e, f, 0, 0)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct GlobalsUniform {
    pub linear: [f32; 4],
    pub offset: [f32; 4],
}

impl GlobalsUniform {
    pub(super) fn from_projection(m: &Affine2) -> Self {
        Self {
            linear: [m.a, m.b, m.c, m.d],
            offset: [m.e, m.f, 0.0, 0.0],
        }
    }
}

// ── blend ─────────────────────────────────────────────────────────────────

fn map_factor(f: BlendFactor) -> wgpu::BlendFactor {
    match f {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        BlendFactor::SrcColor => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
    }
}

/// Same factors for color and alpha, additive operation.
pub(super) fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: map_factor(mode.src),
        dst_factor: map_factor(mode.dst),
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

// ── pipeline ──────────────────────────────────────────────────────────────

pub(super) struct SpritePipeline {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    pub globals_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub pipeline: wgpu::RenderPipeline,
    format: wgpu::TextureFormat,
    blend: BlendMode,
}

impl SpritePipeline {
    /// Compiles the sprite shader and builds the pipeline for `blend`.
    ///
    /// Shader compilation messages are checked eagerly so a broken shader is
    /// reported here instead of at the first draw.
    pub(super) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        blend: BlendMode,
    ) -> Result<Self, DeviceError> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("katalyst sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });
        check_compilation(&shader)?;

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("katalyst globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        size_of::<GlobalsUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("katalyst texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("katalyst sprite pipeline layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = build_pipeline(device, &shader, &layout, format, blend);

        Ok(Self {
            shader,
            layout,
            globals_layout,
            texture_layout,
            pipeline,
            format,
            blend,
        })
    }

    /// Rebuilds the pipeline with a new blend state. Layouts are kept, so
    /// existing bind groups stay valid.
    ///
    /// Returns `false` without rebuilding if `blend` is already in effect.
    pub(super) fn set_blend(&mut self, device: &wgpu::Device, blend: BlendMode) -> bool {
        if !needs_rebuild(self.blend, blend) {
            return false;
        }
        self.pipeline = build_pipeline(device, &self.shader, &self.layout, self.format, blend);
        self.blend = blend;
        true
    }
}

#[inline]
fn needs_rebuild(current: BlendMode, requested: BlendMode) -> bool {
    current != requested
}

fn check_compilation(shader: &wgpu::ShaderModule) -> Result<(), DeviceError> {
    let info = pollster::block_on(shader.get_compilation_info());
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
        .map(|m| match &m.location {
            Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
            None => m.message.clone(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DeviceError::ShaderCompilation(errors.join("\n")))
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    log::debug!("building sprite pipeline: format={format:?} blend={blend:?}");

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("katalyst sprite pipeline"),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend_state(blend)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        // Quads are emitted with mixed winding; no culling.
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
