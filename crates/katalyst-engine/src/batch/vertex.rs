use bytemuck::{Pod, Zeroable};

/// Size in bytes of one packed vertex.
pub const VERTEX_SIZE: usize = 20;

/// One interleaved sprite vertex: pixel position, texture coordinate, packed color.
///
/// The color is stored as raw bytes `[r, g, b, a]` and read by the device as
/// normalized `u8x4`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: u32,
}

const _: () = assert!(size_of::<Vertex>() == VERTEX_SIZE);

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2, // uv
        2 => Unorm8x4   // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: VERTEX_SIZE as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}
