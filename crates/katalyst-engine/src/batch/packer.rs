use crate::coords::{PackedColor, Rect, UvRect, Vec2};
use crate::transform::Affine2;

use super::index::{QuadIndices, VERTICES_PER_QUAD};
use super::vertex::Vertex;

/// Untransformed quad geometry in vertex order (TL, BR, BL, TR).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    pub corners: [Vec2; 4],
    pub uvs: [Vec2; 4],
}

impl Quad {
    pub fn new(rect: Rect, uv: UvRect) -> Self {
        Self {
            corners: rect.corners(),
            uvs: uv.corners(),
        }
    }
}

/// CPU-side interleaved vertex storage for `capacity` quads, plus the index
/// list that addresses it.
///
/// Slots are overwritten in place; only the prefix the dispatcher has filled
/// since its last flush holds meaningful data.
#[derive(Debug, Clone)]
pub struct VertexPacker {
    vertices: Vec<Vertex>,
    indices: QuadIndices,
}

impl VertexPacker {
    /// # Panics
    /// If `capacity` is 0 or exceeds the `u16` index range.
    pub fn new(capacity: usize) -> Self {
        let indices = QuadIndices::new(capacity);
        Self {
            vertices: vec![Vertex::default(); capacity * VERTICES_PER_QUAD],
            indices,
        }
    }

    pub fn capacity(&self) -> usize {
        self.indices.quads()
    }

    /// Writes quad `slot`, transforming each corner by `transform`.
    /// UVs and color are stored unchanged.
    ///
    /// # Panics
    /// If `slot >= capacity()`.
    pub fn write_quad(&mut self, slot: usize, quad: &Quad, color: PackedColor, transform: &Affine2) {
        assert!(
            slot < self.capacity(),
            "vertex packer overflow: slot {slot} >= capacity {}",
            self.capacity()
        );

        let base = slot * VERTICES_PER_QUAD;
        let block = &mut self.vertices[base..base + VERTICES_PER_QUAD];
        for ((v, &corner), &uv) in block.iter_mut().zip(&quad.corners).zip(&quad.uvs) {
            *v = Vertex {
                pos: transform.transform_point(corner).to_array(),
                uv: uv.to_array(),
                color: color.to_u32(),
            };
        }
    }

    /// Vertices of the first `quads` slots.
    pub fn vertices(&self, quads: usize) -> &[Vertex] {
        &self.vertices[..quads * VERTICES_PER_QUAD]
    }

    /// Byte view of the first `quads` slots, ready for upload.
    pub fn vertex_bytes(&self, quads: usize) -> &[u8] {
        bytemuck::cast_slice(self.vertices(quads))
    }

    pub fn indices(&self) -> &QuadIndices {
        &self.indices
    }

    pub fn index_bytes(&self) -> &[u8] {
        self.indices.as_bytes()
    }

    /// Total size in bytes of the vertex storage.
    pub fn vertex_capacity_bytes(&self) -> usize {
        self.vertices.len() * size_of::<Vertex>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Quad {
        Quad::new(Rect::new(0.0, 0.0, 1.0, 1.0), UvRect::FULL)
    }

    #[test]
    fn identity_write_stores_corners_uvs_and_color() {
        let mut p = VertexPacker::new(2);
        let color = PackedColor::from_rgba8(1, 2, 3, 4);
        p.write_quad(1, &unit_quad(), color, &Affine2::IDENTITY);

        let v = p.vertices(2);
        assert_eq!(v[4].pos, [0.0, 0.0]);
        assert_eq!(v[5].pos, [1.0, 1.0]);
        assert_eq!(v[6].pos, [0.0, 1.0]);
        assert_eq!(v[7].pos, [1.0, 0.0]);
        assert_eq!(v[5].uv, [1.0, 1.0]);
        assert!(v[4..8].iter().all(|v| v.color == color.to_u32()));
        // Slot 0 untouched.
        assert_eq!(v[0], Vertex::default());
    }

    #[test]
    fn transform_applies_to_positions_only() {
        let mut p = VertexPacker::new(1);
        let mut m = Affine2::IDENTITY;
        m.translate(10.0, 20.0).scale(2.0, 2.0);
        p.write_quad(0, &unit_quad(), PackedColor::WHITE, &m);

        let v = p.vertices(1);
        assert_eq!(v[0].pos, [10.0, 20.0]);
        assert_eq!(v[1].pos, [12.0, 22.0]);
        assert_eq!(v[1].uv, [1.0, 1.0]);
    }

    #[test]
    fn vertex_bytes_cover_prefix_only() {
        let p = VertexPacker::new(8);
        assert_eq!(p.vertex_bytes(0).len(), 0);
        assert_eq!(p.vertex_bytes(3).len(), 3 * 4 * 20);
        assert_eq!(p.vertex_capacity_bytes(), 8 * 4 * 20);
        assert_eq!(p.index_bytes().len(), 8 * 6 * 2);
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn writing_past_capacity_panics() {
        let mut p = VertexPacker::new(2);
        p.write_quad(2, &unit_quad(), PackedColor::WHITE, &Affine2::IDENTITY);
    }
}
