pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

/// Largest quad count whose vertices are all addressable by `u16` indices.
pub const MAX_QUADS_U16: usize = (u16::MAX as usize + 1) / VERTICES_PER_QUAD;

/// Per-quad index pattern, relative to the quad's first vertex.
const PATTERN: [u16; INDICES_PER_QUAD] = [0, 1, 2, 0, 3, 1];

/// Immutable index list covering `quads` quads.
///
/// Quad `q` owns indices `[q*6, q*6 + 6)`, which are
/// `{4q, 4q+1, 4q+2, 4q, 4q+3, 4q+1}`. Any prefix of `n` quads is therefore a
/// valid draw range of `n * 6` indices starting at 0.
#[derive(Debug, Clone)]
pub struct QuadIndices {
    indices: Vec<u16>,
    quads: usize,
}

impl QuadIndices {
    /// # Panics
    /// If `quads` is 0 or larger than `MAX_QUADS_U16`.
    pub fn new(quads: usize) -> Self {
        assert!(quads > 0, "quad index buffer needs a capacity of at least one quad");
        assert!(
            quads <= MAX_QUADS_U16,
            "quad capacity {quads} would overflow u16 indices (max {MAX_QUADS_U16})"
        );

        let mut indices = Vec::with_capacity(quads * INDICES_PER_QUAD);
        for q in 0..quads {
            let base = (q * VERTICES_PER_QUAD) as u16;
            indices.extend(PATTERN.iter().map(|&i| base + i));
        }

        let out = Self { indices, quads };
        debug_assert!(out.validate(), "quad index pattern mismatch");
        out
    }

    /// Checks size and per-quad pattern.
    pub fn validate(&self) -> bool {
        self.indices.len() == self.quads * INDICES_PER_QUAD
            && self
                .indices
                .chunks_exact(INDICES_PER_QUAD)
                .enumerate()
                .all(|(q, chunk)| {
                    let b = (q * VERTICES_PER_QUAD) as u32;
                    chunk
                        .iter()
                        .zip(PATTERN)
                        .all(|(&got, p)| got as u32 == b + p as u32)
                })
    }

    pub fn quads(&self) -> usize {
        self.quads
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.indices
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
