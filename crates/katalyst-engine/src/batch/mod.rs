//! Sprite batching core.
//!
//! Quads are packed into a CPU-side vertex array and drawn through a single
//! precomputed index buffer. `BatchDispatcher` decides when accumulated quads
//! must reach the device:
//! - before binding a different texture
//! - when the vertex array is full
//! - when the caller flushes at frame end

mod dispatcher;
mod index;
mod packer;
mod vertex;

pub use dispatcher::{BatchConfig, BatchDispatcher, BatchStats, DEFAULT_MAX_BATCH};
pub use index::{QuadIndices, INDICES_PER_QUAD, MAX_QUADS_U16, VERTICES_PER_QUAD};
pub use packer::{Quad, VertexPacker};
pub use vertex::{Vertex, VERTEX_SIZE};
