//! 2D affine transforms and the scoped transform state used while drawing.
//!
//! Model:
//! - one *current* matrix, mutated in place by `translate` / `scale` / `rotate`
//! - each mutation composes in the local frame established by earlier calls
//! - `push` / `pop` save and restore the current matrix on a fixed-depth stack

mod affine;
mod stack;

pub use affine::Affine2;
pub use stack::{Transform2D, TransformStack, MAX_STACK_DEPTH};
