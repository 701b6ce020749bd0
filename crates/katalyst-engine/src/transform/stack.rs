use super::Affine2;

/// Maximum number of saved states. Matches a 100-float backing store of
/// six-float matrices.
pub const MAX_STACK_DEPTH: usize = 16;

/// Fixed-capacity stack of saved matrices.
///
/// Storage is a plain array plus a length; nothing is allocated after construction.
#[derive(Debug, Clone)]
pub struct TransformStack {
    slots: [Affine2; MAX_STACK_DEPTH],
    len: usize,
}

impl TransformStack {
    pub const fn new() -> Self {
        Self {
            slots: [Affine2::IDENTITY; MAX_STACK_DEPTH],
            len: 0,
        }
    }

    /// Saves `m` on top of the stack.
    ///
    /// # Panics
    /// Panics if the stack already holds [`MAX_STACK_DEPTH`] states.
    #[inline]
    pub fn push(&mut self, m: Affine2) {
        assert!(
            self.len < MAX_STACK_DEPTH,
            "TransformStack::push: overflow (depth limit {MAX_STACK_DEPTH})"
        );
        self.slots[self.len] = m;
        self.len += 1;
    }

    /// Removes and returns the most recently saved state.
    ///
    /// # Panics
    /// Panics if called without a matching `push`.
    #[inline]
    pub fn pop(&mut self) -> Affine2 {
        assert!(self.len > 0, "TransformStack::pop: underflow (pop without matching push)");
        self.len -= 1;
        self.slots[self.len]
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Current transform plus its save/restore stack.
///
/// Mutations never touch render state; pushing and popping only affect which
/// matrix subsequent quads are transformed by.
#[derive(Debug, Clone, Default)]
pub struct Transform2D {
    current: Affine2,
    stack: TransformStack,
}

impl Transform2D {
    pub const fn new() -> Self {
        Self {
            current: Affine2::IDENTITY,
            stack: TransformStack::new(),
        }
    }

    /// The matrix applied to quad corners right now.
    #[inline]
    pub fn current(&self) -> &Affine2 {
        &self.current
    }

    /// Resets the current matrix to identity. Saved states are kept.
    #[inline]
    pub fn identity(&mut self) {
        self.current.set_identity();
    }

    /// Resets the current matrix and discards all saved states.
    #[inline]
    pub fn reset(&mut self) {
        self.current.set_identity();
        self.stack.clear();
    }

    #[inline]
    pub fn translate(&mut self, x: f32, y: f32) {
        self.current.translate(x, y);
    }

    #[inline]
    pub fn scale(&mut self, x: f32, y: f32) {
        self.current.scale(x, y);
    }

    #[inline]
    pub fn rotate(&mut self, radians: f32) {
        self.current.rotate(radians);
    }

    /// Saves the current matrix.
    ///
    /// # Panics
    /// Panics on overflow, see [`TransformStack::push`].
    #[inline]
    pub fn push(&mut self) {
        self.stack.push(self.current);
    }

    /// Restores the matrix saved by the matching `push`.
    ///
    /// # Panics
    /// Panics on underflow, see [`TransformStack::pop`].
    #[inline]
    pub fn pop(&mut self) {
        self.current = self.stack.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }
}
