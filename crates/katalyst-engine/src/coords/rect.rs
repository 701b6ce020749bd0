use super::Vec2;

/// Axis-aligned rectangle in pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    /// Corners in quad vertex order: top-left, bottom-right, bottom-left, top-right.
    ///
    /// Paired with the `[0, 1, 2, 0, 3, 1]` index pattern this yields the
    /// triangles (TL, BR, BL) and (TL, TR, BR).
    #[inline]
    pub fn corners(self) -> [Vec2; 4] {
        let min = self.min();
        let max = self.max();
        [
            min,
            max,
            Vec2::new(min.x, max.y),
            Vec2::new(max.x, min.y),
        ]
    }
}

/// Texture sub-region in normalized UV space.
///
/// Use [`UvRect::FULL`] when drawing a whole texture rather than a tile of it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect::new(0.0, 0.0, 1.0, 1.0);

    #[inline]
    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self { u0, v0, u1, v1 }
    }

    /// Selects tile `(col, row)` of a uniform `cols` x `rows` grid (sprite sheets).
    pub fn tile(col: u32, row: u32, cols: u32, rows: u32) -> Self {
        debug_assert!(cols > 0 && rows > 0, "UvRect::tile: grid must be non-empty");
        let w = 1.0 / cols as f32;
        let h = 1.0 / rows as f32;
        let u0 = col as f32 * w;
        let v0 = row as f32 * h;
        Self::new(u0, v0, u0 + w, v0 + h)
    }

    /// Returns a copy mirrored horizontally.
    #[inline]
    pub fn flipped_x(self) -> Self {
        Self::new(self.u1, self.v0, self.u0, self.v1)
    }

    /// Returns a copy mirrored vertically.
    #[inline]
    pub fn flipped_y(self) -> Self {
        Self::new(self.u0, self.v1, self.u1, self.v0)
    }

    /// UVs in the same vertex order as [`Rect::corners`].
    #[inline]
    pub fn corners(self) -> [Vec2; 4] {
        [
            Vec2::new(self.u0, self.v0),
            Vec2::new(self.u1, self.v1),
            Vec2::new(self.u0, self.v1),
            Vec2::new(self.u1, self.v0),
        ]
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}
