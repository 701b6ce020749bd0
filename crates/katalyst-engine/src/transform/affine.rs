use crate::coords::Vec2;

/// Column-major 2x3 affine matrix `[a, b, c, d, e, f]`:
///
/// ```text
/// x' = a*x + c*y + e
/// y' = b*x + d*y + f
/// ```
///
/// Elementary operations right-multiply, so `m.translate(..).rotate(..)` rotates
/// inside the translated frame. No renormalization is performed; repeated
/// composition accumulates ordinary `f32` rounding.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2::from_array([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    #[inline]
    pub const fn from_array([a, b, c, d, e, f]: [f32; 6]) -> Self {
        Self { a, b, c, d, e, f }
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Resets to the identity matrix.
    #[inline]
    pub fn set_identity(&mut self) {
        *self = Self::IDENTITY;
    }

    /// Moves the origin by `(x, y)` in the current local frame.
    #[inline]
    pub fn translate(&mut self, x: f32, y: f32) -> &mut Self {
        self.e += self.a * x + self.c * y;
        self.f += self.b * x + self.d * y;
        self
    }

    /// Scales the local X and Y axes.
    #[inline]
    pub fn scale(&mut self, x: f32, y: f32) -> &mut Self {
        self.a *= x;
        self.b *= x;
        self.c *= y;
        self.d *= y;
        self
    }

    /// Rotates the local frame by `radians` (positive is clockwise on a +Y-down surface).
    #[inline]
    pub fn rotate(&mut self, radians: f32) -> &mut Self {
        let (sr, cr) = radians.sin_cos();
        let Affine2 { a, b, c, d, .. } = *self;

        self.a = a * cr + c * sr;
        self.b = b * cr + d * sr;
        self.c = c * cr - a * sr;
        self.d = d * cr - b * sr;
        self
    }

    /// Returns `self * rhs`: `rhs` is applied first, then `self`.
    pub fn then(self, rhs: Affine2) -> Affine2 {
        Affine2 {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
