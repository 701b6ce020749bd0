/// Linear RGBA color, used for surface clears.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB components (the background setter of the canvas).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Quantizes to a per-vertex color. Channels are clamped to `[0, 1]`.
    #[inline]
    pub fn to_packed(self) -> PackedColor {
        fn q(c: f32) -> u8 {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        PackedColor::from_rgba8(q(self.r), q(self.g), q(self.b), q(self.a))
    }
}

/// Per-vertex color packed into 32 bits.
///
/// Byte order in memory is `[r, g, b, a]`, so the value read as a little-endian
/// `u32` is `0xAABBGGRR`. Devices read it as four normalized bytes.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub const WHITE: PackedColor = PackedColor(0xFFFF_FFFF);
    pub const TRANSPARENT: PackedColor = PackedColor(0);

    #[inline]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_le_bytes([r, g, b, a]))
    }

    #[inline]
    pub const fn from_u32(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn to_rgba8(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl Default for PackedColor {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_round_trips_through_memory_order() {
        let c = PackedColor::from_rgba8(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.to_u32(), 0x4433_2211);
        assert_eq!(c.to_rgba8(), [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn to_packed_clamps_out_of_range_channels() {
        let c = ColorRgba::new(2.0, -1.0, 0.5, 1.0).to_packed();
        assert_eq!(c.to_rgba8(), [255, 0, 128, 255]);
    }

    #[test]
    fn default_tint_is_opaque_white() {
        assert_eq!(PackedColor::default(), PackedColor(0xFFFF_FFFF));
    }
}
