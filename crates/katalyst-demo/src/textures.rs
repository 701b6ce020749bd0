//! Procedural RGBA8 textures, generated in memory.

/// Tightly packed RGBA8 image.
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Pixels {
    fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Self {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&f(x, y));
            }
        }
        Self { width, height, rgba }
    }
}

/// Two-tone checkerboard with `cell`-pixel squares.
pub fn checker(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Pixels {
    Pixels::from_fn(size, size, |x, y| if (x / cell + y / cell) % 2 == 0 { a } else { b })
}

/// White disc with a soft edge; tinted per sprite.
pub fn disc(size: u32) -> Pixels {
    let r = size as f32 / 2.0;
    Pixels::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        let d = (dx * dx + dy * dy).sqrt();
        let alpha = ((r - d).clamp(0.0, 1.0) * 255.0) as u8;
        [255, 255, 255, alpha]
    })
}

/// Horizontal strip of `frames` square frames, each a bar at a different angle.
/// Drawn with `UvRect::tile(frame, 0, frames, 1)`.
pub fn spinner_strip(frame_size: u32, frames: u32) -> Pixels {
    Pixels::from_fn(frame_size * frames, frame_size, |x, y| {
        let frame = x / frame_size;
        let angle = frame as f32 / frames as f32 * std::f32::consts::PI;
        let c = frame_size as f32 / 2.0;
        let (dx, dy) = ((x % frame_size) as f32 + 0.5 - c, y as f32 + 0.5 - c);
        // Distance from the bar's axis.
        let dist = (dx * angle.sin() - dy * angle.cos()).abs();
        if dist < frame_size as f32 / 8.0 && dx.hypot(dy) < c {
            [255, 255, 255, 255]
        } else {
            [0, 0, 0, 0]
        }
    })
}
