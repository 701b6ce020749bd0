//! Bouncing, spinning sprites.

use katalyst_engine::coords::{PackedColor, Rect, UvRect};
use katalyst_engine::device::{DeviceError, GraphicsDevice, TextureHandle};
use katalyst_engine::render::Canvas;

/// Small deterministic generator; the demo needs variety, not quality.
pub struct XorShift(u32);

impl XorShift {
    pub fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform in `[lo, hi)`.
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (self.next_u32() as f32 / u32::MAX as f32) * (hi - lo)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub angle: f32,
    pub spin: f32,
    pub size: f32,
    pub texture: usize,
    pub tint: PackedColor,
}

pub struct SpriteField {
    sprites: Vec<Sprite>,
    /// Frames in the spinner strip texture (the last texture slot).
    spinner_frames: u32,
}

impl SpriteField {
    pub fn new(count: usize, textures: usize, spinner_frames: u32, seed: u32) -> Self {
        let mut rng = XorShift::new(seed);
        let sprites = (0..count)
            .map(|i| Sprite {
                x: rng.range(0.0, 1280.0),
                y: rng.range(0.0, 720.0),
                vx: rng.range(-120.0, 120.0),
                vy: rng.range(-120.0, 120.0),
                angle: rng.range(0.0, std::f32::consts::TAU),
                spin: rng.range(-3.0, 3.0),
                size: rng.range(12.0, 40.0),
                texture: i % textures,
                tint: PackedColor::from_rgba8(
                    rng.range(96.0, 256.0) as u8,
                    rng.range(96.0, 256.0) as u8,
                    rng.range(96.0, 256.0) as u8,
                    230,
                ),
            })
            .collect();

        Self {
            sprites,
            spinner_frames,
        }
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Orders sprites by texture so each texture costs one draw per batch.
    pub fn sort_by_texture(&mut self) {
        self.sprites.sort_by_key(|s| s.texture);
    }

    /// Interleaves textures so nearly every sprite forces a flush.
    pub fn interleave(&mut self) {
        let textures = self.sprites.iter().map(|s| s.texture).max().map_or(1, |m| m + 1);
        for (i, s) in self.sprites.iter_mut().enumerate() {
            s.texture = i % textures;
        }
    }

    pub fn update(&mut self, dt: f32, width: f32, height: f32) {
        for s in &mut self.sprites {
            s.x += s.vx * dt;
            s.y += s.vy * dt;
            s.angle += s.spin * dt;

            if s.x < 0.0 || s.x > width {
                s.vx = -s.vx;
                s.x = s.x.clamp(0.0, width);
            }
            if s.y < 0.0 || s.y > height {
                s.vy = -s.vy;
                s.y = s.y.clamp(0.0, height);
            }
        }
    }

    pub fn draw<D: GraphicsDevice>(
        &self,
        canvas: &mut Canvas<D>,
        textures: &[TextureHandle],
        elapsed: f32,
    ) -> Result<(), DeviceError> {
        let spinner = textures.len() - 1;
        let frame = (elapsed * 12.0) as u32 % self.spinner_frames;

        for s in &self.sprites {
            let half = s.size / 2.0;
            let uv = if s.texture == spinner {
                UvRect::tile(frame, 0, self.spinner_frames, 1)
            } else {
                UvRect::FULL
            };

            canvas.push();
            canvas.translate(s.x, s.y);
            canvas.rotate(s.angle);
            canvas.set_tint(s.tint);
            canvas.draw_image(textures[s.texture], Rect::new(-half, -half, s.size, s.size), uv)?;
            canvas.pop();
        }
        canvas.set_tint(PackedColor::WHITE);
        Ok(())
    }
}
