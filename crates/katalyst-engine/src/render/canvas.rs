use crate::batch::{BatchConfig, BatchDispatcher, BatchStats, Quad};
use crate::coords::{ColorRgba, PackedColor, Rect, UvRect, Viewport};
use crate::device::{BlendMode, DeviceError, GraphicsDevice, TextureHandle};
use crate::transform::Transform2D;

use super::projection::ProjectionCache;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    pub batch: BatchConfig,
    /// Set once on the device when the canvas is created.
    pub blend: BlendMode,
    pub clear_color: ColorRgba,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            blend: BlendMode::ALPHA,
            clear_color: ColorRgba::black(),
        }
    }
}

/// Immediate-mode 2D drawing surface.
///
/// Owns a device plus everything needed to feed it: the batch, the transform
/// state, the cached projection, the clear color and the current tint.
///
/// Quads are drawn in call order. Call [`Canvas::flush`] before the frame is
/// submitted so no quads remain pending.
pub struct Canvas<D: GraphicsDevice> {
    device: D,
    batch: BatchDispatcher,
    transform: Transform2D,
    projection: ProjectionCache,
    clear_color: ColorRgba,
    tint: PackedColor,
}

impl<D: GraphicsDevice> Canvas<D> {
    /// Configures blending and allocates the batch buffers on `device`.
    ///
    /// # Panics
    /// If the batch capacity is invalid, see [`BatchDispatcher::new`].
    pub fn new(mut device: D, config: CanvasConfig) -> Result<Self, DeviceError> {
        device.set_blend_mode(config.blend.src, config.blend.dst)?;
        let batch = BatchDispatcher::new(&mut device, config.batch)?;

        Ok(Self {
            device,
            batch,
            transform: Transform2D::new(),
            projection: ProjectionCache::new(),
            clear_color: config.clear_color,
            tint: PackedColor::WHITE,
        })
    }

    /// Updates the projection for a surface of `width` x `height` pixels.
    ///
    /// The device only receives a new matrix when the size actually changed.
    /// Returns whether it did.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, DeviceError> {
        if !self.projection.update(width, height) {
            return Ok(false);
        }
        self.device.set_projection(self.projection.matrix())?;
        Ok(true)
    }

    /// Size the projection currently maps, `None` before the first `resize`.
    pub fn viewport(&self) -> Option<Viewport> {
        self.projection.viewport()
    }

    pub fn set_clear_color(&mut self, color: ColorRgba) {
        self.clear_color = color;
    }

    pub fn clear_color(&self) -> ColorRgba {
        self.clear_color
    }

    /// Clears the target to the clear color.
    ///
    /// Pending quads are flushed first so they stay ordered before the clear.
    pub fn clear(&mut self) -> Result<(), DeviceError> {
        self.batch.flush(&mut self.device)?;
        self.device.clear(self.clear_color)
    }

    /// Color used by [`Canvas::draw_image`]. White leaves textures unmodified.
    pub fn set_tint(&mut self, tint: PackedColor) {
        self.tint = tint;
    }

    pub fn tint(&self) -> PackedColor {
        self.tint
    }

    // ── transform ─────────────────────────────────────────────────────────

    pub fn translate(&mut self, x: f32, y: f32) {
        self.transform.translate(x, y);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.transform.scale(x, y);
    }

    pub fn rotate(&mut self, radians: f32) {
        self.transform.rotate(radians);
    }

    /// # Panics
    /// When more than `MAX_STACK_DEPTH` states are saved.
    pub fn push(&mut self) {
        self.transform.push();
    }

    /// # Panics
    /// Without a matching [`Canvas::push`].
    pub fn pop(&mut self) {
        self.transform.pop();
    }

    /// Back to identity with no saved states.
    pub fn reset_transform(&mut self) {
        self.transform.reset();
    }

    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    // ── drawing ───────────────────────────────────────────────────────────

    /// Draws `uv` of `texture` into `rect` with the current tint.
    pub fn draw_image(
        &mut self,
        texture: TextureHandle,
        rect: Rect,
        uv: UvRect,
    ) -> Result<(), DeviceError> {
        self.draw_quad(texture, rect, uv, self.tint)
    }

    pub fn draw_quad(
        &mut self,
        texture: TextureHandle,
        rect: Rect,
        uv: UvRect,
        color: PackedColor,
    ) -> Result<(), DeviceError> {
        self.batch.draw_quad(
            &mut self.device,
            self.transform.current(),
            texture,
            &Quad::new(rect, uv),
            color,
        )
    }

    /// Draws one quad and flushes, so it reaches the device before returning.
    pub fn draw_immediate(
        &mut self,
        texture: TextureHandle,
        rect: Rect,
        uv: UvRect,
        color: PackedColor,
    ) -> Result<(), DeviceError> {
        self.draw_quad(texture, rect, uv, color)?;
        self.batch.flush(&mut self.device)
    }

    pub fn flush(&mut self) -> Result<(), DeviceError> {
        self.batch.flush(&mut self.device)
    }

    pub fn pending_quads(&self) -> usize {
        self.batch.pending_quads()
    }

    pub fn stats(&self) -> BatchStats {
        self.batch.stats()
    }

    pub fn take_stats(&mut self) -> BatchStats {
        self.batch.take_stats()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Vertex;
    use crate::device::{BlendFactor, DeviceCall, RecordingDevice};
    use crate::render::Projection;

    fn canvas(capacity: usize) -> (Canvas<RecordingDevice>, TextureHandle, TextureHandle) {
        let mut dev = RecordingDevice::new();
        let a = dev.create_texture(16, 16);
        let b = dev.create_texture(16, 16);
        let config = CanvasConfig {
            batch: BatchConfig { capacity_quads: capacity },
            ..CanvasConfig::default()
        };
        let mut c = Canvas::new(dev, config).unwrap();
        c.device_mut().take_calls();
        (c, a, b)
    }

    /// Vertex `i` of the currently uploaded batch.
    fn uploaded_vertex(c: &Canvas<RecordingDevice>, i: usize) -> Vertex {
        let vb = c.device().bound_buffer(crate::device::BufferKind::Vertex).unwrap();
        let data = c.device().buffer_data(vb).unwrap();
        bytemuck::pod_read_unaligned(&data[i * 20..i * 20 + 20])
    }

    const UNIT: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

    // ── setup ─────────────────────────────────────────────────────────────

    #[test]
    fn new_sets_blend_mode_before_creating_buffers() {
        let dev = RecordingDevice::new();
        let c = Canvas::new(dev, CanvasConfig::default()).unwrap();
        let calls = c.device().calls();
        assert_eq!(
            calls[0],
            DeviceCall::SetBlendMode {
                src: BlendFactor::SrcAlpha,
                dst: BlendFactor::OneMinusSrcAlpha,
            }
        );
        assert!(matches!(calls[1], DeviceCall::CreateBuffer { .. }));
        assert_eq!(c.tint(), PackedColor::WHITE);
    }

    #[test]
    fn construction_failure_propagates() {
        let mut dev = RecordingDevice::new();
        dev.fail_next(DeviceError::ShaderCompilation("bad".into()));
        let err = Canvas::new(dev, CanvasConfig::default()).err();
        assert_eq!(err, Some(DeviceError::ShaderCompilation("bad".into())));
    }

    #[test]
    fn resize_sets_projection_only_on_change() {
        let (mut c, _, _) = canvas(4);
        assert!(c.resize(640, 480).unwrap());
        assert!(!c.resize(640, 480).unwrap());
        assert!(!c.resize(0, 0).unwrap());
        assert!(c.resize(800, 600).unwrap());
        assert_eq!(c.viewport(), Some(Viewport::new(800.0, 600.0)));

        let projections: Vec<_> = c
            .device()
            .calls()
            .iter()
            .filter_map(|call| match call {
                DeviceCall::SetProjection(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(
            projections,
            vec![Projection::build(640.0, 480.0), Projection::build(800.0, 600.0)]
        );
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[test]
    fn draw_image_uses_tint_without_flushing() {
        let (mut c, a, _) = canvas(8);
        c.draw_image(a, UNIT, UvRect::FULL).unwrap();
        let red = PackedColor::from_rgba8(255, 0, 0, 255);
        c.set_tint(red);
        c.draw_image(a, UNIT, UvRect::FULL).unwrap();
        assert_eq!(c.pending_quads(), 2);
        c.flush().unwrap();

        assert_eq!(c.device().draws(), vec![(12, 0, a)]);
        assert_eq!(uploaded_vertex(&c, 0).color, PackedColor::WHITE.to_u32());
        assert_eq!(uploaded_vertex(&c, 4).color, red.to_u32());
    }

    #[test]
    fn translate_rotate_scale_shift_unit_quad_exactly() {
        let (mut c, a, _) = canvas(8);
        c.translate(5.0, 0.0);
        c.rotate(0.0);
        c.scale(1.0, 1.0);
        c.draw_image(a, UNIT, UvRect::FULL).unwrap();
        c.flush().unwrap();

        let positions: Vec<[f32; 2]> = (0..4).map(|i| uploaded_vertex(&c, i).pos).collect();
        assert_eq!(positions, vec![[5.0, 0.0], [6.0, 1.0], [5.0, 1.0], [6.0, 0.0]]);
    }

    #[test]
    fn quads_keep_the_transform_active_when_drawn() {
        let (mut c, a, _) = canvas(8);
        c.push();
        c.translate(100.0, 0.0);
        c.draw_image(a, UNIT, UvRect::FULL).unwrap();
        c.pop();
        c.draw_image(a, UNIT, UvRect::FULL).unwrap();
        c.flush().unwrap();

        assert_eq!(uploaded_vertex(&c, 0).pos, [100.0, 0.0]);
        assert_eq!(uploaded_vertex(&c, 4).pos, [0.0, 0.0]);
        assert_eq!(c.transform().depth(), 0);
    }

    #[test]
    fn uv_sub_rect_is_stored_unmodified() {
        let (mut c, a, _) = canvas(8);
        c.scale(3.0, 3.0);
        c.draw_image(a, UNIT, UvRect::tile(1, 0, 4, 1)).unwrap();
        c.flush().unwrap();
        assert_eq!(uploaded_vertex(&c, 0).uv, [0.25, 0.0]);
        assert_eq!(uploaded_vertex(&c, 1).uv, [0.5, 1.0]);
    }

    #[test]
    fn draw_immediate_reaches_device_before_returning() {
        let (mut c, a, _) = canvas(8);
        c.draw_immediate(a, UNIT, UvRect::FULL, PackedColor::WHITE).unwrap();
        assert_eq!(c.pending_quads(), 0);
        assert_eq!(c.device().draws(), vec![(6, 0, a)]);
    }

    #[test]
    fn clear_flushes_pending_quads_first() {
        let (mut c, a, _) = canvas(8);
        c.set_clear_color(ColorRgba::rgb(0.1, 0.2, 0.3));
        c.draw_image(a, UNIT, UvRect::FULL).unwrap();
        c.clear().unwrap();

        let calls = c.device().calls();
        let draw_at = calls
            .iter()
            .position(|call| matches!(call, DeviceCall::DrawIndexed { .. }))
            .unwrap();
        let clear_at = calls
            .iter()
            .position(|call| matches!(call, DeviceCall::Clear(_)))
            .unwrap();
        assert!(draw_at < clear_at);
        assert_eq!(calls[clear_at], DeviceCall::Clear(ColorRgba::rgb(0.1, 0.2, 0.3)));
    }

    #[test]
    fn alternating_textures_produce_one_draw_each() {
        let (mut c, a, b) = canvas(8);
        for tex in [a, a, b, b, b, a] {
            c.draw_image(tex, UNIT, UvRect::FULL).unwrap();
        }
        c.flush().unwrap();

        assert_eq!(c.device().draws(), vec![(12, 0, a), (18, 0, b), (6, 0, a)]);
        let stats = c.take_stats();
        assert_eq!(stats.texture_binds, 3);
        assert_eq!(stats.flushes, 3);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn unmatched_pop_panics() {
        let (mut c, _, _) = canvas(1);
        c.pop();
    }
}
