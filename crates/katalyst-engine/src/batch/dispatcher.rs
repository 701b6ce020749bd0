use crate::coords::PackedColor;
use crate::device::{
    BufferHandle, BufferKind, BufferUsage, DeviceError, GraphicsDevice, PrimitiveKind,
    TextureHandle,
};
use crate::transform::Affine2;

use super::index::INDICES_PER_QUAD;
use super::packer::{Quad, VertexPacker};

/// Default batch capacity: the most quads whose indices fit a 65536-entry
/// index range (`65536 / 6`).
pub const DEFAULT_MAX_BATCH: usize = 10922;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Quads accumulated before a forced flush.
    pub capacity_quads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity_quads: DEFAULT_MAX_BATCH,
        }
    }
}

/// Counters accumulated since the last `take_stats`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub quads: u64,
    pub flushes: u64,
    pub texture_binds: u64,
    pub indices_submitted: u64,
}

/// Accumulates quads that share a texture and submits them as one indexed draw.
///
/// States: idle (`pending_quads() == 0`) or accumulating. The bound texture
/// survives flushes; the device is only asked to bind when it changes.
#[derive(Debug)]
pub struct BatchDispatcher {
    packer: VertexPacker,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,

    current_texture: Option<TextureHandle>,
    count: usize,

    stats: BatchStats,
}

impl BatchDispatcher {
    /// Creates the static index buffer (uploaded once) and the dynamic vertex
    /// buffer on `device`.
    ///
    /// # Panics
    /// If `config.capacity_quads` is 0 or exceeds `MAX_QUADS_U16`.
    pub fn new<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        config: BatchConfig,
    ) -> Result<Self, DeviceError> {
        let packer = VertexPacker::new(config.capacity_quads);

        let index_bytes = packer.index_bytes();
        let index_buffer =
            device.create_buffer(BufferKind::Index, index_bytes.len() as u64, BufferUsage::Static)?;
        device.upload_sub_range(index_buffer, 0, index_bytes)?;

        let vertex_buffer = device.create_buffer(
            BufferKind::Vertex,
            packer.vertex_capacity_bytes() as u64,
            BufferUsage::Dynamic,
        )?;

        log::debug!(
            "batch dispatcher ready: capacity={} quads, vertex buffer {} bytes",
            config.capacity_quads,
            packer.vertex_capacity_bytes()
        );

        Ok(Self {
            packer,
            vertex_buffer,
            index_buffer,
            current_texture: None,
            count: 0,
            stats: BatchStats::default(),
        })
    }

    /// Queues one quad, flushing first if the texture changes or the batch is full.
    ///
    /// The quad's corners are transformed by `transform` now; later transform
    /// changes do not affect it. Color never causes a flush.
    ///
    /// # Errors
    /// Device failures propagate. A failure before the quad is written (the
    /// pre-flush or the texture bind) leaves it unqueued. A failure of the
    /// eager flush at the capacity boundary happens after the write: the quad
    /// stays queued with the rest of the batch, and the caller should retry
    /// with [`flush`](Self::flush) rather than drawing it again.
    pub fn draw_quad<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        transform: &Affine2,
        texture: TextureHandle,
        quad: &Quad,
        color: PackedColor,
    ) -> Result<(), DeviceError> {
        let texture_changed = self.current_texture != Some(texture);

        if texture_changed || self.count == self.capacity() {
            self.flush(device)?;
        }

        if texture_changed {
            device.bind_texture(texture)?;
            log::debug!("bound texture {texture:?}");
            self.current_texture = Some(texture);
            self.stats.texture_binds += 1;
        }

        self.packer.write_quad(self.count, quad, color, transform);
        self.count += 1;
        self.stats.quads += 1;

        if self.count == self.capacity() {
            self.flush(device)?;
        }
        Ok(())
    }

    /// Uploads the pending vertices, binds this dispatcher's vertex and index
    /// buffers and draws them with one indexed call.
    ///
    /// Does nothing when no quads are pending. On error the pending quads are
    /// kept, so the flush can be retried.
    pub fn flush<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) -> Result<(), DeviceError> {
        if self.count == 0 {
            return Ok(());
        }

        device.upload_sub_range(self.vertex_buffer, 0, self.packer.vertex_bytes(self.count))?;
        device.bind_buffer(self.vertex_buffer)?;
        device.bind_buffer(self.index_buffer)?;

        let index_count = (self.count * INDICES_PER_QUAD) as u32;
        device.draw_indexed(PrimitiveKind::Triangles, index_count, 0)?;

        log::trace!(
            "flushed {} quads ({index_count} indices) with {:?}",
            self.count,
            self.current_texture
        );

        self.stats.flushes += 1;
        self.stats.indices_submitted += index_count as u64;
        self.count = 0;
        Ok(())
    }

    pub fn pending_quads(&self) -> usize {
        self.count
    }

    pub fn current_texture(&self) -> Option<TextureHandle> {
        self.current_texture
    }

    pub fn capacity(&self) -> usize {
        self.packer.capacity()
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Returns the counters and resets them.
    pub fn take_stats(&mut self) -> BatchStats {
        std::mem::take(&mut self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Vertex;
    use crate::coords::{Rect, UvRect};
    use crate::device::{DeviceCall, RecordingDevice};

    fn quad_at(x: f32) -> Quad {
        Quad::new(Rect::new(x, 0.0, 1.0, 1.0), UvRect::FULL)
    }

    fn setup(capacity: usize) -> (RecordingDevice, BatchDispatcher, TextureHandle, TextureHandle) {
        let mut dev = RecordingDevice::new();
        let batch = BatchDispatcher::new(&mut dev, BatchConfig { capacity_quads: capacity }).unwrap();
        let a = dev.create_texture(8, 8);
        let b = dev.create_texture(8, 8);
        dev.take_calls();
        (dev, batch, a, b)
    }

    fn draw(dev: &mut RecordingDevice, batch: &mut BatchDispatcher, tex: TextureHandle) {
        batch
            .draw_quad(dev, &Affine2::IDENTITY, tex, &quad_at(0.0), PackedColor::WHITE)
            .unwrap();
    }

    fn index_counts(dev: &RecordingDevice) -> Vec<u32> {
        dev.draws().iter().map(|&(count, _, _)| count).collect()
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn new_creates_buffers_and_uploads_indices_once() {
        let mut dev = RecordingDevice::new();
        let batch = BatchDispatcher::new(&mut dev, BatchConfig { capacity_quads: 3 }).unwrap();

        let ib = batch.index_buffer();
        let vb = batch.vertex_buffer();
        assert_eq!(
            dev.calls(),
            &[
                DeviceCall::CreateBuffer {
                    buffer: ib,
                    kind: BufferKind::Index,
                    size_bytes: 36,
                    usage: BufferUsage::Static,
                },
                DeviceCall::UploadSubRange { buffer: ib, offset_bytes: 0, len: 36 },
                DeviceCall::CreateBuffer {
                    buffer: vb,
                    kind: BufferKind::Vertex,
                    size_bytes: 240,
                    usage: BufferUsage::Dynamic,
                },
            ]
        );

        let indices: Vec<u16> = dev
            .buffer_data(ib)
            .unwrap()
            .chunks_exact(2)
            .map(|b| u16::from_ne_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(indices, vec![0u16, 1, 2, 0, 3, 1, 4, 5, 6, 4, 7, 5, 8, 9, 10, 8, 11, 9]);
        assert_eq!(batch.pending_quads(), 0);
        assert_eq!(batch.current_texture(), None);
    }

    #[test]
    fn default_capacity_fills_u16_index_range() {
        assert_eq!(BatchConfig::default().capacity_quads, 10922);
    }

    #[test]
    #[should_panic(expected = "at least one quad")]
    fn zero_capacity_is_fatal() {
        let mut dev = RecordingDevice::new();
        let _ = BatchDispatcher::new(&mut dev, BatchConfig { capacity_quads: 0 });
    }

    // ── flushing ──────────────────────────────────────────────────────────

    #[test]
    fn single_texture_flushes_once_with_all_indices() {
        let (mut dev, mut batch, a, _) = setup(16);
        for _ in 0..5 {
            draw(&mut dev, &mut batch, a);
        }
        assert!(dev.draws().is_empty());

        batch.flush(&mut dev).unwrap();
        assert_eq!(dev.draws(), vec![(30, 0, a)]);
        assert_eq!(batch.pending_quads(), 0);
        assert_eq!(batch.current_texture(), Some(a));
    }

    #[test]
    fn flush_uploads_only_the_valid_prefix() {
        let (mut dev, mut batch, a, _) = setup(16);
        draw(&mut dev, &mut batch, a);
        draw(&mut dev, &mut batch, a);
        batch.flush(&mut dev).unwrap();

        assert!(dev.calls().contains(&DeviceCall::UploadSubRange {
            buffer: batch.vertex_buffer(),
            offset_bytes: 0,
            len: 2 * 4 * 20,
        }));
    }

    #[test]
    fn empty_flush_issues_no_device_calls() {
        let (mut dev, mut batch, a, _) = setup(4);
        batch.flush(&mut dev).unwrap();
        assert!(dev.calls().is_empty());

        draw(&mut dev, &mut batch, a);
        batch.flush(&mut dev).unwrap();
        dev.take_calls();
        batch.flush(&mut dev).unwrap();
        assert!(dev.calls().is_empty());
    }

    #[test]
    fn texture_switch_flushes_once_and_binds_once() {
        let (mut dev, mut batch, a, b) = setup(16);
        draw(&mut dev, &mut batch, a);
        dev.take_calls();

        batch
            .draw_quad(&mut dev, &Affine2::IDENTITY, b, &quad_at(7.0), PackedColor::WHITE)
            .unwrap();

        let calls = dev.take_calls();
        assert_eq!(calls.len(), 5, "{calls:?}");
        assert!(matches!(calls[0], DeviceCall::UploadSubRange { len: 80, .. }));
        assert_eq!(
            calls[1],
            DeviceCall::BindBuffer { buffer: batch.vertex_buffer(), kind: BufferKind::Vertex }
        );
        assert_eq!(
            calls[2],
            DeviceCall::BindBuffer { buffer: batch.index_buffer(), kind: BufferKind::Index }
        );
        assert_eq!(
            calls[3],
            DeviceCall::DrawIndexed {
                primitive: PrimitiveKind::Triangles,
                index_count: 6,
                index_offset: 0,
                texture: a,
            }
        );
        assert_eq!(calls[4], DeviceCall::BindTexture(b));
        assert_eq!(batch.pending_quads(), 1);

        // The new batch starts at slot 0 with the second quad.
        batch.flush(&mut dev).unwrap();
        let first: Vertex =
            bytemuck::pod_read_unaligned(&dev.buffer_data(batch.vertex_buffer()).unwrap()[..20]);
        assert_eq!(first.pos, [7.0, 0.0]);
        assert_eq!(dev.draws(), vec![(6, 0, b)]);
    }

    #[test]
    fn same_texture_after_flush_is_not_rebound() {
        let (mut dev, mut batch, a, _) = setup(4);
        draw(&mut dev, &mut batch, a);
        batch.flush(&mut dev).unwrap();
        draw(&mut dev, &mut batch, a);
        assert_eq!(dev.binds(), vec![a]);
    }

    #[test]
    fn color_changes_never_flush() {
        let (mut dev, mut batch, a, _) = setup(8);
        for i in 0..6u8 {
            batch
                .draw_quad(
                    &mut dev,
                    &Affine2::IDENTITY,
                    a,
                    &quad_at(0.0),
                    PackedColor::from_rgba8(i, 255 - i, i * 2, 255),
                )
                .unwrap();
        }
        assert!(dev.draws().is_empty());
        assert_eq!(batch.pending_quads(), 6);
    }

    #[test]
    fn full_batch_flushes_eagerly_at_the_boundary() {
        let (mut dev, mut batch, a, _) = setup(4);
        for _ in 0..3 {
            draw(&mut dev, &mut batch, a);
        }
        assert!(dev.draws().is_empty());

        draw(&mut dev, &mut batch, a);
        assert_eq!(index_counts(&dev), vec![24]);
        assert_eq!(batch.pending_quads(), 0);

        draw(&mut dev, &mut batch, a);
        assert_eq!(index_counts(&dev), vec![24]);
        assert_eq!(batch.pending_quads(), 1);
    }

    #[test]
    fn capacity_two_three_quads_gives_two_flushes() {
        let (mut dev, mut batch, a, _) = setup(2);
        for _ in 0..3 {
            draw(&mut dev, &mut batch, a);
        }
        batch.flush(&mut dev).unwrap();

        assert_eq!(index_counts(&dev), vec![12, 6]);
        assert_eq!(
            batch.take_stats(),
            BatchStats {
                quads: 3,
                flushes: 2,
                texture_binds: 1,
                indices_submitted: 18,
            }
        );
        assert_eq!(batch.stats(), BatchStats::default());
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn failed_flush_keeps_pending_quads() {
        let (mut dev, mut batch, a, _) = setup(8);
        draw(&mut dev, &mut batch, a);
        draw(&mut dev, &mut batch, a);

        dev.fail_next(DeviceError::NoActiveFrame);
        assert_eq!(batch.flush(&mut dev), Err(DeviceError::NoActiveFrame));
        assert_eq!(batch.pending_quads(), 2);
        assert!(dev.draws().is_empty());

        batch.flush(&mut dev).unwrap();
        assert_eq!(index_counts(&dev), vec![12]);
    }

    #[test]
    fn failed_eager_flush_keeps_the_quad_queued_once() {
        let (mut dev, mut batch, a, _) = setup(2);
        draw(&mut dev, &mut batch, a);

        dev.fail_next(DeviceError::NoActiveFrame);
        let err = batch
            .draw_quad(&mut dev, &Affine2::IDENTITY, a, &quad_at(3.0), PackedColor::WHITE)
            .unwrap_err();
        assert_eq!(err, DeviceError::NoActiveFrame);
        assert_eq!(batch.pending_quads(), 2);
        assert!(dev.draws().is_empty());

        batch.flush(&mut dev).unwrap();
        assert_eq!(index_counts(&dev), vec![12]);
        assert_eq!(batch.stats().quads, 2);

        let second: Vertex = bytemuck::pod_read_unaligned(
            &dev.buffer_data(batch.vertex_buffer()).unwrap()[4 * 20..5 * 20],
        );
        assert_eq!(second.pos, [3.0, 0.0]);
    }

    #[test]
    fn failed_eager_flush_is_retried_by_the_next_draw() {
        let (mut dev, mut batch, a, _) = setup(1);
        dev.fail_next(DeviceError::NoActiveFrame);
        // Texture bind consumes the failure, so the first quad is never queued.
        assert!(batch
            .draw_quad(&mut dev, &Affine2::IDENTITY, a, &quad_at(0.0), PackedColor::WHITE)
            .is_err());
        assert_eq!(batch.pending_quads(), 0);

        draw(&mut dev, &mut batch, a);
        assert_eq!(index_counts(&dev), vec![6]);

        dev.fail_next(DeviceError::NoActiveFrame);
        assert!(batch
            .draw_quad(&mut dev, &Affine2::IDENTITY, a, &quad_at(1.0), PackedColor::WHITE)
            .is_err());
        assert_eq!(batch.pending_quads(), 1);

        // The full batch is flushed before the next quad is written.
        draw(&mut dev, &mut batch, a);
        assert_eq!(index_counts(&dev), vec![6, 6, 6]);
        assert_eq!(batch.pending_quads(), 0);
    }

    #[test]
    fn unknown_texture_propagates_device_error() {
        let (mut dev, mut batch, _, _) = setup(8);
        let bogus = TextureHandle::from_raw(99);
        let err = batch
            .draw_quad(&mut dev, &Affine2::IDENTITY, bogus, &quad_at(0.0), PackedColor::WHITE)
            .unwrap_err();
        assert_eq!(err, DeviceError::UnknownTexture(bogus));
        assert_eq!(batch.current_texture(), None);
        assert_eq!(batch.pending_quads(), 0);
    }

    // ── shared device ─────────────────────────────────────────────────────

    #[test]
    fn dispatchers_sharing_a_device_draw_from_their_own_buffers() {
        let mut dev = RecordingDevice::new();
        let mut wide = BatchDispatcher::new(&mut dev, BatchConfig { capacity_quads: 4 }).unwrap();
        let mut narrow = BatchDispatcher::new(&mut dev, BatchConfig { capacity_quads: 1 }).unwrap();
        let tex = dev.create_texture(4, 4);

        for _ in 0..3 {
            draw(&mut dev, &mut wide, tex);
        }
        wide.flush(&mut dev).unwrap();
        assert_eq!(dev.bound_buffer(BufferKind::Index), Some(wide.index_buffer()));
        assert_eq!(dev.bound_buffer(BufferKind::Vertex), Some(wide.vertex_buffer()));

        draw(&mut dev, &mut narrow, tex);
        assert_eq!(dev.bound_buffer(BufferKind::Index), Some(narrow.index_buffer()));
        assert_eq!(index_counts(&dev), vec![18, 6]);

        draw(&mut dev, &mut wide, tex);
        wide.flush(&mut dev).unwrap();
        assert_eq!(index_counts(&dev), vec![18, 6, 6]);
        assert_eq!(dev.bound_buffer(BufferKind::Vertex), Some(wide.vertex_buffer()));
    }

    // ── randomized texture switching ──────────────────────────────────────

    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }
    }

    #[test]
    fn random_texture_switching_respects_capacity() {
        for (seed, capacity) in [(0x9E37_79B9_7F4A_7C15u64, 7usize), (42, 1), (7, 64)] {
            let mut rng = XorShift(seed);
            let mut dev = RecordingDevice::new();
            let mut batch =
                BatchDispatcher::new(&mut dev, BatchConfig { capacity_quads: capacity }).unwrap();
            let textures: Vec<TextureHandle> = (0..3).map(|_| dev.create_texture(4, 4)).collect();

            let mut expected_binds = 0;
            let mut last = None;
            let total = 2000;
            for _ in 0..total {
                let tex = textures[(rng.next() % 3) as usize];
                if last != Some(tex) {
                    expected_binds += 1;
                    last = Some(tex);
                }
                draw(&mut dev, &mut batch, tex);
                assert!(batch.pending_quads() < capacity);
            }
            batch.flush(&mut dev).unwrap();

            let draws = dev.draws();
            assert!(draws.iter().all(|&(count, offset, _)| {
                offset == 0 && count > 0 && count % 6 == 0 && count as usize <= capacity * 6
            }));
            let submitted: u64 = draws.iter().map(|&(count, _, _)| count as u64).sum();
            assert_eq!(submitted, total * 6);
            assert_eq!(dev.binds().len(), expected_binds);

            let stats = batch.stats();
            assert_eq!(stats.quads, total);
            assert_eq!(stats.flushes, draws.len() as u64);
            assert_eq!(stats.indices_submitted, submitted);
        }
    }
}
