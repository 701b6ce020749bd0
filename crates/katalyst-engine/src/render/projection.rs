use crate::coords::Viewport;
use crate::transform::Affine2;

/// Pixel space → device space.
pub struct Projection;

impl Projection {
    /// Maps `(0, 0)` to `(-1, 1)` and `(width, height)` to `(1, -1)`:
    /// `x' = x * 2/width - 1`, `y' = 1 - y * 2/height`.
    pub fn build(width: f32, height: f32) -> Affine2 {
        Affine2 {
            a: 2.0 / width,
            b: 0.0,
            c: 0.0,
            d: -2.0 / height,
            e: -1.0,
            f: 1.0,
        }
    }
}

/// Projection for the last seen surface size. Rebuilt only when the size changes.
#[derive(Debug, Clone)]
pub struct ProjectionCache {
    size: Option<(u32, u32)>,
    matrix: Affine2,
}

impl ProjectionCache {
    pub const fn new() -> Self {
        Self {
            size: None,
            matrix: Affine2::IDENTITY,
        }
    }

    /// Returns `true` if the matrix was rebuilt.
    ///
    /// Zero-area sizes (minimized windows) are ignored and keep the previous matrix.
    pub fn update(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::debug!("ignoring zero-sized surface {width}x{height}");
            return false;
        }
        if self.size == Some((width, height)) {
            return false;
        }

        self.size = Some((width, height));
        self.matrix = Projection::build(width as f32, height as f32);
        log::debug!("projection rebuilt for {width}x{height}");
        true
    }

    pub fn matrix(&self) -> &Affine2 {
        &self.matrix
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// Last accepted surface size, `None` before the first valid update.
    pub fn viewport(&self) -> Option<Viewport> {
        self.size.map(|(w, h)| Viewport::from_physical(w, h))
    }
}

impl Default for ProjectionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
    }

    #[test]
    fn corners_map_to_device_corners() {
        for (w, h) in [(800.0, 600.0), (1.0, 1.0), (1920.0, 1080.0), (333.0, 77.0)] {
            let p = Projection::build(w, h);
            assert_eq!(p.transform_point(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0));
            assert!(close(p.transform_point(Vec2::new(w, h)), Vec2::new(1.0, -1.0)));
            assert!(close(p.transform_point(Vec2::new(w / 2.0, h / 2.0)), Vec2::ZERO));
        }
    }

    #[test]
    fn uniform_terms_are_scale_and_offset() {
        let p = Projection::build(320.0, 200.0);
        assert_eq!([p.a, p.d, p.e, p.f], [2.0 / 320.0, -2.0 / 200.0, -1.0, 1.0]);
    }

    #[test]
    fn cache_rebuilds_only_on_change() {
        let mut cache = ProjectionCache::new();
        assert!(cache.update(640, 480));
        let first = *cache.matrix();
        assert!(!cache.update(640, 480));
        assert_eq!(*cache.matrix(), first);

        assert!(cache.update(1280, 720));
        assert_eq!(cache.size(), Some((1280, 720)));
        assert_ne!(*cache.matrix(), first);
    }

    #[test]
    fn zero_size_keeps_previous_matrix() {
        let mut cache = ProjectionCache::new();
        assert_eq!(cache.viewport(), None);
        assert!(!cache.update(0, 480));
        assert_eq!(*cache.matrix(), Affine2::IDENTITY);

        cache.update(100, 100);
        let m = *cache.matrix();
        assert!(!cache.update(100, 0));
        assert_eq!(*cache.matrix(), m);
        assert_eq!(cache.size(), Some((100, 100)));
        assert!(cache.viewport().is_some_and(Viewport::is_valid));
    }
}
