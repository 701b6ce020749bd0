/// One acquired swapchain image.
///
/// Short-lived: holding the surface texture blocks acquisition of the next
/// frame. Hand it back through `Gpu::present` once its commands are recorded.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl GpuFrame {
    pub fn size(&self) -> (u32, u32) {
        let tex = &self.surface_texture.texture;
        (tex.width(), tex.height())
    }
}

/// Outcome of a failed frame acquisition, see `Gpu::handle_surface_error`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame can be acquired.
    Reconfigured,
    /// Transient; drop this frame.
    SkipFrame,
    /// Unrecoverable (out of memory). The runtime exits.
    Fatal,
}
