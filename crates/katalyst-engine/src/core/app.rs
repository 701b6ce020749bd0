use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::device::WgpuDevice;
use crate::render::Canvas;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by `window::Runtime`.
pub trait App {
    /// Called once per window after its canvas exists, before the first frame.
    /// Textures are usually created here.
    fn on_canvas_ready(&mut self, window_id: WindowId, canvas: &mut Canvas<WgpuDevice>) -> AppControl {
        let _ = (window_id, canvas);
        AppControl::Continue
    }

    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per redraw per window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
