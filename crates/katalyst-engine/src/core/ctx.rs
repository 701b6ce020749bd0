use winit::window::{Window, WindowId};

use crate::coords::ColorRgba;
use crate::device::{DeviceError, Gpu, SurfaceErrorAction, WgpuDevice};
use crate::render::Canvas;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in physical pixels; the canvas works in these units.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub canvas: &'a mut Canvas<WgpuDevice>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Renders one frame: acquires the surface image, updates the projection,
    /// clears to `clear`, runs `draw`, flushes and presents.
    ///
    /// A device error is fatal for this window's renderer: it is logged, the
    /// frame is dropped and `AppControl::Exit` is returned.
    pub fn render<F>(&mut self, clear: ColorRgba, draw: F) -> AppControl
    where
        F: FnOnce(&mut Canvas<WgpuDevice>) -> Result<(), DeviceError>,
    {
        let frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::warn!("surface acquisition failed: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    _ => AppControl::Continue,
                };
            }
        };

        let (width, height) = frame.size();
        self.canvas.device_mut().begin_frame(frame.view.clone());
        let recorded = record_frame(self.canvas, width, height, clear, draw);
        let commands = self.canvas.device_mut().end_frame();

        if let Err(err) = recorded {
            log::error!("renderer failed on window {:?}: {err}", self.window.id);
            return AppControl::Exit;
        }

        self.window.window.pre_present_notify();
        self.gpu.present(frame, commands);
        AppControl::Continue
    }
}

fn record_frame<F>(
    canvas: &mut Canvas<WgpuDevice>,
    width: u32,
    height: u32,
    clear: ColorRgba,
    draw: F,
) -> Result<(), DeviceError>
where
    F: FnOnce(&mut Canvas<WgpuDevice>) -> Result<(), DeviceError>,
{
    canvas.resize(width, height)?;
    canvas.set_clear_color(clear);
    canvas.clear()?;
    draw(canvas)?;
    canvas.flush()
}
