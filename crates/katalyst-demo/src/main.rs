//! Sprite batching demo: a field of bouncing, spinning, tinted sprites.
//!
//! Keys: `T` toggles texture order (sorted vs interleaved), `Escape` quits.
//! Batch statistics are logged once per second.

mod sprites;
mod textures;

use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use katalyst_engine::coords::{ColorRgba, Viewport};
use katalyst_engine::core::{App, AppControl, FrameCtx};
use katalyst_engine::device::{GpuInit, TextureHandle, WgpuDevice};
use katalyst_engine::logging::{init_logging, LoggingConfig};
use katalyst_engine::render::{Canvas, CanvasConfig};
use katalyst_engine::window::{Runtime, RuntimeConfig};

use sprites::SpriteField;

const SPRITE_COUNT: usize = 20_000;
const SPINNER_FRAMES: u32 = 8;
const BACKGROUND: ColorRgba = ColorRgba::rgb(0.08, 0.09, 0.12);

struct Demo {
    field: SpriteField,
    textures: Vec<TextureHandle>,
    sorted: bool,
    next_report: f32,
}

impl Demo {
    fn new() -> Self {
        let mut field = SpriteField::new(SPRITE_COUNT, 3, SPINNER_FRAMES, 0x5EED);
        field.sort_by_texture();
        Self {
            field,
            textures: Vec::new(),
            sorted: true,
            next_report: 1.0,
        }
    }

    fn toggle_order(&mut self) {
        self.sorted = !self.sorted;
        if self.sorted {
            self.field.sort_by_texture();
        } else {
            self.field.interleave();
        }
        log::info!("texture order: {}", if self.sorted { "sorted" } else { "interleaved" });
    }
}

impl App for Demo {
    fn on_canvas_ready(&mut self, _window_id: WindowId, canvas: &mut Canvas<WgpuDevice>) -> AppControl {
        let images = [
            textures::checker(16, 4, [255, 255, 255, 255], [90, 90, 90, 255]),
            textures::disc(32),
            textures::spinner_strip(32, SPINNER_FRAMES),
        ];

        let device = canvas.device_mut();
        let created: Result<Vec<_>, _> = images
            .iter()
            .map(|img| device.create_texture_rgba(img.width, img.height, &img.rgba))
            .collect();

        match created {
            Ok(handles) => {
                self.textures = handles;
                log::info!("{} sprites over {} textures", self.field.len(), self.textures.len());
                AppControl::Continue
            }
            Err(err) => {
                log::error!("texture upload failed: {err}");
                AppControl::Exit
            }
        }
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => AppControl::Exit,
            PhysicalKey::Code(KeyCode::KeyT) => {
                self.toggle_order();
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let bounds = ctx.canvas.viewport().unwrap_or_else(|| {
            let (w, h) = ctx.window.physical_size();
            Viewport::from_physical(w, h)
        });
        self.field.update(ctx.time.dt, bounds.width, bounds.height);

        let field = &self.field;
        let textures = &self.textures;
        let elapsed = ctx.time.elapsed;
        let control = ctx.render(BACKGROUND, |canvas| {
            canvas.reset_transform();
            field.draw(canvas, textures, elapsed)
        });

        if ctx.time.elapsed >= self.next_report {
            self.next_report = ctx.time.elapsed + 1.0;
            let stats = ctx.canvas.take_stats();
            log::info!(
                "{:.0} fps | last second: {} quads, {} draws, {} texture binds",
                ctx.time.fps,
                stats.quads,
                stats.flushes,
                stats.texture_binds
            );
            ctx.window
                .set_title(&format!("katalyst sprites | {:.0} fps", ctx.time.fps));
        }

        control
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let gpu_init = GpuInit {
        present_mode: wgpu::PresentMode::AutoVsync,
        ..GpuInit::default()
    };

    let canvas_config = CanvasConfig {
        clear_color: BACKGROUND,
        ..CanvasConfig::default()
    };

    Runtime::run(
        RuntimeConfig {
            title: "katalyst sprites".to_string(),
            ..RuntimeConfig::default()
        },
        gpu_init,
        canvas_config,
        Demo::new(),
    )
}
