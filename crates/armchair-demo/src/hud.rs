//! Heads-up overlay: frame-time bar, shader status, F5 shader reload.

use std::path::PathBuf;

use armchair_engine::core::{App, AppControl, FrameCtx};
use armchair_engine::render::{DEFAULT_SHADER, Overlay, OverlayDrawData, ShaderSource};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

const PANEL: [f32; 4] = [0.05, 0.05, 0.08, 0.75];
const BAR_TRACK: [f32; 4] = [0.25, 0.25, 0.30, 0.9];
const OK: [f32; 4] = [0.30, 0.85, 0.40, 1.0];
const WARN: [f32; 4] = [0.95, 0.75, 0.20, 1.0];
const BAD: [f32; 4] = [0.90, 0.25, 0.20, 1.0];

/// Frame time that fills the bar.
const BAR_FULL_SECONDS: f32 = 1.0 / 30.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ShaderStatus {
    Default,
    Custom,
    LoadFailed,
}

pub struct Hud {
    shader_path: Option<PathBuf>,
    shader: ShaderSource,
    status: ShaderStatus,

    frame_seconds: f32,
    uncaptured_errors: u64,
    shader_errors: u64,

    data: OverlayDrawData,
}

impl Hud {
    pub fn new(shader_path: Option<PathBuf>) -> Self {
        let mut hud = Self {
            shader_path,
            shader: ShaderSource::new(DEFAULT_SHADER),
            status: ShaderStatus::Default,
            frame_seconds: 0.0,
            uncaptured_errors: 0,
            shader_errors: 0,
            data: OverlayDrawData::default(),
        };
        if hud.shader_path.is_some() {
            hud.reload_shader();
        }
        hud
    }

    /// Re-reads the shader file; the renderer picks up the change next tick.
    fn reload_shader(&mut self) {
        let Some(path) = &self.shader_path else {
            log::info!("no shader path given; nothing to reload");
            return;
        };

        match std::fs::read_to_string(path) {
            Ok(text) => {
                log::info!("loaded shader from {}", path.display());
                self.shader.set_text(text);
                self.status = ShaderStatus::Custom;
            }
            Err(err) => {
                log::warn!("failed to read shader {}: {err}", path.display());
                self.status = ShaderStatus::LoadFailed;
            }
        }
    }

    fn status_color(&self) -> [f32; 4] {
        if self.shader_errors > 0 || self.status == ShaderStatus::LoadFailed {
            BAD
        } else if self.status == ShaderStatus::Custom {
            WARN
        } else {
            OK
        }
    }
}

impl Overlay for Hud {
    fn draw_data(&mut self, size: PhysicalSize<u32>) -> &OverlayDrawData {
        self.data.clear();

        let scale = (size.height as f32 / 720.0).clamp(0.5, 4.0);
        let pad = 8.0 * scale;
        let (x, y) = (12.0 * scale, 12.0 * scale);
        let bar_w = 160.0 * scale;
        let bar_h = 10.0 * scale;
        let square = 14.0 * scale;

        self.data.push_rect(
            x,
            y,
            bar_w + square + pad * 3.0,
            square.max(bar_h) + pad * 2.0,
            PANEL,
        );

        let bar_y = y + pad + (square - bar_h) * 0.5;
        self.data
            .push_rect(x + pad, bar_y, bar_w, bar_h, BAR_TRACK);

        let fill = (self.frame_seconds / BAR_FULL_SECONDS).clamp(0.0, 1.0);
        let fill_color = if fill < 0.5 { OK } else if fill < 1.0 { WARN } else { BAD };
        self.data
            .push_rect(x + pad, bar_y, bar_w * fill, bar_h, fill_color);

        let status = self.status_color();
        self.data
            .push_rect(x + pad * 2.0 + bar_w, y + pad, square, square, status);

        &self.data
    }

    fn take_shader_update(&mut self) -> Option<String> {
        self.shader.take_update()
    }
}

impl App for Hud {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        else {
            return AppControl::Continue;
        };

        match code {
            KeyCode::Escape => AppControl::Exit,
            KeyCode::F5 => {
                self.reload_shader();
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &FrameCtx) -> AppControl {
        self.frame_seconds = ctx.time.smoothed_dt;
        if ctx.uncaptured_errors > self.uncaptured_errors {
            log::warn!("{} uncaptured GPU errors so far", ctx.uncaptured_errors);
        }
        self.uncaptured_errors = ctx.uncaptured_errors;
        self.shader_errors = ctx.shader_errors;
        AppControl::Continue
    }

    fn overlay(&mut self) -> &mut dyn Overlay {
        self
    }
}
