use winit::event::WindowEvent;

use super::ctx::FrameCtx;
use crate::render::Overlay;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the demo (or any other host).
pub trait App {
    /// Called for window events after the runtime has processed them.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per tick while the renderer is up, before drawing.
    fn on_frame(&mut self, ctx: &FrameCtx) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }

    /// Overlay drawn on top of the scene.
    fn overlay(&mut self) -> &mut dyn Overlay;
}
