use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};

/// Turns left-button pointer drags into a rotation delta.
///
/// Movement is accumulated in physical pixels between ticks and handed out
/// once per tick by [`take_rotation`](Self::take_rotation).
#[derive(Debug, Clone)]
pub struct DragTracker {
    /// Radians per pixel, per axis.
    sensitivity: Vec2,
    dragging: bool,
    last_pos: Option<Vec2>,
    pending: Vec2,
}

impl DragTracker {
    pub fn new(sensitivity: Vec2) -> Self {
        Self {
            sensitivity,
            dragging: false,
            last_pos: None,
            pending: Vec2::ZERO,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Feeds a window event; returns `true` if it was pointer input.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.set_pressed(*state == ElementState::Pressed);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_moved(Vec2::new(position.x as f32, position.y as f32));
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_pos = None;
                true
            }
            // Releasing outside the window never reaches us.
            WindowEvent::Focused(false) => {
                self.set_pressed(false);
                false
            }
            _ => false,
        }
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.dragging = pressed;
    }

    pub fn pointer_moved(&mut self, pos: Vec2) {
        if let (true, Some(last)) = (self.dragging, self.last_pos) {
            self.pending += pos - last;
        }
        self.last_pos = Some(pos);
    }

    /// Rotation accumulated since the last call: x spins, y pitches.
    pub fn take_rotation(&mut self) -> Vec2 {
        std::mem::take(&mut self.pending) * self.sensitivity
    }
}

impl Default for DragTracker {
    fn default() -> Self {
        Self::new(Vec2::splat(0.005))
    }
}
