//! Pointer input consumed by the renderer.

mod drag;

pub use drag::DragTracker;
