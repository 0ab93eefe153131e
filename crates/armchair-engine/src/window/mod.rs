//! Window + runtime loop.
//!
//! Owns the `winit` event loop and window, negotiates the GPU device without
//! blocking the loop, and drives one renderer tick per redraw.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
