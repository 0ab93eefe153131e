//! Armchair engine crate.
//!
//! Owns the GPU negotiation, scene assembly and per-frame rendering core, plus
//! the `winit` runtime that hosts it.

pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
