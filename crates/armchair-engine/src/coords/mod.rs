//! Window-space coordinates.
//!
//! Logical pixels are DPI independent; physical pixels are what the surface and
//! depth buffer are sized in. The overlay works in physical pixels with the
//! origin top-left, +X right, +Y down.

mod viewport;

pub use viewport::Viewport;
