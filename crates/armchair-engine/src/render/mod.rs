//! GPU rendering subsystem.
//!
//! Resource building, scene assembly and the per-frame driver for the instanced
//! cube grid, plus the overlay drawn on top of it.
//!
//! Convention:
//! - scene geometry is right-handed, depth maps to `0..1`
//! - overlay geometry is in physical pixels, top-left origin

mod camera;
mod depth;
mod frame;
mod grid;
mod mesh;
mod overlay;
mod pipeline;
mod renderer;
mod scene;
mod types;

pub use camera::{Camera, FovMode, Projection, frustum};
pub use depth::{DEPTH_FORMAT, DepthTarget};
pub use frame::FrameDriver;
pub use grid::{Grid, GridDims};
pub use mesh::{Mesh, padded_bytes};
pub use overlay::{Overlay, OverlayDrawData, OverlayRenderer, OverlayVertex, ShaderSource};
pub use pipeline::{DEFAULT_SHADER, ScenePipeline, scene_blend, scene_depth_stencil};
pub use renderer::{FrameOutcome, Renderer};
pub use scene::{SceneBuffers, instance_buffer_size, record_bundle};
pub use types::{DrawIndexedIndirect, Instance, Uniforms, Vertex};
