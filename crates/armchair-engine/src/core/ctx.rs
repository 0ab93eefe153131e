use winit::dpi::PhysicalSize;

use crate::device::NegotiationPhase;
use crate::render::FrameOutcome;
use crate::time::FrameTime;

/// Per-tick information handed to [`App::on_frame`](super::App::on_frame).
#[derive(Debug, Copy, Clone)]
pub struct FrameCtx {
    pub time: FrameTime,
    /// Surface size in physical pixels.
    pub size: PhysicalSize<u32>,
    /// Outcome of the previous tick, `None` on the first one.
    pub last_outcome: Option<FrameOutcome>,
    pub phase: NegotiationPhase,
    /// Uncaptured GPU errors seen so far this session.
    pub uncaptured_errors: u64,
    /// Uncaptured GPU errors since the active scene shader was accepted.
    pub shader_errors: u64,
}
