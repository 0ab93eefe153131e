use std::fmt;
use std::time::Duration;

use super::features::Feature;
use super::negotiator::NegotiationPhase;

/// Why device negotiation ended in the `Failed` state.
///
/// All variants are fatal for the current session; the caller may rerun the
/// whole negotiation but nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// The adapter request completed without an adapter.
    AdapterUnavailable(String),
    /// A required feature is not offered by the adapter.
    MissingFeature { feature: Feature },
    /// A required limit is not met by the adapter (`available` is `None` when
    /// the adapter does not report it at all).
    LimitUnmet {
        name: &'static str,
        required: u64,
        available: Option<u64>,
    },
    /// A resolved limit does not fit the type of its `wgpu::Limits` field.
    LimitOutOfRange { name: &'static str, value: u64 },
    /// A limit request names a limit the resolver does not know.
    UnknownLimit(String),
    /// The device request completed with an error.
    DeviceRequestFailed(String),
    /// An asynchronous request did not complete in time.
    TimedOut {
        phase: NegotiationPhase,
        elapsed: Duration,
    },
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::AdapterUnavailable(reason) => {
                write!(f, "could not get a GPU adapter: {reason}")
            }
            NegotiationError::MissingFeature { feature } => {
                write!(f, "required adapter feature {feature} not available")
            }
            NegotiationError::LimitUnmet {
                name,
                required,
                available: Some(available),
            } => write!(
                f,
                "required adapter limit {name} = {required} not met (adapter offers {available})"
            ),
            NegotiationError::LimitUnmet {
                name,
                required,
                available: None,
            } => write!(
                f,
                "required adapter limit {name} = {required} not met (limit undefined)"
            ),
            NegotiationError::LimitOutOfRange { name, value } => {
                write!(f, "limit {name} = {value} is out of range")
            }
            NegotiationError::UnknownLimit(name) => write!(f, "unknown limit {name:?}"),
            NegotiationError::DeviceRequestFailed(reason) => {
                write!(f, "could not get a GPU device: {reason}")
            }
            NegotiationError::TimedOut { phase, elapsed } => write!(
                f,
                "GPU negotiation timed out in {phase:?} after {:.1}s",
                elapsed.as_secs_f32()
            ),
        }
    }
}

impl std::error::Error for NegotiationError {}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}
