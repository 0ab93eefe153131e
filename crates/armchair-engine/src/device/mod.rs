//! GPU device negotiation and surface management.
//!
//! This module is responsible for:
//! - negotiating an adapter and device against feature/limit requests
//! - configuring the presentation surface and following resizes
//! - acquiring frames and providing encoders/views for rendering

mod backend;
mod error;
mod features;
mod gpu;
mod init;
mod limits;
mod negotiator;
mod surface;

pub use backend::{
    AdapterCaps, DeviceHealth, DeviceRequest, GpuBackend, GpuFuture, WgpuBackend, WgpuDevice,
};
pub use error::{NegotiationError, SurfaceErrorAction};
pub use features::{Feature, FeatureRequests, resolve_features};
pub use gpu::{Gpu, GpuFrame};
pub use init::{DEFAULT_NEGOTIATION_TIMEOUT, NegotiationRequest, renderer_limits};
pub use limits::{
    LIMIT_FIELDS, LimitField, LimitKind, LimitRequest, LimitRequests, limit_field, resolve_limit,
    resolve_limits,
};
pub use negotiator::{NegotiatedDevice, NegotiationPhase, Negotiator};
pub use surface::{
    SurfacePrefs, SurfaceSizing, choose_alpha_mode, choose_present_mode, choose_surface_format,
    map_surface_error,
};
