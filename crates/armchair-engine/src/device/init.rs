use std::time::Duration;

use super::features::FeatureRequests;
use super::limits::LimitRequests;
use crate::render::{Instance, Uniforms, Vertex};

/// Default time budget for the adapter + device handshake.
pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Parameters for device negotiation.
#[derive(Debug, Clone)]
pub struct NegotiationRequest {
    /// Hint passed with the adapter request.
    pub power_preference: wgpu::PowerPreference,

    /// Features that must (or should) be enabled on the device.
    pub features: FeatureRequests,

    /// `(name, required, desired)` limit table.
    pub limits: LimitRequests,

    /// Limits used for anything the table leaves unconstrained.
    pub base_limits: wgpu::Limits,

    /// Negotiation fails once this much time passes with a request pending.
    pub timeout: Duration,
}

impl NegotiationRequest {
    /// Renderer defaults sized for `instance_count` instances.
    pub fn for_instances(instance_count: u32) -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            features: FeatureRequests::renderer_defaults(),
            limits: renderer_limits(instance_count),
            base_limits: wgpu::Limits::default(),
            timeout: DEFAULT_NEGOTIATION_TIMEOUT,
        }
    }

    /// No feature or limit demands at all; useful for capability probing.
    pub fn permissive() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            features: FeatureRequests::default(),
            limits: LimitRequests::new(),
            base_limits: wgpu::Limits::downlevel_defaults(),
            timeout: DEFAULT_NEGOTIATION_TIMEOUT,
        }
    }
}

impl Default for NegotiationRequest {
    fn default() -> Self {
        Self::for_instances(crate::config::SceneConfig::default().instance_count())
    }
}

/// Limits the instanced renderer depends on.
///
/// Record sizes come from the GPU record types so the table cannot drift from
/// the pipeline layout.
pub fn renderer_limits(instance_count: u32) -> LimitRequests {
    let instance_bytes = instance_count as u64 * std::mem::size_of::<Instance>() as u64;
    let stride = std::mem::size_of::<Instance>().max(std::mem::size_of::<Vertex>()) as u64;
    let attributes = (Vertex::ATTRIBUTES.len() + Instance::ATTRIBUTES.len()) as u64;

    LimitRequests::new()
        .require("max_texture_dimension_2d", 3840)
        .desire("max_texture_dimension_2d", 8192)
        .require("max_texture_array_layers", 1)
        .require("max_bind_groups", 1)
        .require("max_uniform_buffers_per_shader_stage", 1)
        .require(
            "max_uniform_buffer_binding_size",
            std::mem::size_of::<Uniforms>() as u64,
        )
        .require("max_vertex_buffers", 2)
        .require("max_vertex_attributes", attributes)
        .require("max_vertex_buffer_array_stride", stride)
        .require("max_buffer_size", instance_bytes)
}
