//! Limit negotiation.
//!
//! One generic resolver handles every limit; the direction (ceiling vs floor)
//! comes from the limit's table entry.

use std::fmt;
use std::num::TryFromIntError;

use super::error::NegotiationError;

/// Which way a limit gets "better".
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LimitKind {
    /// A ceiling: higher values give more room (e.g. `max_buffer_size`).
    Maximum,
    /// A floor: lower values give more room (the offset alignments).
    Minimum,
}

impl LimitKind {
    /// The more permissive of two values.
    fn better<T: Ord>(self, a: T, b: T) -> T {
        match self {
            LimitKind::Maximum => a.max(b),
            LimitKind::Minimum => a.min(b),
        }
    }

    /// Caps `desired` to what `available` allows.
    fn clamp<T: Ord>(self, desired: T, available: T) -> T {
        match self {
            LimitKind::Maximum => desired.min(available),
            LimitKind::Minimum => desired.max(available),
        }
    }

    /// Whether `available` is at least as permissive as `required`.
    fn satisfies<T: Ord>(self, available: T, required: T) -> bool {
        match self {
            LimitKind::Maximum => available >= required,
            LimitKind::Minimum => available <= required,
        }
    }
}

/// Resolves one limit from its `(required, desired, available)` triple.
///
/// - nothing required or desired: `Ok(None)`, the limit stays unconstrained
/// - desired only: the desire clamped to availability, or `None` if the adapter
///   does not report the limit
/// - required but unmet (or unreported): `Err`
/// - required and met: the better of `required` and the clamped desire
pub fn resolve_limit<T>(
    name: &'static str,
    kind: LimitKind,
    required: Option<T>,
    desired: Option<T>,
    available: Option<T>,
) -> Result<Option<T>, NegotiationError>
where
    T: Copy + Ord + fmt::Display + Into<u64>,
{
    match (required, desired, available) {
        (None, None, _) => Ok(None),

        (None, Some(desired), None) => {
            log::info!("desired limit {name} = {desired} unavailable, ignoring");
            Ok(None)
        }

        (None, Some(desired), Some(available)) => {
            let value = kind.clamp(desired, available);
            log::info!("desired limit {name} = {desired}, requesting {value}");
            Ok(Some(value))
        }

        (Some(required), _, None) => {
            log::error!("required limit {name} = {required} unavailable (limit undefined)");
            Err(NegotiationError::LimitUnmet {
                name,
                required: required.into(),
                available: None,
            })
        }

        (Some(required), desired, Some(available)) => {
            if !kind.satisfies(available, required) {
                log::error!(
                    "required limit {name} = {required} not met (adapter offers {available})"
                );
                return Err(NegotiationError::LimitUnmet {
                    name,
                    required: required.into(),
                    available: Some(available.into()),
                });
            }

            match desired {
                None => {
                    log::info!("required limit {name} = {required}, available");
                    Ok(Some(required))
                }
                Some(desired) => {
                    let value = kind.better(required, kind.clamp(desired, available));
                    log::info!("desired limit {name} = {desired}, requesting {value}");
                    Ok(Some(value))
                }
            }
        }
    }
}

/// Accessor pair for one field of `wgpu::Limits`.
pub struct LimitField {
    pub name: &'static str,
    pub kind: LimitKind,
    get: fn(&wgpu::Limits) -> u64,
    set: fn(&mut wgpu::Limits, u64) -> Result<(), TryFromIntError>,
}

impl LimitField {
    pub fn get(&self, limits: &wgpu::Limits) -> u64 {
        (self.get)(limits)
    }

    /// Writes `value` into the field, failing when the field's type cannot
    /// hold it.
    pub fn set(&self, limits: &mut wgpu::Limits, value: u64) -> Result<(), NegotiationError> {
        (self.set)(limits, value).map_err(|_| NegotiationError::LimitOutOfRange {
            name: self.name,
            value,
        })
    }
}

impl fmt::Debug for LimitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimitField")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// The WebGPU limits the renderer negotiates, keyed by wgpu field name.
pub const LIMIT_FIELDS: &[LimitField] = &[
    LimitField {
        name: "max_texture_dimension_1d",
        kind: LimitKind::Maximum,
        get: |l| l.max_texture_dimension_1d as u64,
        set: |l, v| {
            l.max_texture_dimension_1d = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_texture_dimension_2d",
        kind: LimitKind::Maximum,
        get: |l| l.max_texture_dimension_2d as u64,
        set: |l, v| {
            l.max_texture_dimension_2d = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_texture_dimension_3d",
        kind: LimitKind::Maximum,
        get: |l| l.max_texture_dimension_3d as u64,
        set: |l, v| {
            l.max_texture_dimension_3d = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_texture_array_layers",
        kind: LimitKind::Maximum,
        get: |l| l.max_texture_array_layers as u64,
        set: |l, v| {
            l.max_texture_array_layers = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_bind_groups",
        kind: LimitKind::Maximum,
        get: |l| l.max_bind_groups as u64,
        set: |l, v| {
            l.max_bind_groups = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_bindings_per_bind_group",
        kind: LimitKind::Maximum,
        get: |l| l.max_bindings_per_bind_group as u64,
        set: |l, v| {
            l.max_bindings_per_bind_group = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_dynamic_uniform_buffers_per_pipeline_layout",
        kind: LimitKind::Maximum,
        get: |l| l.max_dynamic_uniform_buffers_per_pipeline_layout as u64,
        set: |l, v| {
            l.max_dynamic_uniform_buffers_per_pipeline_layout = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_dynamic_storage_buffers_per_pipeline_layout",
        kind: LimitKind::Maximum,
        get: |l| l.max_dynamic_storage_buffers_per_pipeline_layout as u64,
        set: |l, v| {
            l.max_dynamic_storage_buffers_per_pipeline_layout = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_sampled_textures_per_shader_stage",
        kind: LimitKind::Maximum,
        get: |l| l.max_sampled_textures_per_shader_stage as u64,
        set: |l, v| {
            l.max_sampled_textures_per_shader_stage = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_samplers_per_shader_stage",
        kind: LimitKind::Maximum,
        get: |l| l.max_samplers_per_shader_stage as u64,
        set: |l, v| {
            l.max_samplers_per_shader_stage = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_storage_buffers_per_shader_stage",
        kind: LimitKind::Maximum,
        get: |l| l.max_storage_buffers_per_shader_stage as u64,
        set: |l, v| {
            l.max_storage_buffers_per_shader_stage = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_storage_textures_per_shader_stage",
        kind: LimitKind::Maximum,
        get: |l| l.max_storage_textures_per_shader_stage as u64,
        set: |l, v| {
            l.max_storage_textures_per_shader_stage = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_uniform_buffers_per_shader_stage",
        kind: LimitKind::Maximum,
        get: |l| l.max_uniform_buffers_per_shader_stage as u64,
        set: |l, v| {
            l.max_uniform_buffers_per_shader_stage = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_uniform_buffer_binding_size",
        kind: LimitKind::Maximum,
        get: |l| l.max_uniform_buffer_binding_size as u64,
        set: |l, v| {
            l.max_uniform_buffer_binding_size = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_storage_buffer_binding_size",
        kind: LimitKind::Maximum,
        get: |l| l.max_storage_buffer_binding_size as u64,
        set: |l, v| {
            l.max_storage_buffer_binding_size = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "min_uniform_buffer_offset_alignment",
        kind: LimitKind::Minimum,
        get: |l| l.min_uniform_buffer_offset_alignment as u64,
        set: |l, v| {
            l.min_uniform_buffer_offset_alignment = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "min_storage_buffer_offset_alignment",
        kind: LimitKind::Minimum,
        get: |l| l.min_storage_buffer_offset_alignment as u64,
        set: |l, v| {
            l.min_storage_buffer_offset_alignment = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_vertex_buffers",
        kind: LimitKind::Maximum,
        get: |l| l.max_vertex_buffers as u64,
        set: |l, v| {
            l.max_vertex_buffers = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_buffer_size",
        kind: LimitKind::Maximum,
        get: |l| l.max_buffer_size as u64,
        set: |l, v| {
            l.max_buffer_size = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_vertex_attributes",
        kind: LimitKind::Maximum,
        get: |l| l.max_vertex_attributes as u64,
        set: |l, v| {
            l.max_vertex_attributes = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_vertex_buffer_array_stride",
        kind: LimitKind::Maximum,
        get: |l| l.max_vertex_buffer_array_stride as u64,
        set: |l, v| {
            l.max_vertex_buffer_array_stride = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_color_attachments",
        kind: LimitKind::Maximum,
        get: |l| l.max_color_attachments as u64,
        set: |l, v| {
            l.max_color_attachments = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_color_attachment_bytes_per_sample",
        kind: LimitKind::Maximum,
        get: |l| l.max_color_attachment_bytes_per_sample as u64,
        set: |l, v| {
            l.max_color_attachment_bytes_per_sample = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_compute_workgroup_storage_size",
        kind: LimitKind::Maximum,
        get: |l| l.max_compute_workgroup_storage_size as u64,
        set: |l, v| {
            l.max_compute_workgroup_storage_size = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_compute_invocations_per_workgroup",
        kind: LimitKind::Maximum,
        get: |l| l.max_compute_invocations_per_workgroup as u64,
        set: |l, v| {
            l.max_compute_invocations_per_workgroup = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_compute_workgroup_size_x",
        kind: LimitKind::Maximum,
        get: |l| l.max_compute_workgroup_size_x as u64,
        set: |l, v| {
            l.max_compute_workgroup_size_x = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_compute_workgroup_size_y",
        kind: LimitKind::Maximum,
        get: |l| l.max_compute_workgroup_size_y as u64,
        set: |l, v| {
            l.max_compute_workgroup_size_y = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_compute_workgroup_size_z",
        kind: LimitKind::Maximum,
        get: |l| l.max_compute_workgroup_size_z as u64,
        set: |l, v| {
            l.max_compute_workgroup_size_z = v.try_into()?;
            Ok(())
        },
    },
    LimitField {
        name: "max_compute_workgroups_per_dimension",
        kind: LimitKind::Maximum,
        get: |l| l.max_compute_workgroups_per_dimension as u64,
        set: |l, v| {
            l.max_compute_workgroups_per_dimension = v.try_into()?;
            Ok(())
        },
    },
];

/// Looks up a limit by its wgpu field name.
pub fn limit_field(name: &str) -> Option<&'static LimitField> {
    LIMIT_FIELDS.iter().find(|f| f.name == name)
}

/// One row of the limit request table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitRequest {
    pub name: &'static str,
    pub required: Option<u64>,
    pub desired: Option<u64>,
}

/// The `(name, required, desired)` table handed to the negotiator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitRequests {
    entries: Vec<LimitRequest>,
}

impl LimitRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a hard requirement for `name`.
    pub fn require(mut self, name: &'static str, value: u64) -> Self {
        self.entry(name).required = Some(value);
        self
    }

    /// Sets a soft target for `name`.
    pub fn desire(mut self, name: &'static str, value: u64) -> Self {
        self.entry(name).desired = Some(value);
        self
    }

    pub fn entries(&self) -> &[LimitRequest] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&LimitRequest> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn entry(&mut self, name: &'static str) -> &mut LimitRequest {
        let index = match self.entries.iter().position(|e| e.name == name) {
            Some(index) => index,
            None => {
                self.entries.push(LimitRequest {
                    name,
                    required: None,
                    desired: None,
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }
}

/// Resolves every requested limit against the adapter's limits.
///
/// Unconstrained limits keep their value from `base`. Requests naming an
/// unknown limit fail before any limit is checked. A resolved value wider than
/// its `wgpu::Limits` field fails with `LimitOutOfRange`.
pub fn resolve_limits(
    requests: &LimitRequests,
    available: &wgpu::Limits,
    base: wgpu::Limits,
) -> Result<wgpu::Limits, NegotiationError> {
    if let Some(unknown) = requests
        .entries()
        .iter()
        .find(|r| limit_field(r.name).is_none())
    {
        return Err(NegotiationError::UnknownLimit(unknown.name.to_string()));
    }

    let mut resolved = base;
    for field in LIMIT_FIELDS {
        let (required, desired) = requests
            .get(field.name)
            .map_or((None, None), |r| (r.required, r.desired));

        let value = resolve_limit(
            field.name,
            field.kind,
            required,
            desired,
            Some(field.get(available)),
        )?;

        if let Some(value) = value {
            field.set(&mut resolved, value)?;
        }
    }

    Ok(resolved)
}
