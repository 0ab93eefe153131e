use std::collections::BTreeSet;
use std::fmt;

use super::error::NegotiationError;

/// Optional GPU capabilities the renderer knows how to ask for.
///
/// Each variant maps onto exactly one `wgpu::Features` flag and prints with its
/// WebGPU name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Feature {
    DepthClipControl,
    Depth32FloatStencil8,
    TimestampQuery,
    TextureCompressionBc,
    TextureCompressionEtc2,
    TextureCompressionAstc,
    IndirectFirstInstance,
    ShaderF16,
    Rg11b10UfloatRenderable,
    Bgra8UnormStorage,
    Float32Filterable,
}

impl Feature {
    pub const ALL: [Feature; 11] = [
        Feature::DepthClipControl,
        Feature::Depth32FloatStencil8,
        Feature::TimestampQuery,
        Feature::TextureCompressionBc,
        Feature::TextureCompressionEtc2,
        Feature::TextureCompressionAstc,
        Feature::IndirectFirstInstance,
        Feature::ShaderF16,
        Feature::Rg11b10UfloatRenderable,
        Feature::Bgra8UnormStorage,
        Feature::Float32Filterable,
    ];

    /// The wgpu flag for this feature.
    pub fn flag(self) -> wgpu::Features {
        match self {
            Feature::DepthClipControl => wgpu::Features::DEPTH_CLIP_CONTROL,
            Feature::Depth32FloatStencil8 => wgpu::Features::DEPTH32FLOAT_STENCIL8,
            Feature::TimestampQuery => wgpu::Features::TIMESTAMP_QUERY,
            Feature::TextureCompressionBc => wgpu::Features::TEXTURE_COMPRESSION_BC,
            Feature::TextureCompressionEtc2 => wgpu::Features::TEXTURE_COMPRESSION_ETC2,
            Feature::TextureCompressionAstc => wgpu::Features::TEXTURE_COMPRESSION_ASTC,
            Feature::IndirectFirstInstance => wgpu::Features::INDIRECT_FIRST_INSTANCE,
            Feature::ShaderF16 => wgpu::Features::SHADER_F16,
            Feature::Rg11b10UfloatRenderable => wgpu::Features::RG11B10UFLOAT_RENDERABLE,
            Feature::Bgra8UnormStorage => wgpu::Features::BGRA8UNORM_STORAGE,
            Feature::Float32Filterable => wgpu::Features::FLOAT32_FILTERABLE,
        }
    }

    /// WebGPU spelling of the feature name.
    pub fn name(self) -> &'static str {
        match self {
            Feature::DepthClipControl => "depth-clip-control",
            Feature::Depth32FloatStencil8 => "depth32float-stencil8",
            Feature::TimestampQuery => "timestamp-query",
            Feature::TextureCompressionBc => "texture-compression-bc",
            Feature::TextureCompressionEtc2 => "texture-compression-etc2",
            Feature::TextureCompressionAstc => "texture-compression-astc",
            Feature::IndirectFirstInstance => "indirect-first-instance",
            Feature::ShaderF16 => "shader-f16",
            Feature::Rg11b10UfloatRenderable => "rg11b10ufloat-renderable",
            Feature::Bgra8UnormStorage => "bgra8unorm-storage",
            Feature::Float32Filterable => "float32-filterable",
        }
    }

    /// Enumerates the known features present in a wgpu feature set.
    pub fn set_from(features: wgpu::Features) -> BTreeSet<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| features.contains(f.flag()))
            .collect()
    }

    /// Folds a feature list back into the wgpu flag set.
    pub fn flags_of(features: &[Feature]) -> wgpu::Features {
        features
            .iter()
            .fold(wgpu::Features::empty(), |acc, f| acc | f.flag())
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Required and desired feature lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRequests {
    pub required: Vec<Feature>,
    pub desired: Vec<Feature>,
}

impl FeatureRequests {
    /// Features the renderer asks for out of the box.
    ///
    /// Timestamp queries are only required in debug builds, where GPU timing is
    /// worth failing over.
    pub fn renderer_defaults() -> Self {
        let mut required = vec![Feature::Depth32FloatStencil8];
        if cfg!(debug_assertions) {
            required.push(Feature::TimestampQuery);
        }
        required.push(Feature::TextureCompressionBc);
        required.push(Feature::IndirectFirstInstance);

        Self {
            required,
            desired: vec![Feature::ShaderF16, Feature::Float32Filterable],
        }
    }
}

/// Checks feature requests against what the adapter offers.
///
/// Returns the list to request from the device: every required feature, then
/// every available desired feature, each at most once. A missing required
/// feature fails the whole negotiation.
pub fn resolve_features(
    available: &BTreeSet<Feature>,
    requests: &FeatureRequests,
) -> Result<Vec<Feature>, NegotiationError> {
    let mut resolved: Vec<Feature> = Vec::new();

    for &feature in &requests.required {
        if !available.contains(&feature) {
            log::error!("required adapter feature {feature} unavailable, cannot continue");
            return Err(NegotiationError::MissingFeature { feature });
        }
        log::info!("required adapter feature {feature} requested");
        if !resolved.contains(&feature) {
            resolved.push(feature);
        }
    }

    for &feature in &requests.desired {
        if !available.contains(&feature) {
            log::info!("desired adapter feature {feature} unavailable, continuing without it");
            continue;
        }
        if resolved.contains(&feature) {
            continue;
        }
        log::info!("desired adapter feature {feature} requested");
        resolved.push(feature);
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(features: &[Feature]) -> BTreeSet<Feature> {
        features.iter().copied().collect()
    }

    #[test]
    fn required_then_desired_order() {
        let available = set(&[
            Feature::ShaderF16,
            Feature::IndirectFirstInstance,
            Feature::Depth32FloatStencil8,
        ]);
        let requests = FeatureRequests {
            required: vec![Feature::IndirectFirstInstance, Feature::Depth32FloatStencil8],
            desired: vec![Feature::ShaderF16],
        };
        let resolved = resolve_features(&available, &requests).unwrap();
        assert_eq!(
            resolved,
            vec![
                Feature::IndirectFirstInstance,
                Feature::Depth32FloatStencil8,
                Feature::ShaderF16,
            ]
        );
    }

    #[test]
    fn missing_desired_feature_is_skipped() {
        let available = set(&[Feature::IndirectFirstInstance]);
        let requests = FeatureRequests {
            required: vec![Feature::IndirectFirstInstance],
            desired: vec![Feature::Float32Filterable],
        };
        let resolved = resolve_features(&available, &requests).unwrap();
        assert_eq!(resolved, vec![Feature::IndirectFirstInstance]);
    }

    #[test]
    fn missing_required_feature_names_it() {
        let available = set(&[Feature::ShaderF16, Feature::Float32Filterable]);
        let requests = FeatureRequests {
            required: vec![Feature::TextureCompressionBc],
            desired: vec![],
        };
        let err = resolve_features(&available, &requests).unwrap_err();
        assert_eq!(
            err,
            NegotiationError::MissingFeature {
                feature: Feature::TextureCompressionBc
            }
        );
        assert!(err.to_string().contains("texture-compression-bc"));
    }

    #[test]
    fn duplicate_desire_is_not_requested_twice() {
        let available = set(&[Feature::ShaderF16]);
        let requests = FeatureRequests {
            required: vec![Feature::ShaderF16],
            desired: vec![Feature::ShaderF16],
        };
        assert_eq!(
            resolve_features(&available, &requests).unwrap(),
            vec![Feature::ShaderF16]
        );
    }

    #[test]
    fn set_from_flags_round_trips_known_features() {
        let flags = Feature::flags_of(&[Feature::ShaderF16, Feature::TimestampQuery]);
        assert_eq!(
            Feature::set_from(flags),
            set(&[Feature::TimestampQuery, Feature::ShaderF16])
        );
    }
}
