//! Engine configuration.
//!
//! Plain structs with sensible defaults; the demo tweaks a few fields and hands
//! the whole thing to the runtime.

use anyhow::{Context, Result};
use glam::Vec2;

use crate::device::{NegotiationRequest, SurfacePrefs};
use crate::render::{Camera, FovMode, Grid, GridDims, Projection};

/// Environment variable overriding the grid dimensions (`XxYxZ`).
pub const GRID_ENV: &str = "ARMCHAIR_GRID";

/// Environment variable overriding the FOV mode.
pub const FOV_ENV: &str = "ARMCHAIR_FOV";

/// What is drawn and how it moves.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub grid: Grid,
    pub camera: Camera,
    pub projection: Projection,

    /// Rotation added to the horizontal angle every tick, in radians.
    pub spin_per_tick: f32,

    /// Radians of rotation per pixel of pointer drag.
    pub drag_sensitivity: Vec2,

    pub clear_color: wgpu::Color,

    /// Half the edge length of each instanced cube.
    pub cube_half_extent: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            camera: Camera::default(),
            projection: Projection::default(),
            spin_per_tick: 0.01,
            drag_sensitivity: Vec2::splat(0.005),
            clear_color: wgpu::Color {
                r: 0.0,
                g: 0.5,
                b: 0.5,
                a: 1.0,
            },
            cube_half_extent: 1.0,
        }
    }
}

impl SceneConfig {
    pub fn instance_count(&self) -> u32 {
        self.grid.cell_count()
    }

    /// Applies `ARMCHAIR_GRID` and `ARMCHAIR_FOV` from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; unset keys leave fields untouched.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(GRID_ENV) {
            let GridDims(dims) = raw
                .parse::<GridDims>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid {GRID_ENV}"))?;
            log::info!("grid overridden to {}", GridDims(dims));
            self.grid.dims = dims;
        }

        if let Some(raw) = lookup(FOV_ENV) {
            let mode = raw
                .parse::<FovMode>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid {FOV_ENV}"))?;
            log::info!("FOV mode overridden to {mode:?}");
            self.projection.mode = mode;
        }

        Ok(())
    }
}

/// Everything the runtime needs to bring up a renderer.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub negotiation: NegotiationRequest,
    pub surface: SurfacePrefs,
    pub scene: SceneConfig,
}

impl EngineConfig {
    /// Config whose limit requests are sized for `scene`.
    pub fn for_scene(scene: SceneConfig) -> Self {
        Self {
            negotiation: NegotiationRequest::for_instances(scene.instance_count()),
            surface: SurfacePrefs::default(),
            scene,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_scene(SceneConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    #[test]
    fn overrides_replace_grid_and_fov() {
        let mut scene = SceneConfig::default();
        scene
            .apply_overrides(|key| match key {
                GRID_ENV => Some("4x2x3".into()),
                FOV_ENV => Some("vertical".into()),
                _ => None,
            })
            .unwrap();

        assert_eq!(scene.grid.dims, UVec3::new(4, 2, 3));
        assert_eq!(scene.projection.mode, FovMode::Vertical);
        assert_eq!(scene.instance_count(), 24);
    }

    #[test]
    fn missing_overrides_keep_defaults() {
        let mut scene = SceneConfig::default();
        scene.apply_overrides(|_| None).unwrap();
        assert_eq!(scene.instance_count(), 25_000);
        assert_eq!(scene.projection.mode, FovMode::Diagonal);
    }

    #[test]
    fn bad_override_names_the_variable() {
        let mut scene = SceneConfig::default();
        let err = scene
            .apply_overrides(|key| (key == GRID_ENV).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(format!("{err:#}").contains(GRID_ENV));
        assert_eq!(scene.instance_count(), 25_000);
    }

    #[test]
    fn engine_limits_follow_the_grid() {
        let mut scene = SceneConfig::default();
        scene.grid.dims = UVec3::new(10, 10, 10);
        let config = EngineConfig::for_scene(scene);

        let max_buffer = config
            .negotiation
            .limits
            .get("max_buffer_size")
            .and_then(|r| r.required);
        assert_eq!(max_buffer, Some(1000 * 64));
    }
}
