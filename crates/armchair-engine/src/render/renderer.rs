use anyhow::Result;
use glam::Vec2;
use winit::dpi::PhysicalSize;

use super::depth::DepthTarget;
use super::frame::FrameDriver;
use super::mesh::Mesh;
use super::overlay::{Overlay, OverlayRenderer};
use super::pipeline::{DEFAULT_SHADER, ScenePipeline};
use super::scene::{SceneBuffers, record_bundle};
use crate::config::SceneConfig;
use crate::device::{Gpu, SurfaceErrorAction};

/// What happened to one tick.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented,
    /// Nothing drawn this tick (minimized window or transient surface error).
    Skipped,
}

/// The configured renderer: device, surface-sized targets and scene resources.
pub struct Renderer {
    gpu: Gpu,
    depth: DepthTarget,
    pipeline: ScenePipeline,
    buffers: SceneBuffers,
    bundle: wgpu::RenderBundle,
    driver: FrameDriver,
    overlay: OverlayRenderer,
    shader_source: String,
    /// Uncaptured-error count when the active shader was accepted.
    shader_errors_baseline: u64,
}

impl Renderer {
    /// Builds every resource against a ready device. Runs once per negotiation.
    pub fn configure(gpu: Gpu, scene: &SceneConfig) -> Self {
        let device = gpu.device();
        let format = gpu.surface_format();

        let depth = DepthTarget::new(device, gpu.size());
        let pipeline = ScenePipeline::new(device, format, DEFAULT_SHADER);
        let mesh = Mesh::cube(scene.cube_half_extent);
        let buffers = SceneBuffers::new(
            device,
            gpu.queue(),
            &pipeline,
            &mesh,
            scene.instance_count(),
        );
        let bundle = record_bundle(device, &pipeline, &buffers);

        log::info!(
            "renderer configured: {} instances, {:?} surface",
            buffers.instance_count(),
            format
        );

        Self {
            depth,
            pipeline,
            buffers,
            bundle,
            driver: FrameDriver::new(scene),
            overlay: OverlayRenderer::new(),
            shader_source: DEFAULT_SHADER.to_string(),
            shader_errors_baseline: gpu.health().uncaptured_errors(),
            gpu,
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    pub fn shader_source(&self) -> &str {
        &self.shader_source
    }

    /// Uncaptured GPU errors raised since the active shader was accepted.
    pub fn shader_errors(&self) -> u64 {
        errors_since(self.gpu.health().uncaptured_errors(), self.shader_errors_baseline)
    }

    /// Resizes surface and depth buffer together; the pipeline is untouched.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if self.gpu.resize(size) {
            self.depth.resize(self.gpu.device(), size);
            log::debug!("resized to {}x{}", size.width, size.height);
        }
    }

    /// Rebuilds the scene pipeline from new WGSL and re-records the bundle.
    ///
    /// Source that fails validation leaves the previous pipeline in place.
    pub fn rebuild_shader(&mut self, source: &str) -> bool {
        let health = self.gpu.health().clone();
        let errors_before = health.uncaptured_errors();

        let mut candidate = ScenePipeline {
            bind_group_layout: self.pipeline.bind_group_layout.clone(),
            pipeline: self.pipeline.pipeline.clone(),
            format: self.pipeline.format,
        };
        candidate.rebuild(self.gpu.device(), source);

        if health.uncaptured_errors() != errors_before {
            log::warn!("shader update rejected; keeping the previous pipeline");
            return false;
        }

        self.bundle = record_bundle(self.gpu.device(), &candidate, &self.buffers);
        self.pipeline = candidate;
        self.shader_source = source.to_string();
        self.shader_errors_baseline = health.uncaptured_errors();
        log::info!("scene shader rebuilt");
        true
    }

    /// Runs one tick: animate, upload, encode, submit.
    pub fn render(&mut self, drag: Vec2, overlay: &mut dyn Overlay) -> Result<FrameOutcome> {
        if let Some(source) = overlay.take_shader_update() {
            self.rebuild_shader(&source);
        }

        let size = self.gpu.size();
        if !self.gpu.is_configured() || size.width == 0 || size.height == 0 {
            return Ok(FrameOutcome::Skipped);
        }

        self.driver.update(drag, size);
        self.driver.upload(self.gpu.queue(), &self.buffers);

        let data = overlay.draw_data(size);
        self.overlay.prepare(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            size,
            data,
        );

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => {
                        anyhow::bail!("surface acquisition failed fatally (out of memory)")
                    }
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        Ok(FrameOutcome::Skipped)
                    }
                };
            }
        };

        self.driver.encode(
            &mut frame.encoder,
            &frame.view,
            self.depth.view(),
            &self.bundle,
            &self.overlay,
        );
        self.gpu.submit(frame);

        Ok(FrameOutcome::Presented)
    }
}

fn errors_since(total: u64, baseline: u64) -> u64 {
    total.saturating_sub(baseline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_shader_resets_error_count() {
        // One rejected shader raised two errors, then a good one was accepted.
        let baseline = 2;
        assert_eq!(errors_since(2, baseline), 0);
        assert_eq!(errors_since(3, baseline), 1);
    }

    #[test]
    fn error_count_never_underflows() {
        assert_eq!(errors_since(0, 5), 0);
    }
}
