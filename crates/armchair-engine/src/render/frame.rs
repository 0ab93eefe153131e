//! Per-tick animation, uploads and pass encoding.

use glam::{Mat3, Quat, Vec2};
use winit::dpi::PhysicalSize;

use super::camera::{Camera, Projection};
use super::grid::Grid;
use super::overlay::OverlayRenderer;
use super::scene::SceneBuffers;
use super::types::{Instance, Uniforms};
use crate::config::SceneConfig;

/// Owns the animation state and the CPU copies of the dynamic buffers.
pub struct FrameDriver {
    grid: Grid,
    camera: Camera,
    projection: Projection,
    spin_per_tick: f32,
    clear_color: wgpu::Color,

    /// x: spin about Y (model), y: pitch about X (camera).
    angles: Vec2,
    instances: Vec<Instance>,
    uniforms: Uniforms,
}

impl FrameDriver {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            grid: config.grid,
            camera: config.camera,
            projection: config.projection,
            spin_per_tick: config.spin_per_tick,
            clear_color: config.clear_color,
            angles: Vec2::ZERO,
            instances: Vec::with_capacity(config.grid.cell_count() as usize),
            uniforms: Uniforms::new(glam::Mat4::IDENTITY, Mat3::IDENTITY),
        }
    }

    pub fn angles(&self) -> Vec2 {
        self.angles
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    /// Advances the animation by one tick and recomputes every transform.
    ///
    /// `drag` is the rotation (radians) accumulated from pointer input since
    /// the previous tick.
    pub fn update(&mut self, drag: Vec2, size: PhysicalSize<u32>) {
        self.angles += drag;
        self.angles.x += self.spin_per_tick;

        let rotation = Quat::from_rotation_y(self.angles.x);
        let view = self.camera.view(self.angles.y);
        let proj = self
            .projection
            .matrix(Vec2::new(size.width as f32, size.height as f32));

        self.uniforms = Uniforms::new(proj * view, Mat3::from_quat(rotation));
        self.grid.write_instances(rotation, &mut self.instances);
    }

    /// Writes the instance and uniform buffers in full.
    pub fn upload(&self, queue: &wgpu::Queue, buffers: &SceneBuffers) {
        debug_assert_eq!(self.instances.len(), buffers.instance_count() as usize);
        queue.write_buffer(&buffers.instance, 0, bytemuck::cast_slice(&self.instances));
        queue.write_buffer(&buffers.uniform, 0, bytemuck::bytes_of(&self.uniforms));
    }

    /// Encodes the scene pass: clear, replay the bundle, then the overlay.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        bundle: &wgpu::RenderBundle,
        overlay: &OverlayRenderer,
    ) {
        encoder.push_debug_group("armchair frame");
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("armchair scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.execute_bundles(std::iter::once(bundle));
            overlay.draw(&mut pass);
        }
        encoder.pop_debug_group();
        encoder.insert_debug_marker("armchair frame encoded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> PhysicalSize<u32> {
        PhysicalSize::new(1600, 1200)
    }

    #[test]
    fn default_scene_uploads_25000_instances() {
        let mut driver = FrameDriver::new(&SceneConfig::default());
        driver.update(Vec2::ZERO, size());

        let bytes: &[u8] = bytemuck::cast_slice(driver.instances());
        assert_eq!(driver.instances().len(), 25_000);
        assert_eq!(bytes.len(), 25_000 * std::mem::size_of::<Instance>());
    }

    #[test]
    fn instance_bytes_read_back_in_order() {
        let mut driver = FrameDriver::new(&SceneConfig::default());
        driver.update(Vec2::new(0.3, -0.2), size());

        let bytes: Vec<u8> = bytemuck::cast_slice(driver.instances()).to_vec();
        let read_back: &[Instance] = bytemuck::cast_slice(&bytes);
        assert_eq!(read_back, driver.instances());

        let grid = Grid::default();
        let first = read_back[0].to_mat4().w_axis.truncate();
        let last = read_back[read_back.len() - 1].to_mat4().w_axis.truncate();
        assert_eq!(first, grid.translation(glam::UVec3::ZERO));
        assert_eq!(last, grid.translation(grid.dims - glam::UVec3::ONE));
    }

    #[test]
    fn spin_and_drag_accumulate() {
        let mut driver = FrameDriver::new(&SceneConfig::default());
        driver.update(Vec2::ZERO, size());
        driver.update(Vec2::new(0.5, 0.25), size());

        let angles = driver.angles();
        assert!((angles.x - 0.52).abs() < 1e-6);
        assert!((angles.y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn normal_matrix_follows_model_rotation() {
        let mut driver = FrameDriver::new(&SceneConfig::default());
        driver.update(Vec2::new(std::f32::consts::FRAC_PI_2 - 0.01, 0.0), size());

        // Spin totals a quarter turn: +X maps to -Z.
        let n = driver.uniforms().normal;
        assert!(n[0][0].abs() < 1e-5);
        assert!((n[0][2] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn grid_centre_projects_near_screen_centre() {
        let mut config = SceneConfig::default();
        config.spin_per_tick = 0.0;
        let mut driver = FrameDriver::new(&config);
        driver.update(Vec2::ZERO, size());

        let view_proj = glam::Mat4::from_cols_array_2d(&driver.uniforms().view_proj);
        let clip = view_proj * config.grid.offset.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1.0 && (0.0..1.0).contains(&ndc.z));
    }
}
