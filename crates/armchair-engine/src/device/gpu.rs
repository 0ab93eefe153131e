use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;

use super::backend::{DeviceHealth, WgpuBackend, WgpuDevice};
use super::error::SurfaceErrorAction;
use super::features::Feature;
use super::negotiator::NegotiatedDevice;
use super::surface::{
    SurfacePrefs, SurfaceSizing, choose_alpha_mode, choose_present_mode, choose_surface_format,
    map_surface_error,
};

/// Negotiated device bound to a presentation surface.
///
/// Owns the device and queue exclusively; everything that writes GPU memory
/// goes through the references handed out here.
pub struct Gpu {
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    sizing: SurfaceSizing,
    features: Vec<Feature>,
    limits: wgpu::Limits,
    health: DeviceHealth,
}

/// A single acquired frame.
///
/// Holding the surface texture blocks acquisition of the next one; submit
/// promptly.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl Gpu {
    /// Binds a negotiated device to the backend's surface and configures it.
    ///
    /// A zero `size` defers configuration until the first non-zero resize.
    pub fn new(
        negotiated: NegotiatedDevice<WgpuBackend>,
        mut backend: WgpuBackend,
        size: PhysicalSize<u32>,
        prefs: &SurfacePrefs,
    ) -> Result<Self> {
        let surface = backend
            .take_surface()
            .context("negotiation backend has no surface")?;

        let NegotiatedDevice {
            adapter,
            device: WgpuDevice { device, queue },
            features,
            limits,
        } = negotiated;

        let caps = surface.get_capabilities(&adapter);
        log::debug!("surface formats: {:?}", caps.formats);
        log::debug!("surface present modes: {:?}", caps.present_modes);
        log::debug!("surface alpha modes: {:?}", caps.alpha_modes);

        let format = choose_surface_format(&caps, prefs.prefer_srgb);
        log::info!("surface format: {format:?}");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: choose_present_mode(&caps, prefs.present_mode),
            alpha_mode: choose_alpha_mode(&caps, prefs.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: prefs.desired_maximum_frame_latency,
        };

        let mut gpu = Gpu {
            surface,
            adapter,
            device,
            queue,
            sizing: SurfaceSizing::new(config),
            features,
            limits,
            health: backend.health(),
        };
        gpu.resize(size);
        Ok(gpu)
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.sizing.config().format
    }

    /// Current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.sizing.size()
    }

    pub fn is_configured(&self) -> bool {
        self.sizing.is_configured()
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn limits(&self) -> &wgpu::Limits {
        &self.limits
    }

    pub fn health(&self) -> &DeviceHealth {
        &self.health
    }

    /// Reconfigures the surface for `new_size`.
    ///
    /// Returns `true` when the configuration changed; zero sizes and repeats of
    /// the current size return `false`.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) -> bool {
        match self.sizing.resize(new_size) {
            Some(config) => {
                log::debug!("configuring surface at {}x{}", config.width, config.height);
                self.surface.configure(&self.device, config);
                true
            }
            None => false,
        }
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        if surface_texture.suboptimal {
            log::warn!("surface texture is suboptimal");
        }

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("armchair frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents the frame.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        log::warn!("surface acquisition failed: {err}");
        map_surface_error(&err, || {
            if let Some(config) = self.sizing.reconfigure() {
                self.surface.configure(&self.device, config);
            }
        })
    }
}
