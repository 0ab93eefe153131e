//! The two asynchronous GPU requests behind a trait.
//!
//! `WgpuBackend` talks to real hardware; tests drive the negotiator through
//! their own implementation with scripted futures.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{Context, Result};
use winit::window::Window;

use super::features::Feature;

/// Boxed single-shot request future.
pub type GpuFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// Capabilities reported by an adapter.
pub trait AdapterCaps {
    fn features(&self) -> wgpu::Features;
    fn limits(&self) -> wgpu::Limits;

    /// One-line description for logs.
    fn summary(&self) -> String {
        String::from("unnamed adapter")
    }
}

impl AdapterCaps for wgpu::Adapter {
    fn features(&self) -> wgpu::Features {
        wgpu::Adapter::features(self)
    }

    fn limits(&self) -> wgpu::Limits {
        wgpu::Adapter::limits(self)
    }

    fn summary(&self) -> String {
        let info = self.get_info();
        format!(
            "{} ({:?}, driver {} {})",
            info.name, info.backend, info.driver, info.driver_info
        )
    }
}

/// Resolved contract passed with the device request.
#[derive(Debug, Clone)]
pub struct DeviceRequest {
    pub label: &'static str,
    pub features: Vec<Feature>,
    pub limits: wgpu::Limits,
}

/// Source of adapters and devices.
pub trait GpuBackend {
    type Adapter: AdapterCaps;
    type Device;

    /// Issues the adapter request.
    fn request_adapter(
        &mut self,
        power_preference: wgpu::PowerPreference,
    ) -> GpuFuture<Result<Self::Adapter, String>>;

    /// Issues the device request against an acquired adapter.
    fn request_device(
        &mut self,
        adapter: &Self::Adapter,
        request: &DeviceRequest,
    ) -> GpuFuture<Result<Self::Device, String>>;

    /// Called once when the device arrives, before negotiation reports success.
    fn device_acquired(&mut self, device: &Self::Device) {
        let _ = device;
    }
}

/// Device-lost flag and uncaptured-error counter shared with the GPU callbacks.
#[derive(Debug, Clone, Default)]
pub struct DeviceHealth {
    lost: Arc<AtomicBool>,
    uncaptured_errors: Arc<AtomicU64>,
}

impl DeviceHealth {
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    pub fn uncaptured_errors(&self) -> u64 {
        self.uncaptured_errors.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_lost(&self) {
        self.lost.store(true, Ordering::Release);
    }

    pub(crate) fn count_error(&self) -> u64 {
        self.uncaptured_errors.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Logical device plus its queue.
#[derive(Debug, Clone)]
pub struct WgpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

/// The wgpu implementation of [`GpuBackend`].
pub struct WgpuBackend {
    instance: wgpu::Instance,
    surface: Option<wgpu::Surface<'static>>,
    health: DeviceHealth,
}

impl WgpuBackend {
    /// Backend with a surface bound to `window`; adapters must be able to present to it.
    pub fn for_window(window: Arc<Window>) -> Result<Self> {
        let instance = Self::create_instance();
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        Ok(Self {
            instance,
            surface: Some(surface),
            health: DeviceHealth::default(),
        })
    }

    /// Backend without a surface, for offscreen use and capability probing.
    pub fn headless() -> Self {
        Self {
            instance: Self::create_instance(),
            surface: None,
            health: DeviceHealth::default(),
        }
    }

    fn create_instance() -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    }

    pub fn health(&self) -> DeviceHealth {
        self.health.clone()
    }

    /// Hands out the surface for configuration; leaves the backend headless.
    pub fn take_surface(&mut self) -> Option<wgpu::Surface<'static>> {
        self.surface.take()
    }
}

impl GpuBackend for WgpuBackend {
    type Adapter = wgpu::Adapter;
    type Device = WgpuDevice;

    fn request_adapter(
        &mut self,
        power_preference: wgpu::PowerPreference,
    ) -> GpuFuture<Result<wgpu::Adapter, String>> {
        let pending = self.instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: self.surface.as_ref(),
            force_fallback_adapter: false,
        });

        Box::pin(async move { pending.await.map_err(|e| e.to_string()) })
    }

    fn request_device(
        &mut self,
        adapter: &wgpu::Adapter,
        request: &DeviceRequest,
    ) -> GpuFuture<Result<WgpuDevice, String>> {
        let pending = adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some(request.label),
            required_features: Feature::flags_of(&request.features),
            required_limits: request.limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        });

        Box::pin(async move {
            pending
                .await
                .map(|(device, queue)| WgpuDevice { device, queue })
                .map_err(|e| e.to_string())
        })
    }

    fn device_acquired(&mut self, acquired: &WgpuDevice) {
        let device = &acquired.device;

        for feature in Feature::set_from(device.features()) {
            log::debug!("device feature: {feature}");
        }
        log::debug!("device limits: {:?}", device.limits());

        let health = self.health.clone();
        device.on_uncaptured_error(Arc::new(move |error: wgpu::Error| {
            let count = health.count_error();
            log::error!("uncaptured GPU error #{count}: {error}");
        }));

        let health = self.health.clone();
        device.set_device_lost_callback(move |reason, message| {
            health.mark_lost();
            log::error!("GPU device lost ({reason:?}): {message}");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_is_shared_between_clones() {
        let health = DeviceHealth::default();
        let handle = health.clone();

        assert!(!handle.is_lost());
        health.mark_lost();
        assert!(handle.is_lost());

        assert_eq!(health.count_error(), 1);
        assert_eq!(health.count_error(), 2);
        assert_eq!(handle.uncaptured_errors(), 2);
    }
}
