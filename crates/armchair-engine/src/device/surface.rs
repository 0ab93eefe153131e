use winit::dpi::PhysicalSize;

use super::error::SurfaceErrorAction;

/// Presentation preferences.
#[derive(Debug, Clone)]
pub struct SurfacePrefs {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    pub present_mode: wgpu::PresentMode,

    /// Used when the surface supports it; otherwise the first supported mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for SurfacePrefs {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Picks the surface format, sRGB first when preferred.
///
/// Surfaces that report no formats get `Bgra8Unorm`, the format every WebGPU
/// implementation can present.
pub fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> wgpu::TextureFormat {
    if prefer_srgb && let Some(srgb) = caps.formats.iter().copied().find(|f| f.is_srgb()) {
        return srgb;
    }

    caps.formats
        .first()
        .copied()
        .unwrap_or(wgpu::TextureFormat::Bgra8Unorm)
}

pub fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

pub fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    if caps.present_modes.is_empty() || caps.present_modes.contains(&requested) {
        requested
    } else {
        wgpu::PresentMode::Fifo
    }
}

/// Surface configuration plus the size it was last applied at.
///
/// Sizing decisions live here, apart from the wgpu surface, so resize behavior
/// can be checked without a device.
#[derive(Debug, Clone)]
pub struct SurfaceSizing {
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    configured: bool,
}

impl SurfaceSizing {
    pub fn new(config: wgpu::SurfaceConfiguration) -> Self {
        Self {
            size: PhysicalSize::new(config.width, config.height),
            config,
            configured: false,
        }
    }

    pub fn config(&self) -> &wgpu::SurfaceConfiguration {
        &self.config
    }

    /// Current drawable size (physical pixels); may be zero while minimized.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Records a new size and returns the configuration to apply, if any.
    ///
    /// A zero-sized target defers configuration. Repeating the current size
    /// returns `None` once the surface is configured.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) -> Option<&wgpu::SurfaceConfiguration> {
        if new_size.width == 0 || new_size.height == 0 {
            self.size = new_size;
            return None;
        }

        if self.configured && new_size == self.size {
            return None;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.configured = true;
        Some(&self.config)
    }

    /// Configuration to re-apply after the surface was lost or outdated.
    pub fn reconfigure(&self) -> Option<&wgpu::SurfaceConfiguration> {
        (self.size.width > 0 && self.size.height > 0).then_some(&self.config)
    }
}

/// Maps an acquisition error to the action the frame loop takes.
///
/// `reconfigure` runs for lost/outdated surfaces.
pub fn map_surface_error(
    err: &wgpu::SurfaceError,
    reconfigure: impl FnOnce(),
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            reconfigure();
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}
