use winit::dpi::{LogicalSize, PhysicalSize};
use winit::window::Window;

/// Viewport size in logical pixels plus the device pixel ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub logical: LogicalSize<f64>,
    pub scale_factor: f64,
}

impl Viewport {
    #[inline]
    pub const fn new(logical: LogicalSize<f64>, scale_factor: f64) -> Self {
        Self {
            logical,
            scale_factor,
        }
    }

    /// Viewport of a window's current inner size.
    pub fn of_window(window: &Window) -> Self {
        let scale_factor = window.scale_factor();
        Self::new(window.inner_size().to_logical(scale_factor), scale_factor)
    }

    /// Pixel dimensions: logical size times scale factor, rounded.
    pub fn pixel_size(self) -> PhysicalSize<u32> {
        let scale = if self.scale_factor.is_finite() && self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        };
        let px = |logical: f64| (logical * scale).round().max(0.0) as u32;
        PhysicalSize::new(px(self.logical.width), px(self.logical.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_size_scales_logical_size() {
        let vp = Viewport::new(LogicalSize::new(800.0, 600.0), 2.0);
        assert_eq!(vp.pixel_size(), PhysicalSize::new(1600, 1200));
    }

    #[test]
    fn fractional_scale_rounds() {
        let vp = Viewport::new(LogicalSize::new(801.0, 599.0), 1.25);
        assert_eq!(vp.pixel_size(), PhysicalSize::new(1001, 749));
    }

    #[test]
    fn minimized_viewport_has_zero_width() {
        let vp = Viewport::new(LogicalSize::new(0.0, 600.0), 1.0);
        assert_eq!(vp.pixel_size(), PhysicalSize::new(0, 600));
    }

    #[test]
    fn bogus_scale_factor_is_treated_as_one() {
        let vp = Viewport::new(LogicalSize::new(640.0, 480.0), f64::NAN);
        assert_eq!(vp.pixel_size(), PhysicalSize::new(640, 480));
    }
}
