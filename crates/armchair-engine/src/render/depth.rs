use winit::dpi::PhysicalSize;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Depth attachment that follows the surface size.
pub struct DepthTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTarget {
    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>) -> Self {
        let texture = device.create_texture(&descriptor(size));
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Size of the live texture; never zero.
    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.texture.width(), self.texture.height())
    }

    /// Recreates the texture if `size` differs; zero sizes are ignored.
    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) -> bool {
        if size.width == 0 || size.height == 0 || size == self.size() {
            return false;
        }
        *self = Self::new(device, size);
        true
    }
}

fn clamp_size(size: PhysicalSize<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width.max(1), size.height.max(1))
}

/// Texture descriptor for a depth buffer of `size` pixels.
pub fn descriptor(size: PhysicalSize<u32>) -> wgpu::TextureDescriptor<'static> {
    let size = clamp_size(size);
    wgpu::TextureDescriptor {
        label: Some("armchair depth texture"),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use winit::dpi::LogicalSize;

    #[test]
    fn depth_texture_matches_scaled_viewport() {
        let size = Viewport::new(LogicalSize::new(800.0, 600.0), 2.0).pixel_size();
        let desc = descriptor(size);
        assert_eq!(desc.size.width, 1600);
        assert_eq!(desc.size.height, 1200);
        assert_eq!(desc.format, wgpu::TextureFormat::Depth24Plus);
    }

    #[test]
    fn zero_size_is_clamped_for_creation() {
        let desc = descriptor(PhysicalSize::new(0, 0));
        assert_eq!((desc.size.width, desc.size.height), (1, 1));
    }
}
