//! Bind-group layout and render pipeline for the instanced scene.

use super::depth::DEPTH_FORMAT;
use super::types::{Instance, Uniforms, Vertex};

/// Embedded default scene shader.
pub const DEFAULT_SHADER: &str = include_str!("shaders/default.wgsl");

pub fn uniform_binding_size() -> Option<wgpu::BufferSize> {
    wgpu::BufferSize::new(std::mem::size_of::<Uniforms>() as u64)
}

/// Layout entry for the uniform block: binding 0, vertex stage.
pub fn uniform_layout_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: uniform_binding_size(),
        },
        count: None,
    }
}

/// Straight alpha for colour; alpha keeps the destination.
pub fn scene_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::Zero,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

pub fn scene_depth_stencil() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn scene_primitive() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: Some(wgpu::Face::Back),
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

/// Scene pipeline plus the layout its bind group is created against.
pub struct ScenePipeline {
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub pipeline: wgpu::RenderPipeline,
    pub format: wgpu::TextureFormat,
}

impl ScenePipeline {
    /// Builds layout and pipeline from WGSL `source`.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, source: &str) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("armchair scene bgl"),
            entries: &[uniform_layout_entry()],
        });
        let pipeline = Self::create_pipeline(device, &bind_group_layout, format, source);

        Self {
            bind_group_layout,
            pipeline,
            format,
        }
    }

    /// Replaces the pipeline with one built from `source`, keeping the layout.
    pub fn rebuild(&mut self, device: &wgpu::Device, source: &str) {
        self.pipeline = Self::create_pipeline(device, &self.bind_group_layout, self.format, source);
    }

    fn create_pipeline(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        source: &str,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("armchair scene shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("armchair scene pipeline layout"),
            bind_group_layouts: &[bind_group_layout],
            immediate_size: 0,
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("armchair scene pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout(), Instance::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(scene_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: scene_primitive(),
            depth_stencil: Some(scene_depth_stencil()),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_binding_matches_record() {
        let entry = uniform_layout_entry();
        assert_eq!(entry.binding, 0);
        assert_eq!(entry.visibility, wgpu::ShaderStages::VERTEX);
        match entry.ty {
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                min_binding_size,
                ..
            } => assert_eq!(min_binding_size.map(|s| s.get()), Some(112)),
            other => panic!("unexpected binding type {other:?}"),
        }
    }

    #[test]
    fn vertex_layouts_step_per_vertex_then_per_instance() {
        let vertex = Vertex::layout();
        let instance = Instance::layout();
        assert_eq!(vertex.array_stride, 40);
        assert_eq!(vertex.step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(instance.array_stride, 64);
        assert_eq!(instance.step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn depth_writes_with_less_compare() {
        let depth = scene_depth_stencil();
        assert_eq!(depth.format, wgpu::TextureFormat::Depth24Plus);
        assert!(depth.depth_write_enabled);
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Less);
        assert_eq!(scene_primitive().cull_mode, Some(wgpu::Face::Back));
    }

    #[test]
    fn default_shader_declares_all_locations() {
        for loc in 0..7 {
            assert!(DEFAULT_SHADER.contains(&format!("@location({loc})")));
        }
        assert!(DEFAULT_SHADER.contains("fn vs_main"));
        assert!(DEFAULT_SHADER.contains("fn fs_main"));
    }
}
