//! Immediate-mode overlay drawn on top of the scene in the same pass.
//!
//! Overlays hand over finished triangle lists in physical pixels (top-left
//! origin, +Y down); the renderer converts to NDC in the vertex shader.

use bytemuck::{Pod, Zeroable};
use winit::dpi::PhysicalSize;

use super::depth::DEPTH_FORMAT;

/// Overlay vertex: pixel position and straight-alpha colour.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

impl OverlayVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x4  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Finished overlay geometry for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayDrawData {
    pub vertices: Vec<OverlayVertex>,
    pub indices: Vec<u16>,
}

impl OverlayDrawData {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Appends an axis-aligned rectangle. Empty rectangles and rectangles that
    /// would overflow 16-bit indices are dropped.
    pub fn push_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
        if w <= 0.0 || h <= 0.0 || self.vertices.len() + 4 > u16::MAX as usize + 1 {
            return;
        }

        let base = self.vertices.len() as u16;
        for pos in [[x, y], [x + w, y], [x + w, y + h], [x, y + h]] {
            self.vertices.push(OverlayVertex { pos, color });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// GUI collaborator polled once per tick.
pub trait Overlay {
    /// Builds this frame's draw data for a target of `size` pixels.
    fn draw_data(&mut self, size: PhysicalSize<u32>) -> &OverlayDrawData;

    /// New scene shader text, if the user edited it since the last call.
    fn take_shader_update(&mut self) -> Option<String> {
        None
    }
}

/// Shader text with an "updated" flag.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    text: String,
    updated: bool,
}

impl ShaderSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            updated: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the text; flags an update only if it actually changed.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.updated = true;
        }
    }

    /// Returns the text once per change.
    pub fn take_update(&mut self) -> Option<String> {
        std::mem::take(&mut self.updated).then(|| self.text.clone())
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    viewport: [f32; 2],
    _pad: [f32; 2],
}

/// Draws [`OverlayDrawData`] into an already-open render pass.
#[derive(Default)]
pub struct OverlayRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    viewport_ubo: Option<wgpu::Buffer>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
    ibo: Option<wgpu::Buffer>,
    ibo_capacity: usize,

    index_count: u32,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads `data`; must run before the pass that calls [`draw`](Self::draw).
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        data: &OverlayDrawData,
    ) {
        self.index_count = 0;
        if data.is_empty() {
            return;
        }

        self.ensure_pipeline(device, format);
        self.ensure_bindings(device);
        self.ensure_capacity(device, data.vertices.len(), data.indices.len());

        let (Some(ubo), Some(vbo), Some(ibo)) = (
            self.viewport_ubo.as_ref(),
            self.vbo.as_ref(),
            self.ibo.as_ref(),
        ) else {
            return;
        };

        let u = ViewportUniform {
            viewport: [size.width.max(1) as f32, size.height.max(1) as f32],
            _pad: [0.0; 2],
        };
        queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
        queue.write_buffer(vbo, 0, bytemuck::cast_slice(&data.vertices));
        queue.write_buffer(ibo, 0, &super::mesh::padded_bytes(bytemuck::cast_slice(&data.indices)));

        self.index_count = data.indices.len() as u32;
    }

    /// Draws what the last [`prepare`](Self::prepare) uploaded.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        let (Some(pipeline), Some(bind_group), Some(vbo), Some(ibo)) = (
            self.pipeline.as_ref(),
            self.bind_group.as_ref(),
            self.vbo.as_ref(),
            self.ibo.as_ref(),
        ) else {
            return;
        };

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, vbo.slice(..));
        pass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("armchair overlay shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("armchair overlay bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ViewportUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("armchair overlay pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("armchair overlay pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[OverlayVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // Shares the scene pass, so it must match the depth attachment.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
        self.viewport_ubo = None;
    }

    fn ensure_bindings(&mut self, device: &wgpu::Device) {
        if self.bind_group.is_some() && self.viewport_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("armchair overlay viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("armchair overlay bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        self.viewport_ubo = Some(viewport_ubo);
        self.bind_group = Some(bind_group);
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, vertices: usize, indices: usize) {
        if vertices > self.vbo_capacity || self.vbo.is_none() {
            let cap = grown_capacity(vertices);
            self.vbo = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("armchair overlay vbo"),
                size: (cap * std::mem::size_of::<OverlayVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vbo_capacity = cap;
        }

        if indices > self.ibo_capacity || self.ibo.is_none() {
            let cap = grown_capacity(indices);
            self.ibo = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("armchair overlay ibo"),
                size: (cap * std::mem::size_of::<u16>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.ibo_capacity = cap;
        }
    }
}

/// Power-of-two element capacity, at least 256.
fn grown_capacity(required: usize) -> usize {
    required.next_power_of_two().max(256)
}
