//! Static scene resources and the replayable render bundle.
//!
//! Vertex, index and indirect buffers are written once here; the instance and
//! uniform buffers are allocated here but only ever written by the frame driver.
//! The instance buffer doubles as a copy source so its contents can be read back.

use wgpu::util::DeviceExt;

use super::depth::DEPTH_FORMAT;
use super::mesh::Mesh;
use super::pipeline::ScenePipeline;
use super::types::{DrawIndexedIndirect, Instance, Uniforms};

/// GPU buffers and bindings for one instanced mesh.
pub struct SceneBuffers {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
    pub instance: wgpu::Buffer,
    pub uniform: wgpu::Buffer,
    pub indirect: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    draw: DrawIndexedIndirect,
}

impl SceneBuffers {
    /// Allocates every buffer and writes the static ones.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &ScenePipeline,
        mesh: &Mesh,
        instance_count: u32,
    ) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("armchair vertex buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_bytes = mesh.index_bytes();
        let index = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("armchair index buffer"),
            size: index_bytes.len() as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&index, 0, &index_bytes);

        let instance = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("armchair instance buffer"),
            size: instance_buffer_size(instance_count),
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("armchair uniform buffer"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let draw = DrawIndexedIndirect::whole_mesh(mesh.index_count(), instance_count);
        let indirect = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("armchair indirect buffer"),
            contents: bytemuck::bytes_of(&draw),
            usage: wgpu::BufferUsages::INDIRECT,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("armchair scene bind group"),
            layout: &pipeline.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        log::debug!(
            "scene buffers: {} vertices, {} indices, {} instances",
            mesh.vertices.len(),
            draw.index_count,
            draw.instance_count
        );

        Self {
            vertex,
            index,
            instance,
            uniform,
            indirect,
            bind_group,
            draw,
        }
    }

    /// The draw arguments written to the indirect buffer.
    pub fn draw(&self) -> DrawIndexedIndirect {
        self.draw
    }

    pub fn instance_count(&self) -> u32 {
        self.draw.instance_count
    }
}

/// Bytes needed to hold `instance_count` instance records.
pub fn instance_buffer_size(instance_count: u32) -> u64 {
    (instance_count as u64 * std::mem::size_of::<Instance>() as u64).max(wgpu::COPY_BUFFER_ALIGNMENT)
}

/// Records the bindings and the single indirect draw into a bundle.
pub fn record_bundle(
    device: &wgpu::Device,
    pipeline: &ScenePipeline,
    buffers: &SceneBuffers,
) -> wgpu::RenderBundle {
    let mut encoder = device.create_render_bundle_encoder(&wgpu::RenderBundleEncoderDescriptor {
        label: Some("armchair scene bundle encoder"),
        color_formats: &[Some(pipeline.format)],
        depth_stencil: Some(wgpu::RenderBundleDepthStencil {
            format: DEPTH_FORMAT,
            depth_read_only: false,
            stencil_read_only: true,
        }),
        sample_count: 1,
        ..Default::default()
    });

    encoder.set_pipeline(&pipeline.pipeline);
    encoder.set_vertex_buffer(0, buffers.vertex.slice(..));
    encoder.set_vertex_buffer(1, buffers.instance.slice(..));
    encoder.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint16);
    encoder.set_bind_group(0, &buffers.bind_group, &[]);
    encoder.draw_indexed_indirect(&buffers.indirect, 0);

    encoder.finish(&wgpu::RenderBundleDescriptor {
        label: Some("armchair scene bundle"),
    })
}
