//! GPU-facing records.
//!
//! Layouts here must agree with `shaders/default.wgsl`; sizes are pinned by the
//! tests at the bottom of the file.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

/// Per-vertex record: position, normal, colour.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x4  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-instance record: one column-major model matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Instance {
    pub model: [[f32; 4]; 4],
}

impl Instance {
    // A mat4 spans four vec4 attribute slots.
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Instance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    #[inline]
    pub fn from_mat4(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
        }
    }

    #[inline]
    pub fn to_mat4(self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

/// Uniform block: view-projection then the normal matrix.
///
/// WGSL lays out `mat3x3<f32>` as three 16-byte columns, hence the padded
/// `[f32; 4]` columns.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

impl Uniforms {
    pub fn new(view_proj: Mat4, normal: Mat3) -> Self {
        let col = |v: glam::Vec3| [v.x, v.y, v.z, 0.0];
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            normal: [col(normal.x_axis), col(normal.y_axis), col(normal.z_axis)],
        }
    }
}

/// Arguments of one `draw_indexed_indirect` call.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirect {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

impl DrawIndexedIndirect {
    /// Draws the whole index buffer once per instance.
    pub fn whole_mesh(index_count: u32, instance_count: u32) -> Self {
        Self {
            index_count,
            instance_count,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn record_sizes_match_shader_layout() {
        assert_eq!(size_of::<Vertex>(), 40);
        assert_eq!(size_of::<Instance>(), 64);
        assert_eq!(size_of::<Uniforms>(), 112);
        assert_eq!(size_of::<DrawIndexedIndirect>(), 20);
    }

    #[test]
    fn attribute_locations_are_disjoint() {
        let mut locations: Vec<u32> = Vertex::ATTRIBUTES
            .iter()
            .chain(Instance::ATTRIBUTES.iter())
            .map(|a| a.shader_location)
            .collect();
        locations.sort_unstable();
        assert_eq!(locations, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn instance_matrix_columns_are_contiguous() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let inst = Instance::from_mat4(m);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&inst));
        assert_eq!(&floats[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(inst.to_mat4(), m);
    }

    #[test]
    fn normal_matrix_columns_are_padded() {
        let u = Uniforms::new(Mat4::IDENTITY, Mat3::from_diagonal(glam::Vec3::new(2.0, 3.0, 4.0)));
        assert_eq!(u.normal[0], [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(u.normal[1], [0.0, 3.0, 0.0, 0.0]);
        assert_eq!(u.normal[2], [0.0, 0.0, 4.0, 0.0]);
    }
}
