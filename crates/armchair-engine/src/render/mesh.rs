use glam::Vec3;

use super::types::Vertex;

/// Indexed triangle mesh in CPU memory.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// Axis-aligned cube centred on the origin, one colour per face.
    ///
    /// Faces carry their own vertices so normals stay flat; triangles wind
    /// counter-clockwise seen from outside.
    pub fn cube(half_extent: f32) -> Self {
        // (normal, u, v, colour) with u x v == normal
        let faces: [(Vec3, Vec3, Vec3, [f32; 4]); 6] = [
            (Vec3::X, Vec3::Y, Vec3::Z, [0.90, 0.30, 0.25, 1.0]),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y, [0.25, 0.75, 0.90, 1.0]),
            (Vec3::Y, Vec3::Z, Vec3::X, [0.95, 0.85, 0.30, 1.0]),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z, [0.55, 0.35, 0.80, 1.0]),
            (Vec3::Z, Vec3::X, Vec3::Y, [0.35, 0.85, 0.40, 1.0]),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X, [0.95, 0.55, 0.20, 1.0]),
        ];

        let mut mesh = Mesh {
            vertices: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
        };

        for (normal, u, v, color) in faces {
            let base = mesh.vertices.len() as u16;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (normal + u * su + v * sv) * half_extent;
                mesh.vertices.push(Vertex {
                    position: p.to_array(),
                    normal: normal.to_array(),
                    color,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Index bytes padded to the copy alignment `queue.write_buffer` requires.
    pub fn index_bytes(&self) -> Vec<u8> {
        padded_bytes(bytemuck::cast_slice(&self.indices))
    }
}

/// Copies `bytes`, zero-padded up to a multiple of `wgpu::COPY_BUFFER_ALIGNMENT`.
pub fn padded_bytes(bytes: &[u8]) -> Vec<u8> {
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    let padded_len = bytes.len().div_ceil(align) * align;
    let mut out = Vec::with_capacity(padded_len);
    out.extend_from_slice(bytes);
    out.resize(padded_len, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_flat_faces() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));
    }

    #[test]
    fn triangles_wind_outward() {
        let cube = Mesh::cube(0.5);
        for tri in cube.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| {
                let v = cube.vertices[i as usize];
                (Vec3::from_array(v.position), Vec3::from_array(v.normal))
            });
            let face_normal = (b.0 - a.0).cross(c.0 - a.0).normalize();
            assert!(face_normal.dot(a.1) > 0.99, "triangle {tri:?} winds inward");
        }
    }

    #[test]
    fn odd_index_count_is_padded() {
        let mesh = Mesh {
            vertices: vec![],
            indices: vec![0, 1, 2],
        };
        let bytes = mesh.index_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[6..], &[0, 0]);
    }
}
