use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Quat, UVec3, Vec3};

use super::types::Instance;

/// Layout of the instance grid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Grid {
    /// Cell counts along x, y and z.
    pub dims: UVec3,
    /// Distance between neighbouring cell centres.
    pub spacing: f32,
    /// Added to every cell after centring.
    pub offset: Vec3,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            dims: UVec3::new(50, 10, 50),
            spacing: 3.0,
            offset: Vec3::new(0.0, 0.0, 70.0),
        }
    }
}

impl Grid {
    pub fn cell_count(&self) -> u32 {
        self.dims.x * self.dims.y * self.dims.z
    }

    /// Byte size of one full instance upload.
    pub fn instance_bytes(&self) -> u64 {
        self.cell_count() as u64 * std::mem::size_of::<Instance>() as u64
    }

    /// Cell translation: centred on the grid, scaled by spacing, then offset.
    pub fn translation(&self, cell: UVec3) -> Vec3 {
        (cell.as_vec3() - self.dims.as_vec3() * 0.5) * self.spacing + self.offset
    }

    /// Rewrites `out` with one transform per cell, y outermost, then z, then x.
    pub fn write_instances(&self, rotation: Quat, out: &mut Vec<Instance>) {
        out.clear();
        out.reserve(self.cell_count() as usize);

        let model = Mat4::from_quat(rotation);
        for y in 0..self.dims.y {
            for z in 0..self.dims.z {
                for x in 0..self.dims.x {
                    let translation = Mat4::from_translation(self.translation(UVec3::new(x, y, z)));
                    out.push(Instance::from_mat4(translation * model));
                }
            }
        }
    }
}

/// Parses `"XxYxZ"`, e.g. `"50x10x50"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridDims(pub UVec3);

impl FromStr for GridDims {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(['x', 'X']).collect();
        let [x, y, z] = parts.as_slice() else {
            return Err(format!("grid {s:?} is not of the form XxYxZ"));
        };

        let parse = |p: &str| {
            p.trim()
                .parse::<u32>()
                .map_err(|e| format!("grid {s:?}: bad dimension {p:?}: {e}"))
        };
        let dims = UVec3::new(parse(*x)?, parse(*y)?, parse(*z)?);

        if dims.min_element() == 0 {
            return Err(format!("grid {s:?} has an empty dimension"));
        }
        dims.x
            .checked_mul(dims.y)
            .and_then(|n| n.checked_mul(dims.z))
            .ok_or_else(|| format!("grid {s:?} has too many cells"))?;

        Ok(GridDims(dims))
    }
}

impl fmt::Display for GridDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.0.x, self.0.y, self.0.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_has_25000_cells() {
        let grid = Grid::default();
        assert_eq!(grid.cell_count(), 25_000);
        assert_eq!(grid.instance_bytes(), 25_000 * 64);
    }

    #[test]
    fn cells_are_ordered_y_then_z_then_x() {
        let grid = Grid {
            dims: UVec3::new(2, 2, 2),
            spacing: 1.0,
            offset: Vec3::ZERO,
        };
        let mut out = Vec::new();
        grid.write_instances(Quat::IDENTITY, &mut out);

        let t: Vec<Vec3> = out.iter().map(|i| i.to_mat4().w_axis.truncate()).collect();
        assert_eq!(t[0], Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(t[1], Vec3::new(0.0, -1.0, -1.0)); // x fastest
        assert_eq!(t[2], Vec3::new(-1.0, -1.0, 0.0)); // then z
        assert_eq!(t[4], Vec3::new(-1.0, 0.0, -1.0)); // y slowest
    }

    #[test]
    fn translation_is_centred_and_offset() {
        let grid = Grid::default();
        assert_eq!(grid.translation(UVec3::new(25, 5, 25)), Vec3::new(0.0, 0.0, 70.0));
        assert_eq!(grid.translation(UVec3::ZERO), Vec3::new(-75.0, -15.0, -5.0));
    }

    #[test]
    fn rotation_is_applied_before_translation() {
        let grid = Grid {
            dims: UVec3::ONE,
            spacing: 1.0,
            offset: Vec3::new(0.0, 0.0, 10.0),
        };
        let mut out = Vec::new();
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        grid.write_instances(rotation, &mut out);

        let m = out[0].to_mat4();
        // The translation column is unaffected by the rotation.
        let t = m.w_axis.truncate();
        assert!((t - Vec3::new(-0.5, -0.5, 9.5)).length() < 1e-6);
        assert!((m.transform_vector3(Vec3::X) - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn rewriting_reuses_the_buffer() {
        let grid = Grid {
            dims: UVec3::new(3, 1, 2),
            ..Grid::default()
        };
        let mut out = Vec::new();
        grid.write_instances(Quat::IDENTITY, &mut out);
        grid.write_instances(Quat::from_rotation_y(1.0), &mut out);
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn grid_dims_parse() {
        assert_eq!("50x10x50".parse(), Ok(GridDims(UVec3::new(50, 10, 50))));
        assert_eq!(" 2X3x4 ".parse(), Ok(GridDims(UVec3::new(2, 3, 4))));
        assert!("50x10".parse::<GridDims>().is_err());
        assert!("0x1x1".parse::<GridDims>().is_err());
        assert!("ax1x1".parse::<GridDims>().is_err());
        assert!("65536x65536x2".parse::<GridDims>().is_err());
    }
}
