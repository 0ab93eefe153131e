use std::str::FromStr;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Which viewport extent the field-of-view angle spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FovMode {
    Horizontal,
    Vertical,
    Diagonal,
}

impl FromStr for FovMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "h" => Ok(FovMode::Horizontal),
            "vertical" | "v" => Ok(FovMode::Vertical),
            "diagonal" | "d" => Ok(FovMode::Diagonal),
            other => Err(format!(
                "unknown FOV mode {other:?} (expected horizontal, vertical or diagonal)"
            )),
        }
    }
}

/// Perspective projection parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub fov_degrees: f32,
    pub mode: FovMode,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_degrees: 110.0,
            mode: FovMode::Diagonal,
            near: 1.0,
            far: 100_000.0,
        }
    }
}

impl Projection {
    /// Projection matrix for a viewport of `size` pixels.
    pub fn matrix(&self, size: Vec2) -> Mat4 {
        let size = size.max(Vec2::ONE);
        let half_angle = (self.fov_degrees.to_radians() * 0.5).tan() * self.near;

        let (right, top) = match self.mode {
            FovMode::Horizontal => (half_angle, half_angle * size.y / size.x),
            FovMode::Vertical => (half_angle * size.x / size.y, half_angle),
            FovMode::Diagonal => {
                let diagonal = size.length();
                (half_angle * size.x / diagonal, half_angle * size.y / diagonal)
            }
        };

        frustum(-right, right, -top, top, self.near, self.far)
    }
}

/// Right-handed off-centre frustum mapping depth to `0..1`.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = near - far;

    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            far / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, near * far / depth, 0.0),
    )
}

/// Orbiting camera looking at the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    /// Eye position before the pitch rotation is applied.
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, -25.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl Camera {
    /// View matrix with the eye rotated about the X axis by `pitch` radians.
    pub fn view(&self, pitch: f32) -> Mat4 {
        let eye = Quat::from_rotation_x(pitch) * self.position;
        Mat4::look_at_rh(eye, self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(m: Mat4, p: Vec3) -> Vec3 {
        let clip = m * p.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn frustum_maps_near_and_far_to_unit_depth() {
        let m = frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0);
        assert!(project(m, Vec3::new(0.0, 0.0, -1.0)).z.abs() < 1e-6);
        assert!((project(m, Vec3::new(0.0, 0.0, -100.0)).z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn frustum_edges_map_to_ndc_edges() {
        let m = frustum(-2.0, 2.0, -1.0, 1.0, 1.0, 10.0);
        let p = project(m, Vec3::new(2.0, 1.0, -1.0));
        assert!((p.x - 1.0).abs() < 1e-6 && (p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn diagonal_mode_spans_the_viewport_diagonal() {
        let proj = Projection {
            fov_degrees: 90.0,
            mode: FovMode::Diagonal,
            near: 1.0,
            far: 10.0,
        };
        let size = Vec2::new(300.0, 400.0);
        let m = proj.matrix(size);
        // tan(45°) = 1 at the near plane splits 3:4 along the diagonal.
        let corner = project(m, Vec3::new(0.6, 0.8, -1.0));
        assert!((corner.x - 1.0).abs() < 1e-5);
        assert!((corner.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn horizontal_and_vertical_modes_fix_one_axis() {
        let size = Vec2::new(1600.0, 800.0);
        let h = Projection {
            mode: FovMode::Horizontal,
            fov_degrees: 90.0,
            ..Projection::default()
        }
        .matrix(size);
        let v = Projection {
            mode: FovMode::Vertical,
            fov_degrees: 90.0,
            ..Projection::default()
        }
        .matrix(size);

        assert!((h.x_axis.x - 1.0).abs() < 1e-6);
        assert!((h.y_axis.y - 2.0).abs() < 1e-6);
        assert!((v.y_axis.y - 1.0).abs() < 1e-6);
        assert!((v.x_axis.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fov_mode_parses_case_insensitively() {
        assert_eq!("Vertical".parse::<FovMode>(), Ok(FovMode::Vertical));
        assert_eq!("d".parse::<FovMode>(), Ok(FovMode::Diagonal));
        assert!("sideways".parse::<FovMode>().is_err());
    }

    #[test]
    fn camera_looks_at_origin() {
        let view = Camera::default().view(0.0);
        let origin_in_view = view.transform_point3(Vec3::ZERO);
        assert!(origin_in_view.x.abs() < 1e-5);
        assert!(origin_in_view.z < 0.0);
    }
}
