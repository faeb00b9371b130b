use glam::{Mat4, Vec3};

/// Perspective camera aimed at a fixed target.
///
/// The hero scene never moves its camera; only the aspect ratio follows the
/// surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov_y_deg: 40.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(6.0, 0.0, 18.0),
            target: Vec3::new(2.0, 0.0, 0.0),
        }
    }
}

impl PerspectiveCamera {
    /// Update the aspect from a surface size. Returns `false` and keeps the
    /// old aspect when either side is zero.
    pub fn set_aspect(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.aspect = width as f32 / height as f32;
        true
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
