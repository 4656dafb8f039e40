use cgmath::{Matrix4, Point3, Rad, Vector3};

use crate::params::CameraParams;

// cgmath builds OpenGL clip space, z in [-1, 1]. wgpu expects z in [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Fixed look-at camera. Only the aspect ratio changes, when the window does.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: Rad<f32>,
    pub near: f32,
    pub far: f32,

    // The size of the user's window output.
    pub screen_size: (u32, u32),
}

impl Camera {
    pub fn from_params(params: &CameraParams, screen_size: (u32, u32)) -> Self {
        Camera {
            eye: params.eye.into(),
            target: params.target.into(),
            up: params.up.into(),
            fov: Rad(params.fov_radians),
            near: params.near,
            far: params.far,
            screen_size,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen_size = (width, height);
    }

    pub fn aspect(&self) -> f32 {
        if self.screen_size.1 == 0 {
            return 1.0;
        }
        self.screen_size.0 as f32 / self.screen_size.1 as f32
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fov, self.aspect(), self.near, self.far)
    }

    pub fn modelview_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{EuclideanSpace, Vector4};

    fn to_ndc(camera: &Camera, point: Point3<f32>) -> Vector3<f32> {
        let clip: Vector4<f32> =
            camera.projection_matrix() * camera.modelview_matrix() * point.to_homogeneous();
        clip.truncate() / clip.w
    }

    #[test]
    fn target_is_centred() {
        let camera = Camera::from_params(&CameraParams::default(), (800, 600));
        let ndc = to_ndc(&camera, Point3::origin());
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn up_is_up() {
        let camera = Camera::from_params(&CameraParams::default(), (800, 600));
        let ndc = to_ndc(&camera, Point3::new(0.0, 1.0, 0.0));
        assert!(ndc.y > 0.0);
        assert!(ndc.x.abs() < 1e-5);
    }

    #[test]
    fn resize_changes_aspect_only() {
        let mut camera = Camera::from_params(&CameraParams::default(), (800, 600));
        let view = camera.modelview_matrix();
        let before = to_ndc(&camera, Point3::new(1.0, 0.0, -1.0));
        camera.resize(1600, 600);
        assert_eq!(camera.modelview_matrix(), view);
        let after = to_ndc(&camera, Point3::new(1.0, 0.0, -1.0));
        assert!((after.x * 2.0 - before.x).abs() < 1e-4);
        assert!((after.y - before.y).abs() < 1e-4);
    }

    #[test]
    fn zero_height_is_square() {
        let camera = Camera::from_params(&CameraParams::default(), (800, 0));
        assert_eq!(camera.aspect(), 1.0);
    }
}
