//! Camera and projection utilities
use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Largest pitch magnitude the camera accepts. At exactly ±90° the camera
/// basis degenerates because `front` becomes parallel to world up.
pub const PITCH_LIMIT: f64 = FRAC_PI_2 - 0.01;

/// Orthonormal camera basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub front: Vector3<f64>,
    pub right: Vector3<f64>,
    pub up: Vector3<f64>,
}

/// Front, right and up vectors for a yaw/pitch pair (radians).
///
/// Yaw 0 looks down +Z. Pitch must stay strictly inside (-π/2, π/2); at the
/// poles `right` is normalized from a zero vector and comes back NaN.
pub fn camera_vectors(yaw: f64, pitch: f64) -> CameraBasis {
    let (sin_pitch, cos_pitch) = pitch.sin_cos();
    let front = Vector3::new(cos_pitch * yaw.sin(), sin_pitch, cos_pitch * yaw.cos()).normalize();
    let right = Vector3::y().cross(&front).normalize();
    let up = front.cross(&right);
    CameraBasis { front, right, up }
}

/// View matrix with rows `[right; up; -front]` and translation `-R · eye`
pub fn view_matrix(eye: &Point3<f64>, yaw: f64, pitch: f64) -> Matrix4<f64> {
    let CameraBasis { front, right, up } = camera_vectors(yaw, pitch);
    let back = -front;
    let translation = -Vector3::new(
        right.dot(&eye.coords),
        up.dot(&eye.coords),
        back.dot(&eye.coords),
    );

    #[rustfmt::skip]
    let view = Matrix4::new(
        right.x, right.y, right.z, translation.x,
        up.x,    up.y,    up.z,    translation.y,
        back.x,  back.y,  back.z,  translation.z,
        0.0,     0.0,     0.0,     1.0,
    );
    view
}

/// OpenGL-style perspective matrix. `fov` is the vertical field of view in degrees.
pub fn projection_matrix(fov: f64, width: u32, height: u32, near: f64, far: f64) -> Matrix4<f64> {
    let focal = 1.0 / (fov.to_radians() / 2.0).tan();
    let aspect = width as f64 / height as f64;

    let mut proj = Matrix4::zeros();
    proj[(0, 0)] = focal / aspect;
    proj[(1, 1)] = focal;
    proj[(2, 2)] = (far + near) / (near - far);
    proj[(2, 3)] = 2.0 * far * near / (near - far);
    proj[(3, 2)] = -1.0;
    proj
}

/// Transform an object-space position into homogeneous clip space
pub fn transform_vertex(position: &Point3<f64>, mvp: &Matrix4<f64>) -> Vector4<f64> {
    mvp * position.to_homogeneous()
}

pub fn transform_vertices(positions: &[Point3<f64>], mvp: &Matrix4<f64>) -> Vec<Vector4<f64>> {
    positions.iter().map(|p| transform_vertex(p, mvp)).collect()
}

/// First-person camera: a position plus yaw/pitch angles in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f64>,
    pub yaw: f64,
    pitch: f64,
}

impl Camera {
    pub fn new(position: Point3<f64>, yaw: f64, pitch: f64) -> Self {
        let mut camera = Self {
            position,
            yaw,
            pitch: 0.0,
        };
        camera.set_pitch(pitch);
        camera
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Set the pitch, clamped to `±PITCH_LIMIT`
    pub fn set_pitch(&mut self, pitch: f64) {
        let clamped = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        if clamped != pitch {
            log::warn!("camera pitch {pitch:.4} clamped to {clamped:.4}");
        }
        self.pitch = clamped;
    }

    /// Rotate by delta amounts (in radians). Pitch is clamped silently so
    /// that holding a key against the limit does not flood the log.
    pub fn rotate(&mut self, dyaw: f64, dpitch: f64) {
        self.yaw += dyaw;
        self.pitch = (self.pitch + dpitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move along the camera's own axes
    pub fn translate_local(&mut self, forward: f64, right: f64, up: f64) {
        let basis = self.vectors();
        self.position += basis.front * forward + basis.right * right + basis.up * up;
    }

    pub fn vectors(&self) -> CameraBasis {
        camera_vectors(self.yaw, self.pitch)
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f64> {
        view_matrix(&self.position, self.yaw, self.pitch)
    }
}

impl Default for Camera {
    /// At the origin, looking down -Z
    fn default() -> Self {
        Self::new(Point3::origin(), PI, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(basis: &CameraBasis) {
        for v in [basis.front, basis.right, basis.up] {
            assert!((v.norm() - 1.0).abs() < 1e-6);
        }
        assert!(basis.front.dot(&basis.right).abs() < 1e-6);
        assert!(basis.front.dot(&basis.up).abs() < 1e-6);
        assert!(basis.right.dot(&basis.up).abs() < 1e-6);
    }

    #[test]
    fn test_projection_matrix() {
        let (width, height) = (800, 600);
        let proj = projection_matrix(90.0, width, height, 0.1, 100.0);
        assert!((proj[(0, 0)] - proj[(1, 1)] * (height as f64 / width as f64)).abs() < 1e-12);
        assert_eq!(proj[(3, 2)], -1.0);
        assert_eq!(proj[(3, 3)], 0.0);
        assert!((proj[(1, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_camera_vectors_orthonormal() {
        assert_orthonormal(&camera_vectors(90f64.to_radians(), 0.0));
        for yaw in [-3.0, -1.2, 0.0, 0.7, 2.9, 6.0] {
            for pitch in [-PITCH_LIMIT, -0.8, 0.0, 0.3, PITCH_LIMIT] {
                assert_orthonormal(&camera_vectors(yaw, pitch));
            }
        }
    }

    #[test]
    fn test_view_matrix_last_row() {
        let view = view_matrix(&Point3::new(0.0, 0.0, 3.0), 0.0, 0.0);
        assert_eq!(view.row(3).transpose(), Vector4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let eye = Point3::new(1.0, -2.0, 5.0);
        let view = view_matrix(&eye, 0.4, -0.2);
        let at_eye = view * eye.to_homogeneous();
        assert!(at_eye.xyz().norm() < 1e-9);
    }

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        let ahead = camera.view_matrix() * Vector4::new(0.0, 0.0, -5.0, 1.0);
        // In view space the camera looks down -Z
        assert!((ahead.z + 5.0).abs() < 1e-9);
        assert!(ahead.x.abs() < 1e-9 && ahead.y.abs() < 1e-9);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::new(Point3::origin(), 0.0, 2.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        camera.rotate(0.0, -10.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT);
        assert_orthonormal(&camera.vectors());
    }

    #[test]
    fn test_translate_local() {
        let mut camera = Camera::new(Point3::origin(), 0.0, 0.0);
        camera.translate_local(2.0, 0.0, 0.0);
        assert!((camera.position - Point3::new(0.0, 0.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn test_transform_vertex_identity() {
        let out = transform_vertices(&[Point3::new(1.0, 2.0, 3.0)], &Matrix4::identity());
        assert_eq!(out, vec![Vector4::new(1.0, 2.0, 3.0, 1.0)]);
    }
}
