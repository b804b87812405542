//! Position/rotation/scale transforms and their matrix form
use std::f64::consts::FRAC_PI_2;
use std::ops::Mul;

use nalgebra::{Matrix4, Vector3};

use crate::error::{RenderError, Result};

/// Component-wise tolerance used by transform equality
pub const TRANSFORM_EPSILON: f64 = 1e-6;

/// How far `|R[2,0]|` may sit below 1 and still be treated as gimbal lock
const GIMBAL_EPSILON: f64 = 4.0 * f64::EPSILON;

/// An affine transform made of a translation, Euler rotation and per-axis scale.
///
/// `rotation` holds `(x, y, z)` angles in radians. The matrix applies them as
/// `Rz · Ry · Rx`, so a vertex is rotated about X first, then Y, then Z.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vector3<f64>,
    pub rotation: Vector3<f64>,
    pub scale: Vector3<f64>,
}

impl Transform {
    pub fn new(position: Vector3<f64>, rotation: Vector3<f64>, scale: Vector3<f64>) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::repeat(1.0),
        }
    }

    /// Build a transform from untyped component slices.
    ///
    /// Each slice must hold exactly three values; the check happens here, at
    /// construction, so a `Transform` value is always well formed.
    pub fn from_slices(position: &[f64], rotation: &[f64], scale: &[f64]) -> Result<Self> {
        Ok(Self {
            position: vector3("position", position)?,
            rotation: vector3("rotation", rotation)?,
            scale: vector3("scale", scale)?,
        })
    }

    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::identity()
        }
    }

    pub fn from_rotation(x: f64, y: f64, z: f64) -> Self {
        Self {
            rotation: Vector3::new(x, y, z),
            ..Self::identity()
        }
    }

    pub fn from_scale(x: f64, y: f64, z: f64) -> Self {
        Self {
            scale: Vector3::new(x, y, z),
            ..Self::identity()
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.rotation += Vector3::new(dx, dy, dz);
    }

    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.position += Vector3::new(dx, dy, dz);
    }

    /// The 4x4 matrix `T · Rz · Ry · Rx · S`
    pub fn matrix(&self) -> Matrix4<f64> {
        Self::translation_matrix(&self.position)
            * Self::rotation_matrix(&self.rotation)
            * Self::scale_matrix(&self.scale)
    }

    /// Decompose an affine matrix back into position, rotation and scale.
    ///
    /// Scale is the norm of each column of the upper 3x3 block, so negative
    /// scales come back as positive ones with a compensating rotation. When
    /// the Y angle sits at ±90° the X and Z angles are not independent; the
    /// Z angle is pinned to zero and the whole roll is folded into X.
    pub fn from_matrix(m: &Matrix4<f64>) -> Self {
        let column = |c: usize| Vector3::new(m[(0, c)], m[(1, c)], m[(2, c)]);
        let scale = Vector3::new(column(0).norm(), column(1).norm(), column(2).norm());
        let r = |row: usize, col: usize| m[(row, col)] / scale[col];

        let r20 = r(2, 0);
        let rotation = if 1.0 - r20.abs() > GIMBAL_EPSILON {
            let y = -r20.asin();
            let cos_y = y.cos();
            let x = (r(2, 1) / cos_y).atan2(r(2, 2) / cos_y);
            let z = (r(1, 0) / cos_y).atan2(r(0, 0) / cos_y);
            Vector3::new(x, y, z)
        } else if r20 < 0.0 {
            Vector3::new(r(0, 1).atan2(r(0, 2)), FRAC_PI_2, 0.0)
        } else {
            Vector3::new((-r(0, 1)).atan2(-r(0, 2)), -FRAC_PI_2, 0.0)
        };

        Self {
            position: Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]),
            rotation,
            scale,
        }
    }

    /// Apply `other` inside `self`: the result maps a point through `other` first.
    ///
    /// Not commutative.
    pub fn compose(&self, other: &Transform) -> Transform {
        Self::from_matrix(&(self.matrix() * other.matrix()))
    }

    pub fn approx_eq(&self, other: &Transform, epsilon: f64) -> bool {
        let close = |a: &Vector3<f64>, b: &Vector3<f64>| {
            a.iter()
                .zip(b.iter())
                .all(|(a, b)| (a - b).abs() <= epsilon * (1.0 + b.abs()))
        };
        close(&self.position, &other.position)
            && close(&self.rotation, &other.rotation)
            && close(&self.scale, &other.scale)
    }

    /// Create a rotation matrix from Euler angles, applied in order X, Y, Z
    pub fn rotation_matrix(rotation: &Vector3<f64>) -> Matrix4<f64> {
        let (sx, cx) = rotation.x.sin_cos();
        let (sy, cy) = rotation.y.sin_cos();
        let (sz, cz) = rotation.z.sin_cos();

        #[rustfmt::skip]
        let rx = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, cx,  -sx, 0.0,
            0.0, sx,  cx,  0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let ry = Matrix4::new(
            cy,  0.0, sy,  0.0,
            0.0, 1.0, 0.0, 0.0,
            -sy, 0.0, cy,  0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let rz = Matrix4::new(
            cz,  -sz, 0.0, 0.0,
            sz,  cz,  0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rz * ry * rx
    }

    pub fn translation_matrix(position: &Vector3<f64>) -> Matrix4<f64> {
        Matrix4::new_translation(position)
    }

    pub fn scale_matrix(scale: &Vector3<f64>) -> Matrix4<f64> {
        Matrix4::new_nonuniform_scaling(scale)
    }

    /// `projection · view · model`: object space straight to clip space
    pub fn mvp_matrix(
        model: &Matrix4<f64>,
        view: &Matrix4<f64>,
        projection: &Matrix4<f64>,
    ) -> Matrix4<f64> {
        projection * view * model
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other, TRANSFORM_EPSILON)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}

impl<'a> Mul<&'a Transform> for &'a Transform {
    type Output = Transform;

    fn mul(self, rhs: &'a Transform) -> Transform {
        self.compose(rhs)
    }
}

fn vector3(field: &'static str, values: &[f64]) -> Result<Vector3<f64>> {
    match values {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(RenderError::Shape {
            field,
            expected: 3,
            found: values.len(),
        }),
    }
}
