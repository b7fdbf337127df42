//! Spatial primitives shared by every layer.
//!
//! [`Vec3`] is the scene-space vector used for fingertips, palms and vertex
//! positions.  [`Mat3`] carries rotations (pivot orientation, grab rotation)
//! and converts to and from XYZ Euler angles.  [`Quaternion`] carries the
//! head-mounted display orientation.
//!
//! # Example
//!
//! ```rust
//! use plastey_types::math::Vec3;
//!
//! let a = Vec3::new(1.0, 0.0, 0.0);
//! let b = Vec3::new(0.0, 1.0, 0.0);
//! assert_eq!(a.cross(b), Vec3::new(0.0, 0.0, 1.0));
//! assert_eq!(Vec3::zero().normalize(), Vec3::zero());
//! ```

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector in scene or tracker space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction.  A zero-length vector normalizes to
    /// the zero vector.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::zero()
        } else {
            self * (1.0 / len)
        }
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    pub fn midpoint(self, other: Self) -> Self {
        (self + other) * 0.5
    }

    /// Component-wise approximate equality, for tests and threshold checks.
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Mat3
// ────────────────────────────────────────────────────────────────────────────

/// Row-major 3×3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub rows: [[f32; 3]; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat3 {
    pub const fn new(rows: [[f32; 3]; 3]) -> Self {
        Self { rows }
    }

    pub const fn identity() -> Self {
        Self::new([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Skew-symmetric cross-product matrix: `skew(v) * w == v × w`.
    pub fn skew(v: Vec3) -> Self {
        Self::new([[0.0, -v.z, v.y], [v.z, 0.0, -v.x], [-v.y, v.x, 0.0]])
    }

    pub fn add(&self, rhs: &Self) -> Self {
        let mut out = *self;
        for (r, row) in out.rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell += rhs.rows[r][c];
            }
        }
        out
    }

    pub fn scale(&self, factor: f32) -> Self {
        let mut out = *self;
        for cell in out.rows.iter_mut().flatten() {
            *cell *= factor;
        }
        out
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[r][k] * rhs.rows[k][c]).sum();
            }
        }
        Self::new(out)
    }

    pub fn mul_vec(&self, v: Vec3) -> Vec3 {
        let [a, b, c] = self.rows;
        Vec3::new(
            a[0] * v.x + a[1] * v.y + a[2] * v.z,
            b[0] * v.x + b[1] * v.y + b[2] * v.z,
            c[0] * v.x + c[1] * v.y + c[2] * v.z,
        )
    }

    /// Transpose, which is the inverse for a pure rotation.
    pub fn transpose(&self) -> Self {
        let m = self.rows;
        Self::new([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    /// Rotation from XYZ Euler angles (radians), applied X first, then Y,
    /// then Z: `R = Rz · Ry · Rx`.
    pub fn from_euler(euler: Vec3) -> Self {
        let (sx, cx) = euler.x.sin_cos();
        let (sy, cy) = euler.y.sin_cos();
        let (sz, cz) = euler.z.sin_cos();
        Self::new([
            [cz * cy, cz * sy * sx - sz * cx, cz * sy * cx + sz * sx],
            [sz * cy, sz * sy * sx + cz * cx, sz * sy * cx - cz * sx],
            [-sy, cy * sx, cy * cx],
        ])
    }

    /// XYZ Euler angles of a rotation matrix; inverse of [`Mat3::from_euler`].
    ///
    /// At gimbal lock (|pitch| = 90°) the X angle is pinned to zero.
    pub fn to_euler(&self) -> Vec3 {
        let m = self.rows;
        let y = (-m[2][0]).clamp(-1.0, 1.0).asin();
        if y.cos().abs() > 1e-6 {
            Vec3::new(m[2][1].atan2(m[2][2]), y, m[1][0].atan2(m[0][0]))
        } else {
            Vec3::new(0.0, y, (-m[0][1]).atan2(m[1][1]))
        }
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.rows
            .iter()
            .flatten()
            .zip(other.rows.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion (w, x, y, z convention) for head-pose orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle` radians around `axis` (normalized internally).
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Hamilton product: `self` applied after `rhs`.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn normalize_zero_vector_is_zero() {
        assert_eq!(Vec3::zero().normalize(), Vec3::zero());
    }

    #[test]
    fn normalize_has_unit_length() {
        let n = Vec3::new(3.0, 4.0, 12.0).normalize();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn distance_and_midpoint() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 0.0, 0.0);
        assert!((a.distance(b) - 2.0).abs() < 1e-6);
        assert_eq!(a.midpoint(b), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn cross_is_right_handed() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(y.cross(x), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn skew_matches_cross_product() {
        let v = Vec3::new(1.0, -2.0, 0.5);
        let w = Vec3::new(0.3, 4.0, -1.0);
        assert!(Mat3::skew(v).mul_vec(w).approx_eq(v.cross(w), 1e-5));
    }

    #[test]
    fn euler_conversion_inverts() {
        let e = Vec3::new(0.3, -0.4, 1.1);
        let back = Mat3::from_euler(e).to_euler();
        assert!(back.approx_eq(e, 1e-4), "got {back:?}");
    }

    #[test]
    fn euler_z_quarter_turn_rotates_x_to_y() {
        let r = Mat3::from_euler(Vec3::new(0.0, 0.0, FRAC_PI_2));
        assert!(r.mul_vec(Vec3::new(1.0, 0.0, 0.0)).approx_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn transpose_of_rotation_is_inverse() {
        let r = Mat3::from_euler(Vec3::new(0.7, 0.2, -0.5));
        assert!(r.mul(&r.transpose()).approx_eq(&Mat3::identity(), 1e-5));
    }

    #[test]
    fn quaternion_axis_angle_rotates() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let r = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(r.approx_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
        assert!((q.mul(q.conjugate()).w - 1.0).abs() < 1e-5);
    }
}
