//! Rotation between directions and the dual-hand grab axis.
//!
//! [`rotation_between`] builds the matrix that turns one unit direction onto
//! another with the Rodrigues form
//!
//! ```text
//! v = d × t,  c = d · t
//! R = I + [v]× + [v]×² · (1 − c) / |v|²
//! ```
//!
//! When `v` vanishes (parallel or antiparallel directions) the identity is
//! returned.
//!
//! [`GrabAxis`] is the line between both thumbs while the two hands grab.
//! Comparing the axis of two consecutive frames yields a [`GrabDelta`]: the
//! rotation from the previous direction to the current one and the
//! `previous / current` length ratio.
//!
//! # Example
//!
//! ```rust
//! use plastey_perception::transform::rotation_between;
//! use plastey_types::Vec3;
//!
//! let d = Vec3::new(1.0, 0.0, 0.0);
//! let t = Vec3::new(0.0, 0.0, 1.0);
//! let r = rotation_between(d, t);
//! assert!(r.mul_vec(d).approx_eq(t, 1e-5));
//! ```

use plastey_types::{Mat3, Vec3};

/// Squared cross-product length under which two directions count as
/// collinear.
const COLLINEAR_EPSILON: f32 = 1e-12;

/// Rotation mapping direction `from` onto direction `to`.
///
/// Both inputs are normalized first.  Returns the identity for zero-length,
/// parallel or antiparallel inputs.
pub fn rotation_between(from: Vec3, to: Vec3) -> Mat3 {
    let d = from.normalize();
    let t = to.normalize();
    let v = d.cross(t);
    let s2 = v.dot(v);
    if s2 < COLLINEAR_EPSILON {
        return Mat3::identity();
    }
    let c = d.dot(t);
    let k = Mat3::skew(v);
    Mat3::identity()
        .add(&k)
        .add(&k.mul(&k).scale((1.0 - c) / s2))
}

// ────────────────────────────────────────────────────────────────────────────
// Grab axis
// ────────────────────────────────────────────────────────────────────────────

/// The thumb-to-thumb line of a dual-hand grab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabAxis {
    pub direction: Vec3,
    pub length: f32,
}

impl GrabAxis {
    /// Axis from the left thumb to the right thumb.
    pub fn between(left_thumb: Vec3, right_thumb: Vec3) -> Self {
        let line = right_thumb - left_thumb;
        Self {
            direction: line.normalize(),
            length: line.length(),
        }
    }

    /// Change from `previous` to `self`.
    pub fn delta_since(&self, previous: &GrabAxis) -> GrabDelta {
        let scale = if self.length > 0.0 {
            Some(previous.length / self.length)
        } else {
            None
        };
        GrabDelta {
            rotation: rotation_between(previous.direction, self.direction),
            scale,
        }
    }
}

/// Frame-to-frame change of a [`GrabAxis`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabDelta {
    /// Rotation taking the previous direction onto the current one.
    pub rotation: Mat3,
    /// `previous / current` length; `None` when the hands touch.
    pub scale: Option<f32>,
}

impl GrabDelta {
    /// XYZ Euler angles of the inverse rotation, as applied to the pivot.
    pub fn pivot_euler(&self) -> Vec3 {
        self.rotation.transpose().to_euler()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_maps(d: Vec3, t: Vec3) {
        let r = rotation_between(d, t);
        let got = r.mul_vec(d.normalize());
        assert!(got.approx_eq(t.normalize(), 1e-4), "{d:?} -> {got:?}, expected {t:?}");
    }

    #[test]
    fn maps_previous_direction_onto_current() {
        assert_maps(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert_maps(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert_maps(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-2.0, 0.5, 1.0));
        assert_maps(Vec3::new(0.3, -0.9, 0.1), Vec3::new(0.31, -0.88, 0.12));
    }

    #[test]
    fn result_is_a_rotation() {
        let r = rotation_between(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-2.0, 0.5, 1.0));
        assert!(r.mul(&r.transpose()).approx_eq(&Mat3::identity(), 1e-5));
    }

    #[test]
    fn equal_directions_give_identity() {
        let d = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(rotation_between(d, d), Mat3::identity());
    }

    #[test]
    fn antiparallel_directions_give_identity() {
        let d = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(rotation_between(d, -d), Mat3::identity());
    }

    #[test]
    fn grab_scale_is_previous_over_current() {
        let prev = GrabAxis::between(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let curr = GrabAxis::between(Vec3::new(-4.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0));
        let delta = curr.delta_since(&prev);
        assert!((delta.scale.unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(delta.rotation, Mat3::identity());
    }

    #[test]
    fn touching_thumbs_skip_scale() {
        let prev = GrabAxis::between(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0));
        let curr = GrabAxis::between(Vec3::zero(), Vec3::zero());
        assert!(curr.delta_since(&prev).scale.is_none());
    }

    #[test]
    fn pivot_euler_undoes_the_grab_rotation() {
        let prev = GrabAxis::between(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0));
        let curr = GrabAxis::between(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
        let delta = curr.delta_since(&prev);
        let inverse = Mat3::from_euler(delta.pivot_euler());
        let back = inverse.mul_vec(Vec3::new(0.0, 1.0, 0.0));
        assert!(back.approx_eq(Vec3::new(1.0, 0.0, 0.0), 1e-4), "got {back:?}");
    }
}
