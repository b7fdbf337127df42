//! The scene root that two-handed grabs rotate and scale.

use plastey_types::Vec3;

pub trait Pivot {
    /// Rotate by XYZ Euler angles (radians), relative to the current
    /// orientation.
    fn apply_rotation(&mut self, euler: Vec3);

    /// Multiply the current world scale by `factor`.
    fn apply_scale(&mut self, factor: f32);
}
