//! Device geometry correction.
//!
//! The tracker reports millimetres with +Y pointing away from the sensor
//! face.  The scene is Z-up, so a desk-mounted sensor needs Y and Z swapped,
//! while a head-mounted sensor looks forward and mirrors X.
//!
//! | Mount | Scene position |
//! |---|---|
//! | desk | `(x·M, −z·M, y·M − 10)` |
//! | head | `(−x·M, y·M − 10, −z·M + 10)` |
//!
//! # Example
//!
//! ```rust
//! use plastey_perception::positioner::{Positioner, PositionerConfig};
//! use plastey_types::{MountMode, Vec3};
//!
//! let desk = Positioner::new(MountMode::Desk, PositionerConfig::default());
//! let p = desk.position(Vec3::new(10.0, 200.0, -30.0));
//! assert!(p.approx_eq(Vec3::new(1.0, 3.0, 10.0), 1e-5));
//! ```

use plastey_types::{MountMode, Vec3};
use serde::{Deserialize, Serialize};

/// Scale and offsets applied by the [`Positioner`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionerConfig {
    /// Millimetres to scene units.
    #[serde(default = "default_multiplier")]
    pub multiplier: f32,
    /// Added to the vertical scene axis on a desk mount.
    #[serde(default = "default_height_offset")]
    pub desk_height_offset: f32,
    /// Added to the scene Y axis on a head mount.
    #[serde(default = "default_height_offset")]
    pub head_height_offset: f32,
    /// Added to the scene Z axis on a head mount.
    #[serde(default = "default_head_depth_offset")]
    pub head_depth_offset: f32,
}

fn default_multiplier() -> f32 {
    0.1
}
fn default_height_offset() -> f32 {
    -10.0
}
fn default_head_depth_offset() -> f32 {
    10.0
}

impl Default for PositionerConfig {
    fn default() -> Self {
        Self {
            multiplier: default_multiplier(),
            desk_height_offset: default_height_offset(),
            head_height_offset: default_height_offset(),
            head_depth_offset: default_head_depth_offset(),
        }
    }
}

/// Pure mapping from raw fingertip positions to scene positions.
#[derive(Debug, Clone, Copy)]
pub struct Positioner {
    mount: MountMode,
    config: PositionerConfig,
}

impl Positioner {
    pub fn new(mount: MountMode, config: PositionerConfig) -> Self {
        Self { mount, config }
    }

    pub fn mount(&self) -> MountMode {
        self.mount
    }

    pub fn position(&self, raw: Vec3) -> Vec3 {
        let m = self.config.multiplier;
        match self.mount {
            MountMode::Desk => Vec3::new(
                raw.x * m,
                raw.z * -m,
                raw.y * m + self.config.desk_height_offset,
            ),
            MountMode::Head => Vec3::new(
                raw.x * -m,
                raw.y * m + self.config.head_height_offset,
                raw.z * -m + self.config.head_depth_offset,
            ),
        }
    }
}
