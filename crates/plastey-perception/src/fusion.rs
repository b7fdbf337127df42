//! Sensor fusion of the hand tracker and the head-mounted display.
//!
//! Each display frame the session hands over one [`TrackingFrame`] and, when
//! a headset is attached, one [`HeadPose`].  [`SensorFusion::fuse`] turns
//! them into a [`FusedFrame`]:
//!
//! - invalid tracking frames are rejected (`None`), so gesture processing is
//!   skipped for that frame;
//! - each hand is assigned its scene role for the configured mount and its
//!   fingertips are run through the [`Positioner`];
//! - the palm stays in raw tracker millimetres, which is what the swipe
//!   detectors measure against;
//! - the head pose becomes a scene [`CameraPose`].
//!
//! # Example
//!
//! ```rust
//! use plastey_perception::fusion::{HeadConfig, SensorFusion};
//! use plastey_perception::positioner::PositionerConfig;
//! use plastey_types::{HandSide, MountMode, TrackedHand, TrackingFrame, Vec3};
//!
//! let fusion = SensorFusion::new(MountMode::Desk, PositionerConfig::default(), HeadConfig::default());
//! let hand = TrackedHand { side: HandSide::Left, palm: Vec3::zero(), tips: [Vec3::zero(); 5] };
//!
//! let fused = fusion.fuse(&TrackingFrame::new(vec![hand]), None).unwrap();
//! assert_eq!(fused.hands[0].side, HandSide::Left);
//! assert!(fusion.fuse(&TrackingFrame::invalid(), None).is_none());
//! ```

use plastey_types::{FingerKind, HandSide, HeadPose, MountMode, Quaternion, TrackingFrame, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::positioner::{Positioner, PositionerConfig};

// ────────────────────────────────────────────────────────────────────────────
// Head configuration
// ────────────────────────────────────────────────────────────────────────────

/// Mapping from headset tracking space to the scene camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadConfig {
    /// Headset units to scene units.
    #[serde(default = "default_head_multiplier")]
    pub multiplier: f32,
    #[serde(default = "default_shift_y")]
    pub shift_y: f32,
    #[serde(default = "default_shift_z")]
    pub shift_z: f32,
    /// Pitch applied on top of the headset orientation so that looking
    /// straight ahead faces the sculpting surface.
    #[serde(default = "default_pitch_deg")]
    pub pitch_correction_deg: f32,
}

fn default_head_multiplier() -> f32 {
    10.0
}
fn default_shift_y() -> f32 {
    -20.0
}
fn default_shift_z() -> f32 {
    10.0
}
fn default_pitch_deg() -> f32 {
    80.0
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            multiplier: default_head_multiplier(),
            shift_y: default_shift_y(),
            shift_z: default_shift_z(),
            pitch_correction_deg: default_pitch_deg(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// One hand in scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedHand {
    /// Scene role, after the mount-dependent swap.
    pub side: HandSide,
    /// Raw palm position in tracker millimetres.
    pub palm: Vec3,
    /// Fingertips in scene units, indexed by [`FingerKind::index`].
    pub tips: [Vec3; 5],
}

impl FusedHand {
    pub fn tip(&self, kind: FingerKind) -> Vec3 {
        self.tips[kind.index()]
    }
}

/// Scene camera pose derived from the headset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

/// Everything the gesture engine needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedFrame {
    /// At most one hand per side.
    pub hands: Vec<FusedHand>,
    pub camera: Option<CameraPose>,
}

impl FusedFrame {
    pub fn hand(&self, side: HandSide) -> Option<&FusedHand> {
        self.hands.iter().find(|h| h.side == side)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SensorFusion
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SensorFusion {
    positioner: Positioner,
    head: HeadConfig,
}

impl SensorFusion {
    pub fn new(mount: MountMode, positioner: PositionerConfig, head: HeadConfig) -> Self {
        Self {
            positioner: Positioner::new(mount, positioner),
            head,
        }
    }

    pub fn positioner(&self) -> &Positioner {
        &self.positioner
    }

    /// Fuse one tracking frame with the latest head pose.
    ///
    /// Returns `None` for an invalid tracking frame.  When the tracker
    /// reports two hands with the same role only the first is kept.
    pub fn fuse(&self, frame: &TrackingFrame, head: Option<HeadPose>) -> Option<FusedFrame> {
        if !frame.valid {
            return None;
        }

        let mount = self.positioner.mount();
        let mut hands: Vec<FusedHand> = Vec::with_capacity(2);
        for tracked in &frame.hands {
            let side = mount.scene_side(tracked.side);
            if hands.iter().any(|h| h.side == side) {
                debug!(?side, "duplicate hand role in tracking frame; keeping the first");
                continue;
            }
            hands.push(FusedHand {
                side,
                palm: tracked.palm,
                tips: tracked.tips.map(|tip| self.positioner.position(tip)),
            });
        }

        Some(FusedFrame {
            hands,
            camera: head.map(|pose| self.camera_pose(pose)),
        })
    }

    /// Headset pose to scene camera pose (Z-up scene, shifted behind and
    /// above the surface).
    pub fn camera_pose(&self, pose: HeadPose) -> CameraPose {
        let f = self.head.multiplier;
        let p = pose.position;
        let correction = Quaternion::from_axis_angle(
            Vec3::new(1.0, 0.0, 0.0),
            self.head.pitch_correction_deg.to_radians(),
        );
        CameraPose {
            position: Vec3::new(p.x * f, p.z * -f + self.head.shift_y, p.y * f + self.head.shift_z),
            orientation: correction.mul(pose.orientation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastey_types::TrackedHand;

    fn hand(side: HandSide, tip: Vec3) -> TrackedHand {
        TrackedHand {
            side,
            palm: Vec3::new(1.0, 2.0, 3.0),
            tips: [tip; 5],
        }
    }

    fn fusion(mount: MountMode) -> SensorFusion {
        SensorFusion::new(mount, PositionerConfig::default(), HeadConfig::default())
    }

    #[test]
    fn invalid_frame_is_rejected() {
        assert!(fusion(MountMode::Desk).fuse(&TrackingFrame::invalid(), None).is_none());
    }

    #[test]
    fn desk_keeps_roles_and_positions_tips() {
        let frame = TrackingFrame::new(vec![hand(HandSide::Right, Vec3::new(10.0, 100.0, 0.0))]);
        let fused = fusion(MountMode::Desk).fuse(&frame, None).unwrap();
        let right = fused.hand(HandSide::Right).unwrap();
        assert!(right.tip(FingerKind::Index).approx_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
        assert_eq!(right.palm, Vec3::new(1.0, 2.0, 3.0));
        assert!(fused.camera.is_none());
    }

    #[test]
    fn head_mount_swaps_roles() {
        let frame = TrackingFrame::new(vec![hand(HandSide::Right, Vec3::zero())]);
        let fused = fusion(MountMode::Head).fuse(&frame, None).unwrap();
        assert!(fused.hand(HandSide::Left).is_some());
        assert!(fused.hand(HandSide::Right).is_none());
    }

    #[test]
    fn duplicate_roles_keep_first_hand() {
        let frame = TrackingFrame::new(vec![
            hand(HandSide::Left, Vec3::zero()),
            hand(HandSide::Left, Vec3::new(50.0, 0.0, 0.0)),
        ]);
        let fused = fusion(MountMode::Desk).fuse(&frame, None).unwrap();
        assert_eq!(fused.hands.len(), 1);
        assert!(fused.hands[0].tip(FingerKind::Thumb).approx_eq(Vec3::new(0.0, 0.0, -10.0), 1e-5));
    }

    #[test]
    fn head_pose_becomes_shifted_camera() {
        let pose = HeadPose {
            position: Vec3::new(0.1, 0.2, 0.3),
            orientation: Quaternion::identity(),
        };
        let fused = fusion(MountMode::Head)
            .fuse(&TrackingFrame::new(Vec::new()), Some(pose))
            .unwrap();
        let camera = fused.camera.unwrap();
        assert!(camera.position.approx_eq(Vec3::new(1.0, -23.0, 12.0), 1e-4));
        let forward = camera.orientation.rotate(Vec3::new(0.0, 1.0, 0.0));
        assert!(forward.z > 0.9, "pitch correction should tilt +Y towards +Z, got {forward:?}");
    }
}
