//! `plastey-types` – shared vocabulary of the Plastey workspace.
//!
//! Spatial primitives live in [`math`].  This root module holds the sensor
//! sample types handed over by trackers, the wire payload exchanged with the
//! remote peer, and the error taxonomy every other crate returns.

pub mod math;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use math::{Mat3, Quaternion, Vec3};

/// Stable index of a vertex in the shared mesh.
pub type VertexId = u32;

// ────────────────────────────────────────────────────────────────────────────
// Scene vocabulary
// ────────────────────────────────────────────────────────────────────────────

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub f32, pub f32, pub f32, pub f32);

impl Color {
    pub const WHITE: Self = Self(1.0, 1.0, 1.0, 1.0);
}

/// The five fingers of a hand, in tracker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerKind {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl FingerKind {
    pub const ALL: [FingerKind; 5] = [
        FingerKind::Thumb,
        FingerKind::Index,
        FingerKind::Middle,
        FingerKind::Ring,
        FingerKind::Pinky,
    ];

    /// Position of this finger in tracker arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Default render scale of the fingertip marker.
    pub fn tip_scale(self) -> f32 {
        match self {
            FingerKind::Thumb => 1.0,
            FingerKind::Index => 0.6,
            FingerKind::Middle => 0.7,
            FingerKind::Ring => 0.6,
            FingerKind::Pinky => 0.55,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandSide {
    Left,
    Right,
}

/// How the hand tracker is mounted; decides axis correction and whether the
/// physical hands swap scene roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountMode {
    /// Sensor lying on the desk, facing up.
    #[default]
    Desk,
    /// Sensor strapped to the front of the head-mounted display.
    Head,
}

impl MountMode {
    /// Scene role of a physical hand.  A head-mounted sensor sees the hands
    /// mirrored, so the roles swap.
    pub fn scene_side(self, physical: HandSide) -> HandSide {
        match (self, physical) {
            (MountMode::Desk, side) => side,
            (MountMode::Head, HandSide::Left) => HandSide::Right,
            (MountMode::Head, HandSide::Right) => HandSide::Left,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sensor samples
// ────────────────────────────────────────────────────────────────────────────

/// One hand as reported by the tracker, in device millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedHand {
    /// Physical handedness as classified by the tracker.
    pub side: HandSide,
    pub palm: Vec3,
    /// Fingertip positions indexed by [`FingerKind::index`].
    pub tips: [Vec3; 5],
}

impl TrackedHand {
    pub fn tip(&self, kind: FingerKind) -> Vec3 {
        self.tips[kind.index()]
    }
}

/// A single tracker frame.  Invalid frames carry no usable hands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingFrame {
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default)]
    pub hands: Vec<TrackedHand>,
}

fn default_valid() -> bool {
    true
}

impl TrackingFrame {
    pub fn new(hands: Vec<TrackedHand>) -> Self {
        Self { valid: true, hands }
    }

    pub fn invalid() -> Self {
        Self { valid: false, hands: Vec::new() }
    }
}

/// Head-mounted display pose, in device units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire payload
// ────────────────────────────────────────────────────────────────────────────

/// A vertex position claimed by one side of the session.  Travels on the
/// wire as the tuple `[id, x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(VertexId, f32, f32, f32)", into = "(VertexId, f32, f32, f32)")]
pub struct VertexUpdate {
    pub id: VertexId,
    pub position: Vec3,
}

impl VertexUpdate {
    pub fn new(id: VertexId, position: Vec3) -> Self {
        Self { id, position }
    }
}

impl From<(VertexId, f32, f32, f32)> for VertexUpdate {
    fn from((id, x, y, z): (VertexId, f32, f32, f32)) -> Self {
        Self::new(id, Vec3::new(x, y, z))
    }
}

impl From<VertexUpdate> for (VertexId, f32, f32, f32) {
    fn from(u: VertexUpdate) -> Self {
        (u.id, u.position.x, u.position.y, u.position.z)
    }
}

/// One message of the per-frame peer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum SyncMessage {
    /// The sender's current local selection.
    Selections(Vec<VertexUpdate>),
    /// The sender is restarting; the receiver should restart too.
    Restart,
}

// ────────────────────────────────────────────────────────────────────────────
// Control flow
// ────────────────────────────────────────────────────────────────────────────

/// Process-level signal that ends the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Operator quit, or the input source ran dry.
    Escape,
    /// Tear the session down and build a fresh one.
    Restart,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Ownership conflict raised by `Surface::select`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    #[error("vertex {0} is locked by the peer")]
    Locked(VertexId),

    #[error("vertex {0} is already selected")]
    AlreadySelected(VertexId),

    #[error("vertex {0} does not exist")]
    UnknownVertex(VertexId),
}

/// Workspace-wide error type.
#[derive(Error, Debug)]
pub enum PlasteyError {
    #[error("Invalid reference '{reference}' for {registry}")]
    InvalidReference { registry: String, reference: String },

    #[error("Unknown vertex {0}")]
    UnknownVertex(VertexId),

    #[error("Transport Error: {0}")]
    Transport(String),

    /// The peer link is gone for good; retrying the exchange cannot help.
    #[error("Peer disconnected: {0}")]
    Disconnected(String),

    #[error("Codec Error: {0}")]
    Codec(String),

    #[error("Snapshot Error: {0}")]
    Snapshot(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Tracker Error: {0}")]
    Tracker(String),
}
