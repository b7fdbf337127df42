//! Gesture engine.
//!
//! Gestures are plain observer functions registered on the [`Hands`] and
//! [`Hand`][crate::hand::Hand] registries by [`install`].  Each one reads
//! the typed frame context it is handed, updates the hand's
//! [`GestureState`] and mutates the scene.
//!
//! | Event | Observer | Effect |
//! |---|---|---|
//! | hands `Grab` | [`grab::dual`] | rotate and scale the scene pivot |
//! | hand `Grab` | [`grab::single`] | translate the selected vertices |
//! | hand `Pick` | [`pick::observe`] | toggle selection near the fingertips |
//! | hand `Pinch` | [`pinch::observe`] | drag one vertex |
//! | hand `Swipe*` | [`swipe`] | undo, redo, deselect all, clear messages |
//!
//! Grab classification runs for every visible hand before any of these
//! fire, so each observer sees the same [`GrabStatus`].

pub mod grab;
pub mod pick;
pub mod pinch;
pub mod swipe;

use plastey_kernel::History;
use plastey_types::{FingerKind, PlasteyError, Vec3, VertexId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::hand::{HandEvent, HandState, Hands, HandsEvent};
use crate::scene::{Paint, Scene};

pub use grab::DualGrab;
pub use swipe::{SwipeAxis, SwipeTracker};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Which gesture selects vertices.  Only one is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureMode {
    /// Toggle selection with a short thumb-index touch.
    #[default]
    Pick,
    /// Grab a vertex between thumb and index and drag it.
    Pinch,
}

/// Distance thresholds in scene units, except the swipe values which are
/// tracker millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub mode: GestureMode,
    pub pick_release_distance: f32,
    pub pick_hold_distance: f32,
    pub pinch_fingers_distance: f32,
    pub pinch_vertex_distance: f32,
    pub grab_release_distance: f32,
    pub swipe_distance: f32,
    pub swipe_deviance: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            mode: GestureMode::Pick,
            pick_release_distance: 2.5,
            pick_hold_distance: 3.5,
            pinch_fingers_distance: 2.0,
            pinch_vertex_distance: 1.0,
            grab_release_distance: 3.5,
            swipe_distance: 135.0,
            swipe_deviance: 20.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-hand state
// ────────────────────────────────────────────────────────────────────────────

/// A vertex held by an ongoing pinch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchHold {
    pub vertex: VertexId,
    /// Where the vertex was when the pinch started.
    pub origin: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct GestureState {
    pub grabbing: bool,
    pub picking: bool,
    pub pinch: Option<PinchHold>,
    /// Set when the last pinch attempt found nothing to hold.
    pub pinch_missed: bool,
    /// Thumb position of the previous single-grab frame.
    pub grab_anchor: Option<Vec3>,
    pub swipes: [SwipeTracker; 3],
}

impl GestureState {
    pub fn swipe_mut(&mut self, axis: SwipeAxis) -> &mut SwipeTracker {
        &mut self.swipes[axis as usize]
    }

    pub fn reset_swipes(&mut self) {
        for tracker in &mut self.swipes {
            tracker.reset();
        }
    }
}

/// Which hands are grabbing this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrabStatus {
    pub left: bool,
    pub right: bool,
}

impl GrabStatus {
    pub fn dual(self) -> bool {
        self.left && self.right
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Frame contexts
// ────────────────────────────────────────────────────────────────────────────

/// Context handed to hand-level observers.
pub struct HandFrame<'a> {
    pub hand: &'a mut HandState,
    pub scene: &'a mut Scene,
    pub history: &'a mut History<Scene>,
    pub config: &'a GestureConfig,
    pub grab: GrabStatus,
}

/// Context handed to two-handed observers.
pub struct HandsFrame<'a> {
    pub left: &'a mut HandState,
    pub right: &'a mut HandState,
    pub dual: &'a mut DualGrab,
    pub scene: &'a mut Scene,
    pub history: &'a mut History<Scene>,
    pub config: &'a GestureConfig,
    pub grab: GrabStatus,
}

// ────────────────────────────────────────────────────────────────────────────
// Wiring
// ────────────────────────────────────────────────────────────────────────────

/// Register the built-in gestures on both hands.
///
/// # Errors
///
/// Returns [`PlasteyError::InvalidReference`] only if a hand registry was
/// built without one of the gesture events.
pub fn install(hands: &mut Hands, mode: GestureMode) -> Result<(), PlasteyError> {
    hands.observe(HandsEvent::Grab, Box::new(grab::dual))?;
    for hand in [&mut hands.left, &mut hands.right] {
        hand.observe(HandEvent::Grab, Box::new(grab::single))?;
        match mode {
            GestureMode::Pick => hand.observe(HandEvent::Pick, Box::new(pick::observe))?,
            GestureMode::Pinch => hand.observe(HandEvent::Pinch, Box::new(pinch::observe))?,
        }
        hand.observe(HandEvent::SwipeLeftRight, Box::new(swipe::left_right))?;
        hand.observe(HandEvent::SwipeUpDown, Box::new(swipe::up_down))?;
        hand.observe(HandEvent::SwipeFrontBack, Box::new(swipe::front_back))?;
    }
    info!(?mode, "gestures installed");
    Ok(())
}

/// Abandon every gesture of a hand that stopped being tracked.  A held
/// pinch is released as if the fingers had opened.
pub fn release_hand(hand: &mut HandState, scene: &mut Scene, history: &mut History<Scene>) {
    if let Some(hold) = hand.gesture.pinch.take() {
        pinch::release(hold, scene, history);
    }
    let gesture = &mut hand.gesture;
    gesture.picking = false;
    gesture.pinch_missed = false;
    gesture.grabbing = false;
    gesture.grab_anchor = None;
    gesture.reset_swipes();
    hand.set_color(scene.palette.finger_base);
    debug!(side = ?hand.side(), "gestures released");
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers shared by the gestures
// ────────────────────────────────────────────────────────────────────────────

fn thumb_index_distance(hand: &HandState) -> f32 {
    hand.tip(FingerKind::Thumb).distance(hand.tip(FingerKind::Index))
}

const PINCHING_FINGERS: [FingerKind; 2] = [FingerKind::Thumb, FingerKind::Index];

fn deselect_and_paint(scene: &mut Scene, id: VertexId) {
    if scene.surface.deselect(id).is_some() {
        scene.paint(id, Paint::Base);
    }
}
