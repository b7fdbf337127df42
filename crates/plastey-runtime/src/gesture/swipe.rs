//! Directional swipes of the palm.
//!
//! Each hand carries one [`SwipeTracker`] per [`SwipeAxis`].  A tracker
//! follows one episode of motion from an anchor: the episode restarts when
//! the palm drifts off-axis by more than `swipe_deviance` or reverses
//! direction, and fires once when it has covered `swipe_distance` along the
//! axis.  All values are raw tracker millimetres.
//!
//! | Axis | Negative | Positive |
//! |---|---|---|
//! | left-right | undo | redo |
//! | up-down | nothing | deselect all |
//! | front-back | clear messages | nothing |

use plastey_types::Vec3;
use tracing::debug;

use super::{GestureConfig, HandFrame};
use crate::actions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeAxis {
    LeftRight = 0,
    UpDown = 1,
    FrontBack = 2,
}

impl SwipeAxis {
    /// Signed coordinate along the axis.  Forward (away from the operator)
    /// is positive on the front-back axis.
    pub fn along(self, p: Vec3) -> f32 {
        match self {
            SwipeAxis::LeftRight => p.x,
            SwipeAxis::UpDown => p.y,
            SwipeAxis::FrontBack => -p.z,
        }
    }

    /// The two coordinates perpendicular to the axis.
    pub fn across(self, p: Vec3) -> [f32; 2] {
        match self {
            SwipeAxis::LeftRight => [p.y, p.z],
            SwipeAxis::UpDown => [p.x, p.z],
            SwipeAxis::FrontBack => [p.x, p.y],
        }
    }
}

/// One episode of palm motion along one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwipeTracker {
    anchor: Option<Vec3>,
    last: f32,
}

impl SwipeTracker {
    pub fn reset(&mut self) {
        self.anchor = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.anchor.is_some()
    }

    /// Feed one palm sample.  Returns the signed distance covered when the
    /// swipe completes.
    pub fn sample(&mut self, axis: SwipeAxis, palm: Vec3, config: &GestureConfig) -> Option<f32> {
        let here = axis.along(palm);
        let Some(anchor) = self.anchor else {
            self.restart(palm, here);
            return None;
        };

        let from_anchor = here - axis.along(anchor);
        let from_last = here - self.last;
        let drifted = axis
            .across(palm - anchor)
            .iter()
            .any(|d| d.abs() > config.swipe_deviance);
        if drifted || from_anchor * from_last < 0.0 {
            self.restart(palm, here);
            return None;
        }
        if from_anchor.abs() >= config.swipe_distance {
            self.restart(palm, here);
            return Some(from_anchor);
        }
        self.last = here;
        None
    }

    fn restart(&mut self, palm: Vec3, here: f32) {
        self.anchor = Some(palm);
        self.last = here;
    }
}

/// Run one axis for the frame's hand.  Grabbing hands do not swipe.
fn detect(frame: &mut HandFrame<'_>, axis: SwipeAxis) -> Option<f32> {
    let palm = frame.hand.palm();
    let config = frame.config;
    let grabbing = frame.grab.dual() || frame.hand.gesture.grabbing;
    let tracker = frame.hand.gesture.swipe_mut(axis);
    if grabbing {
        tracker.reset();
        return None;
    }
    let swiped = tracker.sample(axis, palm, config);
    if let Some(distance) = swiped {
        debug!(side = ?frame.hand.side(), ?axis, distance, "swipe");
    }
    swiped
}

pub fn left_right(frame: &mut HandFrame<'_>) {
    match detect(frame, SwipeAxis::LeftRight) {
        Some(d) if d < 0.0 => actions::undo(frame.scene, frame.history),
        Some(_) => actions::redo(frame.scene, frame.history),
        None => {}
    }
}

pub fn up_down(frame: &mut HandFrame<'_>) {
    if let Some(d) = detect(frame, SwipeAxis::UpDown)
        && d > 0.0
    {
        actions::deselect_all(frame.scene, frame.history);
    }
}

pub fn front_back(frame: &mut HandFrame<'_>) {
    if let Some(d) = detect(frame, SwipeAxis::FrontBack)
        && d < 0.0
    {
        frame.scene.text.clear();
    }
}
