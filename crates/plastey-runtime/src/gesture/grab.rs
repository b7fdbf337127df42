//! Grab gestures.
//!
//! - [`dual`]: both hands closed.  The thumb-to-thumb axis is compared with
//!   the previous frame; the scene pivot is rotated by the inverse of the
//!   axis rotation and scaled by the length ratio.
//! - [`single`]: exactly one hand closed.  The thumb displacement since the
//!   previous frame is added to every selected vertex.
//!
//! Both record a baseline on their first frame and clear it when the grab
//! ends, so a new grab never jumps.

use plastey_perception::transform::GrabAxis;
use plastey_types::FingerKind;
use tracing::debug;

use super::{HandFrame, HandsFrame};

/// Baseline of an ongoing dual grab.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DualGrab {
    pub baseline: Option<GrabAxis>,
}

pub fn dual(frame: &mut HandsFrame<'_>) {
    if !frame.grab.dual() {
        if frame.dual.baseline.take().is_some() {
            debug!("dual grab ended");
        }
        return;
    }

    let axis = GrabAxis::between(frame.left.tip(FingerKind::Thumb), frame.right.tip(FingerKind::Thumb));
    match frame.dual.baseline {
        Some(previous) => {
            let delta = axis.delta_since(&previous);
            frame.scene.pivot.apply_rotation(delta.pivot_euler());
            if let Some(factor) = delta.scale {
                frame.scene.pivot.apply_scale(factor);
            }
        }
        None => debug!(length = axis.length, "dual grab started"),
    }
    frame.dual.baseline = Some(axis);
}

pub fn single(frame: &mut HandFrame<'_>) {
    if frame.grab.dual() || !frame.hand.gesture.grabbing {
        frame.hand.gesture.grab_anchor = None;
        return;
    }

    let thumb = frame.hand.tip(FingerKind::Thumb);
    if let Some(previous) = frame.hand.gesture.grab_anchor {
        let offset = thumb - previous;
        frame.scene.surface.translate_selected(offset);
        frame.scene.surface.update();
    } else {
        debug!(side = ?frame.hand.side(), "single grab started");
    }
    frame.hand.gesture.grab_anchor = Some(thumb);
}
