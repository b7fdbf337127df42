//! Pinch: hold a vertex between thumb and index and drag it.
//!
//! While a hold is active the vertex follows the index tip every frame.
//! Opening the fingers releases the vertex and records the whole drag as a
//! single undoable move.

use plastey_kernel::History;
use plastey_types::FingerKind;
use tracing::debug;

use super::{HandFrame, PINCHING_FINGERS, PinchHold, deselect_and_paint, thumb_index_distance};
use crate::actions;
use crate::scene::{Paint, Scene};

pub fn observe(frame: &mut HandFrame<'_>) {
    let distance = thumb_index_distance(frame.hand);
    let pinched = distance < frame.config.pinch_fingers_distance;
    let index_tip = frame.hand.tip(FingerKind::Index);

    if let Some(hold) = frame.hand.gesture.pinch {
        if !frame.scene.surface.is_selected(hold.vertex) {
            debug!(vertex = hold.vertex, "held vertex taken by the peer");
            frame.hand.gesture.pinch = None;
            reset_fingers(frame);
        } else if pinched {
            if frame.scene.surface.set_position(hold.vertex, index_tip).is_ok() {
                frame.scene.surface.update();
            }
        } else {
            frame.hand.gesture.pinch = None;
            release(hold, frame.scene, frame.history);
            reset_fingers(frame);
        }
        return;
    }

    if !pinched {
        if frame.hand.gesture.pinch_missed {
            frame.hand.gesture.pinch_missed = false;
            reset_fingers(frame);
        }
        return;
    }
    // New pinches cannot start while both hands grab the scene.
    if frame.grab.dual() {
        return;
    }

    let thumb_tip = frame.hand.tip(FingerKind::Thumb);
    let reach = frame.config.pinch_vertex_distance;
    let candidate = frame
        .scene
        .surface
        .find_vertex(|p| p.distance(thumb_tip) < reach || p.distance(index_tip) < reach);
    let palette = frame.scene.palette;

    let held = candidate.and_then(|id| {
        let origin = frame.scene.surface.position(id)?;
        match frame.scene.surface.select(id) {
            Ok(_) => Some(PinchHold { vertex: id, origin }),
            Err(e) => {
                debug!(vertex = id, error = %e, "pinch rejected");
                None
            }
        }
    });

    match held {
        Some(hold) => {
            frame.scene.paint(hold.vertex, Paint::Selected);
            if frame.scene.surface.set_position(hold.vertex, index_tip).is_ok() {
                frame.scene.surface.update();
            }
            debug!(side = ?frame.hand.side(), vertex = hold.vertex, "pinch hold");
            frame.hand.gesture.pinch = Some(hold);
            frame.hand.gesture.pinch_missed = false;
            frame.hand.paint_fingers(&PINCHING_FINGERS, palette.pinch_ok);
        }
        None if !frame.hand.gesture.pinch_missed => {
            frame.hand.gesture.pinch_missed = true;
            frame.hand.paint_fingers(&PINCHING_FINGERS, palette.pinch_fail);
        }
        None => {}
    }
}

/// Let go of a held vertex and record the drag.
pub fn release(hold: PinchHold, scene: &mut Scene, history: &mut History<Scene>) {
    let Some(target) = scene.surface.position(hold.vertex) else {
        return;
    };
    deselect_and_paint(scene, hold.vertex);
    actions::record_move(history, hold.vertex, hold.origin, target);
    debug!(vertex = hold.vertex, "pinch released");
}

fn reset_fingers(frame: &mut HandFrame<'_>) {
    let base = frame.hand.color();
    frame.hand.paint_fingers(&PINCHING_FINGERS, base);
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastey_hal::VertexMesh;
    use crate::gesture::testing::{Rig, hand, rig};
    use crate::gesture::{GestureConfig, GrabStatus};
    use crate::hand::HandState;
    use crate::scene::Palette;
    use plastey_types::{HandSide, Vec3};

    fn step(
        state: &mut HandState,
        scene: &mut Scene,
        history: &mut History<Scene>,
        thumb: Vec3,
        index: Vec3,
    ) {
        state.track(&hand(HandSide::Right, thumb, index));
        let config = GestureConfig::default();
        observe(&mut HandFrame {
            hand: state,
            scene,
            history,
            config: &config,
            grab: GrabStatus::default(),
        });
    }

    #[test]
    fn pinch_drags_vertex_and_release_records_move() {
        let Rig { mut scene, mesh, .. } = rig();
        let mut history = History::new();
        let mut state = HandState::new(HandSide::Right);
        let origin = mesh.position(4).unwrap();

        step(&mut state, &mut scene, &mut history, Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(state.gesture.pinch.map(|h| h.vertex), Some(4));
        assert!(scene.surface.is_selected(4));
        assert_eq!(state.finger(FingerKind::Thumb).color(), Palette::default().pinch_ok);

        let target = Vec3::new(3.0, 2.0, 1.0);
        step(&mut state, &mut scene, &mut history, target - Vec3::new(1.0, 0.0, 0.0), target);
        assert_eq!(mesh.position(4), Some(target));
        assert!(history.is_empty(), "dragging records nothing until release");

        step(&mut state, &mut scene, &mut history, target - Vec3::new(4.0, 0.0, 0.0), target);
        assert!(state.gesture.pinch.is_none());
        assert!(!scene.surface.is_selected(4));
        assert_eq!(history.len(), 1);
        assert_eq!(state.finger(FingerKind::Thumb).color(), Palette::default().finger_base);

        history.undo(&mut scene, |_| {});
        assert_eq!(mesh.position(4), Some(origin));
        history.redo(&mut scene, |_| {});
        assert_eq!(mesh.position(4), Some(target));
    }

    #[test]
    fn pinch_without_vertex_marks_failure() {
        let Rig { mut scene, .. } = rig();
        let mut history = History::new();
        let mut state = HandState::new(HandSide::Right);

        step(&mut state, &mut scene, &mut history, Vec3::new(4.0, 4.0, 0.0), Vec3::new(5.0, 4.0, 0.0));
        assert!(state.gesture.pinch.is_none());
        assert!(state.gesture.pinch_missed);
        assert_eq!(state.finger(FingerKind::Index).color(), Palette::default().pinch_fail);

        step(&mut state, &mut scene, &mut history, Vec3::new(4.0, 4.0, 0.0), Vec3::new(9.0, 4.0, 0.0));
        assert!(!state.gesture.pinch_missed);
        assert_eq!(state.finger(FingerKind::Index).color(), Palette::default().finger_base);
    }

    #[test]
    fn pinch_on_locked_vertex_fails() {
        let Rig { mut scene, .. } = rig();
        let mut history = History::new();
        let mut state = HandState::new(HandSide::Right);
        scene.surface.lock(4).unwrap();

        step(&mut state, &mut scene, &mut history, Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0));
        assert!(state.gesture.pinch.is_none());
        assert!(state.gesture.pinch_missed);
    }

    #[test]
    fn hold_is_dropped_when_peer_takes_the_vertex() {
        let Rig { mut scene, .. } = rig();
        let mut history = History::new();
        let mut state = HandState::new(HandSide::Right);
        step(&mut state, &mut scene, &mut history, Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0));
        assert!(state.gesture.pinch.is_some());

        scene.surface.lock(4).unwrap();
        step(&mut state, &mut scene, &mut history, Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0));
        assert!(state.gesture.pinch.is_none());
        assert!(history.is_empty());
    }
}
