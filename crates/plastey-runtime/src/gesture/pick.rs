//! Pick: touch thumb and index near a vertex to toggle its selection.
//!
//! The gesture fires once per touch.  It re-arms only after the fingers
//! open past `pick_release_distance`.

use plastey_types::FingerKind;
use tracing::debug;

use super::{HandFrame, PINCHING_FINGERS, thumb_index_distance};
use crate::actions;

pub fn observe(frame: &mut HandFrame<'_>) {
    if frame.grab.dual() {
        return;
    }
    let distance = thumb_index_distance(frame.hand);

    if distance < frame.config.pick_release_distance {
        if frame.hand.gesture.picking {
            return;
        }
        let midpoint = frame
            .hand
            .tip(FingerKind::Thumb)
            .midpoint(frame.hand.tip(FingerKind::Index));
        let reach = frame.config.pick_hold_distance;
        let Some(id) = frame.scene.surface.find_vertex(|p| p.distance(midpoint) < reach) else {
            return;
        };
        debug!(side = ?frame.hand.side(), vertex = id, "pick");
        actions::toggle_selection(frame.scene, frame.history, id);
        frame.hand.gesture.picking = true;
        let active = frame.scene.palette.pick_active;
        frame.hand.paint_fingers(&PINCHING_FINGERS, active);
    } else if frame.hand.gesture.picking {
        frame.hand.gesture.picking = false;
        let base = frame.hand.color();
        frame.hand.paint_fingers(&PINCHING_FINGERS, base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::testing::{Rig, hand, rig};
    use crate::gesture::{GestureConfig, GrabStatus};
    use crate::hand::HandState;
    use crate::scene::{Palette, Scene};
    use plastey_kernel::History;
    use plastey_types::{HandSide, Vec3};

    const CLOSED: (Vec3, Vec3) = (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
    const OPEN: (Vec3, Vec3) = (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));

    fn step(
        state: &mut HandState,
        scene: &mut Scene,
        history: &mut History<Scene>,
        fingers: (Vec3, Vec3),
        grab: GrabStatus,
    ) {
        state.track(&hand(HandSide::Right, fingers.0, fingers.1));
        let config = GestureConfig::default();
        observe(&mut HandFrame { hand: state, scene, history, config: &config, grab });
    }

    #[test]
    fn pick_toggles_once_per_touch() {
        let Rig { mut scene, text, .. } = rig();
        let mut history = History::new();
        let mut state = HandState::new(HandSide::Right);

        step(&mut state, &mut scene, &mut history, CLOSED, GrabStatus::default());
        assert!(scene.surface.is_selected(4));
        assert!(state.gesture.picking);
        assert_eq!(state.finger(FingerKind::Index).color(), Palette::default().pick_active);

        step(&mut state, &mut scene, &mut history, CLOSED, GrabStatus::default());
        assert_eq!(history.len(), 1, "held touch must not toggle again");

        step(&mut state, &mut scene, &mut history, OPEN, GrabStatus::default());
        assert!(!state.gesture.picking);
        assert_eq!(state.finger(FingerKind::Index).color(), Palette::default().finger_base);

        step(&mut state, &mut scene, &mut history, CLOSED, GrabStatus::default());
        assert!(!scene.surface.is_selected(4));
        assert_eq!(history.len(), 2);
        assert_eq!(text.last().as_deref(), Some("Vertex 4 deselected"));
    }

    #[test]
    fn pick_on_locked_vertex_only_reports() {
        let Rig { mut scene, text, .. } = rig();
        let mut history = History::new();
        let mut state = HandState::new(HandSide::Right);
        scene.surface.lock(4).unwrap();

        step(&mut state, &mut scene, &mut history, CLOSED, GrabStatus::default());
        assert!(!scene.surface.is_selected(4));
        assert!(history.is_empty());
        assert!(text.last().unwrap().contains("locked"));
    }

    #[test]
    fn pick_far_from_any_vertex_does_nothing() {
        let Rig { mut scene, .. } = rig();
        let mut history = History::new();
        let mut state = HandState::new(HandSide::Left);
        let shifted = (CLOSED.0 + Vec3::new(5.0, 5.0, 0.0), CLOSED.1 + Vec3::new(5.0, 5.0, 0.0));

        step(&mut state, &mut scene, &mut history, shifted, GrabStatus::default());
        assert_eq!(scene.surface.selected().count(), 0);
        assert!(!state.gesture.picking);
    }

    #[test]
    fn pick_is_suppressed_during_dual_grab() {
        let Rig { mut scene, .. } = rig();
        let mut history = History::new();
        let mut state = HandState::new(HandSide::Right);
        let dual = GrabStatus { left: true, right: true };

        step(&mut state, &mut scene, &mut history, CLOSED, dual);
        assert!(!scene.surface.is_selected(4));
        assert!(history.is_empty());
    }
}
