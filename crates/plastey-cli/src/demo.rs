//! Built-in gesture script, played when no recording is configured.
//!
//! The script is written for a desk-mounted sensor in scene coordinates and
//! converted back to raw tracker millimetres, so it exercises the same
//! positioner path as a real device.  It runs through:
//!
//! 1. the right hand appearing open over the centre vertex;
//! 2. a pick (thumb and index closing) and release;
//! 3. a fist that drags the selection upward;
//! 4. the right hand leaving and the left hand swiping left (undo).

use plastey_perception::positioner::PositionerConfig;
use plastey_types::{FingerKind, HandSide, TrackedHand, TrackingFrame, Vec3};

/// Raw palm height above a desk sensor.
const PALM_HEIGHT_MM: f32 = 150.0;
/// Palm travel per frame during the swipe.
const SWIPE_STEP_MM: f32 = 15.0;

pub fn script(positioner: &PositionerConfig) -> Vec<TrackingFrame> {
    let raw = |scene: Vec3| desk_raw(positioner, scene);
    let right_palm = Vec3::new(0.0, PALM_HEIGHT_MM, 0.0);
    let mut frames = Vec::new();

    idle(&mut frames, 15);

    // Open hand hovering over the centre vertex.
    let open = hand(HandSide::Right, right_palm, [Vec3::new(-3.0, 0.0, 1.0), Vec3::new(3.0, 0.0, 1.0)], &raw);
    repeat(&mut frames, &[open], 15);

    // Pick and let go.
    let pinched = hand(HandSide::Right, right_palm, [Vec3::new(-0.5, 0.0, 0.5), Vec3::new(0.5, 0.0, 0.5)], &raw);
    repeat(&mut frames, &[pinched], 10);
    repeat(&mut frames, &[open], 10);

    // Fist, then drag the selection up by four units.
    for step in 0..=20u8 {
        let lift = Vec3::new(0.0, 0.0, 2.0 + f32::from(step) * 0.2);
        frames.push(TrackingFrame::new(vec![fist(HandSide::Right, right_palm, lift, &raw)]));
    }
    repeat(&mut frames, &[open], 10);

    idle(&mut frames, 10);

    // Left hand swipes to the left.
    for step in 0..=12u8 {
        let palm = Vec3::new(-f32::from(step) * SWIPE_STEP_MM, PALM_HEIGHT_MM, 0.0);
        let tips = [Vec3::new(-14.0, 0.0, 6.0), Vec3::new(-8.0, 0.0, 6.0)];
        frames.push(TrackingFrame::new(vec![hand(HandSide::Left, palm, tips, &raw)]));
    }

    idle(&mut frames, 15);
    frames
}

/// Inverse of the desk-mount positioner.
fn desk_raw(config: &PositionerConfig, scene: Vec3) -> Vec3 {
    let m = config.multiplier;
    Vec3::new(
        scene.x / m,
        (scene.z - config.desk_height_offset) / m,
        -scene.y / m,
    )
}

/// A hand with the given thumb and index tips; the other three fingers are
/// spread well away from the thumb.
fn hand(side: HandSide, palm: Vec3, [thumb, index]: [Vec3; 2], raw: &impl Fn(Vec3) -> Vec3) -> TrackedHand {
    let mut tips = [raw(thumb + Vec3::new(0.0, 6.0, 4.0)); 5];
    tips[FingerKind::Thumb.index()] = raw(thumb);
    tips[FingerKind::Index.index()] = raw(index);
    TrackedHand { side, palm, tips }
}

/// A closed hand: index and middle within grab distance of the thumb, but
/// far enough apart that it does not read as a pick.
fn fist(side: HandSide, palm: Vec3, thumb: Vec3, raw: &impl Fn(Vec3) -> Vec3) -> TrackedHand {
    let mut tips = [raw(thumb + Vec3::new(0.0, 6.0, 4.0)); 5];
    tips[FingerKind::Thumb.index()] = raw(thumb);
    tips[FingerKind::Index.index()] = raw(thumb + Vec3::new(3.0, 0.0, 0.0));
    tips[FingerKind::Middle.index()] = raw(thumb + Vec3::new(0.0, 3.0, 0.0));
    TrackedHand { side, palm, tips }
}

fn idle(frames: &mut Vec<TrackingFrame>, count: usize) {
    repeat(frames, &[], count);
}

fn repeat(frames: &mut Vec<TrackingFrame>, hands: &[TrackedHand], count: usize) {
    frames.extend(std::iter::repeat_n(TrackingFrame::new(hands.to_vec()), count));
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastey_perception::positioner::Positioner;
    use plastey_types::MountMode;

    #[test]
    fn desk_raw_inverts_the_positioner() {
        let config = PositionerConfig::default();
        let positioner = Positioner::new(MountMode::Desk, config);
        let scene = Vec3::new(1.5, -2.0, 3.0);
        assert!(positioner.position(desk_raw(&config, scene)).approx_eq(scene, 1e-4));
    }

    #[test]
    fn script_starts_and_ends_without_hands() {
        let frames = script(&PositionerConfig::default());
        assert!(frames.first().is_some_and(|f| f.hands.is_empty()));
        assert!(frames.last().is_some_and(|f| f.hands.is_empty()));
        assert!(frames.iter().all(|f| f.valid));
    }

    #[test]
    fn left_swipe_covers_the_swipe_distance() {
        let frames = script(&PositionerConfig::default());
        let palms: Vec<f32> = frames
            .iter()
            .flat_map(|f| f.hands.iter())
            .filter(|h| h.side == HandSide::Left)
            .map(|h| h.palm.x)
            .collect();
        let travelled = palms.first().copied().unwrap_or(0.0) - palms.last().copied().unwrap_or(0.0);
        assert!(travelled >= 135.0, "travelled {travelled}");
    }
}
