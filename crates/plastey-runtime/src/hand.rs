//! Finger, Hand and Hands: the per-frame model of the operator's hands.
//!
//! A [`Finger`] is a fingertip marker.  Writing its position, scale or
//! color notifies the observers registered for that attribute, which is how
//! an external renderer follows the model.
//!
//! A [`Hand`] owns five fingers, the typed [`GestureState`] and a registry
//! of hand-level gesture observers.  [`Hands`] owns both hands plus the
//! dual-grab baseline and fires the two-handed gestures first, then each
//! visible hand's own gestures.
//!
//! # Example
//!
//! ```rust
//! use plastey_runtime::hand::{Finger, FingerAttribute};
//! use plastey_types::{FingerKind, Vec3};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let moved = Rc::new(Cell::new(0));
//! let seen = moved.clone();
//! let mut finger = Finger::new(FingerKind::Index);
//! finger
//!     .observe(FingerAttribute::Position, Box::new(move |_| seen.set(seen.get() + 1)))
//!     .unwrap();
//! finger.set_position(Vec3::new(1.0, 0.0, 0.0));
//! assert_eq!(moved.get(), 1);
//! ```

use plastey_kernel::History;
use plastey_middleware::Registry;
use plastey_perception::fusion::{FusedFrame, FusedHand};
use plastey_types::{Color, FingerKind, HandSide, PlasteyError, Vec3};
use tracing::{debug, warn};

use crate::gesture::{self, DualGrab, GestureConfig, GestureState, GrabStatus, HandFrame, HandsFrame};
use crate::scene::{Palette, Scene};

// ────────────────────────────────────────────────────────────────────────────
// Finger
// ────────────────────────────────────────────────────────────────────────────

/// Finger attributes that can be observed.  Visibility changes are silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerAttribute {
    Position,
    Scale,
    Color,
}

/// Snapshot of a finger handed to its observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerView {
    pub kind: FingerKind,
    pub position: Vec3,
    pub color: Color,
    pub scale: f32,
    pub visible: bool,
}

pub type FingerObserver = dyn FnMut(&FingerView);

pub struct Finger {
    view: FingerView,
    observers: Registry<FingerAttribute, FingerObserver>,
}

impl Finger {
    pub fn new(kind: FingerKind) -> Self {
        Self {
            view: FingerView {
                kind,
                position: Vec3::zero(),
                color: Color::WHITE,
                scale: kind.tip_scale(),
                visible: false,
            },
            observers: Registry::restricted(
                "finger",
                [FingerAttribute::Position, FingerAttribute::Scale, FingerAttribute::Color],
            ),
        }
    }

    pub fn view(&self) -> &FingerView {
        &self.view
    }

    pub fn kind(&self) -> FingerKind {
        self.view.kind
    }

    pub fn position(&self) -> Vec3 {
        self.view.position
    }

    pub fn color(&self) -> Color {
        self.view.color
    }

    pub fn observe(
        &mut self,
        attribute: FingerAttribute,
        observer: Box<FingerObserver>,
    ) -> Result<(), PlasteyError> {
        self.observers.register(attribute, observer)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.view.position = position;
        self.notify(FingerAttribute::Position);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.view.scale = scale;
        self.notify(FingerAttribute::Scale);
    }

    pub fn set_color(&mut self, color: Color) {
        self.view.color = color;
        self.notify(FingerAttribute::Color);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.view.visible = visible;
    }

    fn notify(&mut self, attribute: FingerAttribute) {
        let view = self.view;
        if let Err(e) = self.observers.fire(&attribute, |observer, _| observer(&view)) {
            warn!(error = %e, "finger notification failed");
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Hand
// ────────────────────────────────────────────────────────────────────────────

/// Hand-level gesture events, fired in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandEvent {
    Grab,
    Pick,
    Pinch,
    SwipeLeftRight,
    SwipeUpDown,
    SwipeFrontBack,
}

impl HandEvent {
    pub const ALL: [HandEvent; 6] = [
        HandEvent::Grab,
        HandEvent::Pick,
        HandEvent::Pinch,
        HandEvent::SwipeLeftRight,
        HandEvent::SwipeUpDown,
        HandEvent::SwipeFrontBack,
    ];
}

pub type HandObserver = dyn FnMut(&mut HandFrame<'_>);

/// Everything a hand gesture may read or change about its own hand.
pub struct HandState {
    side: HandSide,
    fingers: [Finger; 5],
    palm: Vec3,
    visible: bool,
    color: Color,
    pub gesture: GestureState,
}

impl HandState {
    pub fn new(side: HandSide) -> Self {
        Self {
            side,
            fingers: FingerKind::ALL.map(Finger::new),
            palm: Vec3::zero(),
            visible: false,
            color: Color::WHITE,
            gesture: GestureState::default(),
        }
    }

    pub fn side(&self) -> HandSide {
        self.side
    }

    pub fn finger(&self, kind: FingerKind) -> &Finger {
        &self.fingers[kind.index()]
    }

    pub fn finger_mut(&mut self, kind: FingerKind) -> &mut Finger {
        &mut self.fingers[kind.index()]
    }

    /// Scene position of a fingertip.
    pub fn tip(&self, kind: FingerKind) -> Vec3 {
        self.finger(kind).position()
    }

    /// Raw palm position in tracker millimetres.
    pub fn palm(&self) -> Vec3 {
        self.palm
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Color every finger.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        for finger in &mut self.fingers {
            finger.set_color(color);
        }
    }

    pub fn paint_fingers(&mut self, kinds: &[FingerKind], color: Color) {
        for &kind in kinds {
            self.finger_mut(kind).set_color(color);
        }
    }

    /// Copy this frame's samples into the fingers.
    pub fn track(&mut self, hand: &FusedHand) {
        if !self.visible {
            debug!(side = ?self.side, "hand appeared");
            self.visible = true;
            for finger in &mut self.fingers {
                finger.set_visible(true);
            }
        }
        self.palm = hand.palm;
        for kind in FingerKind::ALL {
            self.fingers[kind.index()].set_position(hand.tip(kind));
        }
    }

    pub fn hide(&mut self) {
        debug!(side = ?self.side, "hand lost");
        self.visible = false;
        for finger in &mut self.fingers {
            finger.set_visible(false);
        }
    }

    /// Recompute `grabbing` from the fingertip distances and recolor the
    /// hand on a transition.  Returns the new value.
    pub fn classify_grab(&mut self, config: &GestureConfig, palette: &Palette) -> bool {
        let thumb = self.tip(FingerKind::Thumb);
        let grabbing = thumb.distance(self.tip(FingerKind::Index)) < config.grab_release_distance
            && thumb.distance(self.tip(FingerKind::Middle)) < config.grab_release_distance;
        if grabbing != self.gesture.grabbing {
            debug!(side = ?self.side, grabbing, "grab transition");
            self.gesture.grabbing = grabbing;
            self.set_color(if grabbing {
                palette.grab_active
            } else {
                palette.finger_base
            });
        }
        grabbing
    }
}

pub struct Hand {
    pub state: HandState,
    observers: Registry<HandEvent, HandObserver>,
}

impl Hand {
    pub fn new(side: HandSide) -> Self {
        Self {
            state: HandState::new(side),
            observers: Registry::restricted("hand", HandEvent::ALL),
        }
    }

    pub fn observe(&mut self, event: HandEvent, observer: Box<HandObserver>) -> Result<(), PlasteyError> {
        self.observers.register(event, observer)
    }

    pub fn observers(&self) -> usize {
        self.observers.len()
    }

    /// Run every hand-level gesture observer once.
    pub fn fire(
        &mut self,
        scene: &mut Scene,
        history: &mut History<Scene>,
        config: &GestureConfig,
        grab: GrabStatus,
    ) -> usize {
        let mut frame = HandFrame {
            hand: &mut self.state,
            scene,
            history,
            config,
            grab,
        };
        self.observers.fire_all(|observer, _| observer(&mut frame))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Hands
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandsEvent {
    Grab,
}

pub type HandsObserver = dyn FnMut(&mut HandsFrame<'_>);

pub struct Hands {
    pub left: Hand,
    pub right: Hand,
    pub dual: DualGrab,
    observers: Registry<HandsEvent, HandsObserver>,
}

impl Default for Hands {
    fn default() -> Self {
        Self::new()
    }
}

impl Hands {
    pub fn new() -> Self {
        Self {
            left: Hand::new(HandSide::Left),
            right: Hand::new(HandSide::Right),
            dual: DualGrab::default(),
            observers: Registry::restricted("hands", [HandsEvent::Grab]),
        }
    }

    pub fn hand(&self, side: HandSide) -> &Hand {
        match side {
            HandSide::Left => &self.left,
            HandSide::Right => &self.right,
        }
    }

    pub fn hand_mut(&mut self, side: HandSide) -> &mut Hand {
        match side {
            HandSide::Left => &mut self.left,
            HandSide::Right => &mut self.right,
        }
    }

    pub fn observe(&mut self, event: HandsEvent, observer: Box<HandsObserver>) -> Result<(), PlasteyError> {
        self.observers.register(event, observer)
    }

    /// Drive one frame of gesture recognition from a fused sample.
    pub fn update(
        &mut self,
        fused: &FusedFrame,
        scene: &mut Scene,
        history: &mut History<Scene>,
        config: &GestureConfig,
    ) {
        for side in [HandSide::Left, HandSide::Right] {
            let state = &mut self.hand_mut(side).state;
            match fused.hand(side) {
                Some(sample) => state.track(sample),
                None if state.is_visible() => {
                    gesture::release_hand(state, scene, history);
                    state.hide();
                }
                None => {}
            }
        }

        let palette = scene.palette;
        let mut grab = GrabStatus::default();
        if self.left.state.is_visible() {
            grab.left = self.left.state.classify_grab(config, &palette);
        }
        if self.right.state.is_visible() {
            grab.right = self.right.state.classify_grab(config, &palette);
        }

        let mut frame = HandsFrame {
            left: &mut self.left.state,
            right: &mut self.right.state,
            dual: &mut self.dual,
            scene: &mut *scene,
            history: &mut *history,
            config,
            grab,
        };
        self.observers.fire_all(|observer, _| observer(&mut frame));

        for hand in [&mut self.left, &mut self.right] {
            if hand.state.is_visible() {
                hand.fire(scene, history, config, grab);
            }
        }
    }
}
