//! [`Session`]: one sculpting session and its frame loop.
//!
//! Each call to [`Session::tick`] runs one display frame:
//!
//! 1. **Sample**: pull one tracking frame and, when a headset is attached,
//!    its latest pose.
//! 2. **Fuse**: map hands to scene roles and fingertips to scene space.  An
//!    invalid frame skips gesture processing but not the peer exchange, so
//!    both sides stay in lockstep.
//! 3. **Gestures**: write fingertips, release hands that vanished, classify
//!    grabs, then fire the two-handed and per-hand gesture observers.
//! 4. **Session observers**: the peer exchange and any externally
//!    registered observer.
//! 5. **Present**: flush the surface and age the status messages.
//!
//! The tracker running dry ends the session with [`Interrupt::Escape`]; a
//! restart requested locally or by the peer ends it with
//! [`Interrupt::Restart`].  [`Session::run`] also watches a pair of
//! [`Signals`] raised from outside the loop (Ctrl-C, console commands).
//!
//! # Example
//!
//! ```rust
//! use plastey_hal::sim::{SimMesh, SimPivot, SimText};
//! use plastey_hal::tracker::ReplayTracker;
//! use plastey_runtime::session::{Collaborators, FrameOutcome, Session, SessionConfig};
//! use plastey_types::{Interrupt, TrackingFrame};
//!
//! let collaborators = Collaborators {
//!     mesh: Box::new(SimMesh::grid(4, 4, 1.0)),
//!     tracker: Box::new(ReplayTracker::from_frames([TrackingFrame::new(Vec::new())])),
//!     head: None,
//!     text: Box::new(SimText::new()),
//!     pivot: Box::new(SimPivot::new()),
//!     transport: None,
//! };
//! let mut session = Session::new(SessionConfig::default(), collaborators).unwrap();
//! assert_eq!(session.tick(), FrameOutcome::Continue);
//! assert_eq!(session.tick(), FrameOutcome::Interrupted(Interrupt::Escape));
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use plastey_hal::mesh::VertexMesh;
use plastey_hal::pivot::Pivot;
use plastey_hal::text::TextSink;
use plastey_hal::tracker::{HandTracker, HeadTracker};
use plastey_kernel::{History, Surface};
use plastey_middleware::{Registry, Transport};
use plastey_perception::fusion::{CameraPose, HeadConfig, SensorFusion};
use plastey_perception::positioner::PositionerConfig;
use plastey_types::{Interrupt, MountMode, PlasteyError};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::gesture::{self, GestureConfig};
use crate::hand::Hands;
use crate::scene::{Palette, Scene};
use crate::snapshot::VertexSnapshot;
use crate::sync;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Everything a session needs to know up front.  Built once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mount: MountMode,
    pub history_capacity: usize,
    /// Pause between frames in [`Session::run`].
    pub frame_interval_ms: u64,
    /// Where [`Session::finish`] saves the surface, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
    pub positioner: PositionerConfig,
    pub head: HeadConfig,
    pub gesture: GestureConfig,
    pub palette: Palette,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mount: MountMode::default(),
            history_capacity: plastey_kernel::DEFAULT_CAPACITY,
            frame_interval_ms: 16,
            snapshot_path: None,
            positioner: PositionerConfig::default(),
            head: HeadConfig::default(),
            gesture: GestureConfig::default(),
            palette: Palette::default(),
        }
    }
}

/// External systems a session drives.
pub struct Collaborators {
    pub mesh: Box<dyn VertexMesh>,
    pub tracker: Box<dyn HandTracker>,
    pub head: Option<Box<dyn HeadTracker>>,
    pub text: Box<dyn TextSink>,
    pub pivot: Box<dyn Pivot>,
    pub transport: Option<Box<dyn Transport>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Session observers
// ────────────────────────────────────────────────────────────────────────────

/// Context handed to session-level observers once per frame.
pub struct SessionFrame<'a> {
    pub scene: &'a mut Scene,
    pub history: &'a mut History<Scene>,
    pub transport: Option<&'a mut (dyn Transport + 'static)>,
    /// Set by an observer to end the session after this frame.
    pub interrupt: &'a mut Option<Interrupt>,
}

/// State that persists across frames for session observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStates {
    /// Index of the frame being processed, starting at 1.
    pub frame: u64,
    pub restart_requested: bool,
    /// The peer link dropped; the session carries on alone.
    pub peer_lost: bool,
}

/// Flags raised from other threads and polled once per frame by
/// [`Session::run`].
#[derive(Debug, Default)]
pub struct Signals {
    /// End the session with [`Interrupt::Escape`].
    pub shutdown: AtomicBool,
    /// Restart the session on both sides.  Cleared when consumed.
    pub restart: AtomicBool,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn request_restart(&self) {
        self.restart.store(true, Ordering::SeqCst);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

pub type SessionObserver = dyn FnMut(&mut SessionFrame<'_>, &mut SessionStates);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Interrupted(Interrupt),
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

pub struct Session {
    id: Uuid,
    config: SessionConfig,
    fusion: SensorFusion,
    tracker: Box<dyn HandTracker>,
    head: Option<Box<dyn HeadTracker>>,
    transport: Option<Box<dyn Transport>>,
    hands: Hands,
    scene: Scene,
    history: History<Scene>,
    observers: Registry<&'static str, SessionObserver, SessionStates>,
    camera: Option<CameraPose>,
    frames: u64,
}

impl Session {
    /// Build a session and install the gesture and sync observers.
    ///
    /// # Errors
    ///
    /// Propagates [`PlasteyError::InvalidReference`] from observer
    /// registration.
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Result<Self, PlasteyError> {
        let Collaborators {
            mesh,
            tracker,
            head,
            text,
            pivot,
            transport,
        } = collaborators;

        let mut hands = Hands::new();
        gesture::install(&mut hands, config.gesture.mode)?;

        let mut observers = Registry::open("session");
        if transport.is_some() {
            observers.register(sync::SYNC, Box::new(sync::observe) as Box<SessionObserver>)?;
        }

        let mut scene = Scene::new(Surface::new(mesh), text, pivot, config.palette);
        scene.repaint_all();

        let id = Uuid::new_v4();
        info!(
            session = %id,
            mount = ?config.mount,
            vertices = scene.surface.len(),
            networked = transport.is_some(),
            "session started"
        );

        Ok(Self {
            id,
            fusion: SensorFusion::new(config.mount, config.positioner, config.head),
            history: History::with_capacity(config.history_capacity),
            config,
            tracker,
            head,
            transport,
            hands,
            scene,
            observers,
            camera: None,
            frames: 0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn hands(&self) -> &Hands {
        &self.hands
    }

    pub fn hands_mut(&mut self) -> &mut Hands {
        &mut self.hands
    }

    pub fn history(&self) -> &History<Scene> {
        &self.history
    }

    /// Latest camera pose derived from the headset.
    pub fn camera(&self) -> Option<CameraPose> {
        self.camera
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Register an extra session observer under `reference`.
    pub fn observe(&mut self, reference: &'static str, observer: Box<SessionObserver>) -> Result<(), PlasteyError> {
        self.observers.register(reference, observer)
    }

    /// End the session with [`Interrupt::Restart`] after the next frame and
    /// tell the peer to do the same.
    pub fn request_restart(&mut self) {
        info!(session = %self.id, "restart requested");
        self.observers.set_states(|s| s.restart_requested = true);
    }

    /// Restore vertex positions from a snapshot.
    pub fn restore(&mut self, snapshot: &VertexSnapshot) -> Result<usize, PlasteyError> {
        snapshot.apply(&mut self.scene.surface)
    }

    /// Run one frame.
    pub fn tick(&mut self) -> FrameOutcome {
        self.frames += 1;
        let span = info_span!("frame", session = %self.id, frame = self.frames);
        let _enter = span.enter();

        let Some(sample) = self.tracker.next_frame() else {
            info!("tracking input exhausted");
            return FrameOutcome::Interrupted(Interrupt::Escape);
        };
        let head = self.head.as_mut().and_then(|h| h.pose());

        match self.fusion.fuse(&sample, head) {
            Some(fused) => {
                if fused.camera.is_some() {
                    self.camera = fused.camera;
                }
                self.hands
                    .update(&fused, &mut self.scene, &mut self.history, &self.config.gesture);
            }
            None => warn!("invalid tracking frame; gestures skipped"),
        }

        let mut interrupt = None;
        let frame_index = self.frames;
        self.observers.set_states(|s| s.frame = frame_index);
        let mut frame = SessionFrame {
            scene: &mut self.scene,
            history: &mut self.history,
            transport: self.transport.as_deref_mut(),
            interrupt: &mut interrupt,
        };
        self.observers.fire_all(|observer, states| observer(&mut frame, states));

        // Nobody forwarded the request (offline session): restart locally.
        if self.observers.states().restart_requested {
            self.observers.set_states(|s| s.restart_requested = false);
            interrupt = Some(Interrupt::Restart);
        }

        self.scene.surface.update();
        self.scene.text.refresh();

        match interrupt {
            Some(i) => {
                info!(interrupt = ?i, "session interrupted");
                FrameOutcome::Interrupted(i)
            }
            None => FrameOutcome::Continue,
        }
    }

    /// Tick at the configured frame interval until an interrupt arrives or
    /// `signals.shutdown` is raised.  A raised `signals.restart` is turned
    /// into [`Session::request_restart`] before the next frame.
    pub fn run(&mut self, signals: &Signals) -> Interrupt {
        let interval = Duration::from_millis(self.config.frame_interval_ms);
        loop {
            if signals.shutdown_requested() {
                info!(session = %self.id, "shutdown requested");
                return Interrupt::Escape;
            }
            if signals.restart.swap(false, Ordering::SeqCst) {
                self.request_restart();
            }
            if let FrameOutcome::Interrupted(interrupt) = self.tick() {
                return interrupt;
            }
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
    }

    /// Close the peer link and save the snapshot, if one is configured.
    /// Returns where the snapshot went.
    pub fn finish(&mut self) -> Result<Option<PathBuf>, PlasteyError> {
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
        info!(session = %self.id, frames = self.frames, "session finished");
        let Some(path) = self.config.snapshot_path.clone() else {
            return Ok(None);
        };
        VertexSnapshot::capture(self.id, &self.scene.surface).save(&path)?;
        Ok(Some(path))
    }
}
