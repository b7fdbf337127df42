//! `plastey-runtime` – gestures, peer sync and the session frame loop.
//!
//! # Modules
//!
//! - [`session`] – [`Session`][session::Session]: owns the collaborators and
//!   runs one display frame per [`tick`][session::Session::tick]
//!   (sample → fuse → gestures → session observers → present).
//! - [`hand`] – [`Hands`][hand::Hands], [`Hand`][hand::Hand] and
//!   [`Finger`][hand::Finger]: per-frame hand state with observer registries
//!   for gesture events and finger attribute changes.
//! - [`gesture`] – the gesture observers: pick, pinch, single and dual grab,
//!   and the three swipe axes.  [`install`][gesture::install] wires them up
//!   for a [`GestureMode`][gesture::GestureMode].
//! - [`actions`] – undoable surface edits shared by the gestures.
//! - [`sync`] – per-frame selection exchange with the remote peer.
//! - [`snapshot`] – [`VertexSnapshot`][snapshot::VertexSnapshot]: the
//!   sculpted surface saved to and restored from JSON.
//! - [`scene`] – [`Scene`][scene::Scene]: the surface plus the status text,
//!   pivot and colour palette.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: the global
//!   `tracing` subscriber with an optional OTLP span exporter.

pub mod actions;
pub mod gesture;
pub mod hand;
pub mod scene;
pub mod session;
pub mod snapshot;
pub mod sync;
pub mod telemetry;

pub use gesture::{GestureConfig, GestureMode};
pub use hand::{Hand, Hands};
pub use scene::{Palette, Scene};
pub use session::{Collaborators, FrameOutcome, Session, SessionConfig, Signals};
pub use snapshot::VertexSnapshot;
pub use telemetry::{TracerProviderGuard, init_tracing};
