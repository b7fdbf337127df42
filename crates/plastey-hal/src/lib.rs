//! `plastey-hal` – the collaborators the gesture core talks to.
//!
//! The core never touches a renderer, a sensor SDK or a clock directly.  It
//! talks to the traits below, so a game engine, a hardware driver or an
//! in-process simulation can stand behind them interchangeably.
//!
//! # Modules
//!
//! - [`mesh`] – [`VertexMesh`][mesh::VertexMesh]: the shared, fixed-size
//!   vertex set (position and color per vertex).
//! - [`tracker`] – [`HandTracker`][tracker::HandTracker] and
//!   [`HeadTracker`][tracker::HeadTracker] sensor sources, plus a
//!   [`ReplayTracker`][tracker::ReplayTracker] for recorded sessions.
//! - [`clock`] – [`Clock`][clock::Clock]: monotonic seconds.
//! - [`text`] – [`TextSink`][text::TextSink] and the timed
//!   [`MessageLog`][text::MessageLog] shown on the HUD.
//! - [`pivot`] – [`Pivot`][pivot::Pivot]: the scene root rotated and scaled
//!   by two-handed grabs.
//! - [`sim`] – in-process stand-ins for headless tests and demos.

pub mod clock;
pub mod mesh;
pub mod pivot;
pub mod sim;
pub mod text;
pub mod tracker;

pub use clock::{Clock, SystemClock};
pub use mesh::VertexMesh;
pub use pivot::Pivot;
pub use text::{MessageLog, TextSink};
pub use tracker::{HandTracker, HeadTracker, ReplayTracker};
