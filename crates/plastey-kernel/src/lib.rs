//! `plastey-kernel` – the rules the session state obeys.
//!
//! It does not recognise gestures; it owns the state gestures mutate and
//! enforces the invariants on it.
//!
//! # Modules
//!
//! - [`surface`] – [`Surface`][surface::Surface]: the shared vertex mesh plus
//!   the disjoint `selected` (local) and `locked` (remote) ownership sets.
//!   The only place ownership of a vertex can change.
//! - [`history`] – [`History`][history::History]: bounded undo/redo of
//!   discrete actions with a clamped cursor.

pub mod history;
pub mod surface;

pub use history::{History, Replay, DEFAULT_CAPACITY};
pub use surface::Surface;
