//! `plastey-middleware` – how the parts of a session talk to each other.
//!
//! # Modules
//!
//! - [`registry`] – [`Registry`][registry::Registry]: ordered, optionally
//!   whitelisted observer lists with shared state and per-observer panic
//!   isolation.  Fingers, hands and the session each own one.
//! - [`transport`] – [`Transport`][transport::Transport]: the blocking
//!   once-per-frame exchange with the remote peer, with a TCP implementation
//!   and a scripted in-process stand-in.

pub mod registry;
pub mod transport;

pub use registry::Registry;
pub use transport::{ScriptedTransport, TcpTransport, Transport};
