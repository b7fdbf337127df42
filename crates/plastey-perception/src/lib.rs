//! `plastey-perception` – from raw device samples to scene space.
//!
//! # Modules
//!
//! - [`positioner`] – [`Positioner`][positioner::Positioner]: the device
//!   geometry correction that maps tracker millimetres to scene units for a
//!   desk-mounted or head-mounted sensor.
//! - [`transform`] – rotation between two directions (Rodrigues form) and the
//!   dual-hand grab axis used to rotate and scale the scene pivot.
//! - [`fusion`] – [`SensorFusion`][fusion::SensorFusion]: combines a hand
//!   tracking frame and the head-mounted display pose into one
//!   [`FusedFrame`][fusion::FusedFrame] per display frame.

pub mod fusion;
pub mod positioner;
pub mod transform;

pub use fusion::{CameraPose, FusedFrame, FusedHand, HeadConfig, SensorFusion};
pub use positioner::{Positioner, PositionerConfig};
pub use transform::{GrabAxis, GrabDelta, rotation_between};
