//! In-process stand-ins for headless tests and the demo binary.
//!
//! Every sim type that a session takes ownership of is a cheap handle over
//! shared state, so a test can keep a clone and inspect what the session did.
//!
//! # Example
//!
//! ```rust
//! use plastey_hal::mesh::VertexMesh;
//! use plastey_hal::sim::SimMesh;
//! use plastey_types::Vec3;
//!
//! let mesh = SimMesh::grid(3, 3, 2.0);
//! assert_eq!(mesh.len(), 9);
//! assert_eq!(mesh.position(4), Some(Vec3::zero()));
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use plastey_types::{Color, HeadPose, Mat3, PlasteyError, VertexId, Vec3};

use crate::clock::Clock;
use crate::mesh::VertexMesh;
use crate::pivot::Pivot;
use crate::text::TextSink;
use crate::tracker::HeadTracker;

// ────────────────────────────────────────────────────────────────────────────
// Clock
// ────────────────────────────────────────────────────────────────────────────

/// A clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Mesh
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MeshState {
    positions: Vec<Vec3>,
    colors: Vec<Color>,
    flushes: usize,
}

/// A vertex set held in memory.
#[derive(Debug, Clone, Default)]
pub struct SimMesh {
    state: Rc<RefCell<MeshState>>,
}

impl SimMesh {
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        let colors = vec![Color::WHITE; positions.len()];
        Self {
            state: Rc::new(RefCell::new(MeshState {
                positions,
                colors,
                flushes: 0,
            })),
        }
    }

    /// A flat `cols × rows` grid on the scene XY plane, centred on the
    /// origin.  Ids run row by row.
    pub fn grid(cols: u32, rows: u32, spacing: f32) -> Self {
        let half_w = (cols.saturating_sub(1)) as f32 * spacing * 0.5;
        let half_h = (rows.saturating_sub(1)) as f32 * spacing * 0.5;
        let positions = (0..rows)
            .flat_map(|r| {
                (0..cols).map(move |c| {
                    Vec3::new(c as f32 * spacing - half_w, r as f32 * spacing - half_h, 0.0)
                })
            })
            .collect();
        Self::from_positions(positions)
    }

    /// How many times the mesh was flushed to the "renderer".
    pub fn flushes(&self) -> usize {
        self.state.borrow().flushes
    }
}

impl VertexMesh for SimMesh {
    fn len(&self) -> usize {
        self.state.borrow().positions.len()
    }

    fn position(&self, id: VertexId) -> Option<Vec3> {
        self.state.borrow().positions.get(id as usize).copied()
    }

    fn set_position(&mut self, id: VertexId, position: Vec3) -> Result<(), PlasteyError> {
        let mut state = self.state.borrow_mut();
        let slot = state
            .positions
            .get_mut(id as usize)
            .ok_or(PlasteyError::UnknownVertex(id))?;
        *slot = position;
        Ok(())
    }

    fn color(&self, id: VertexId) -> Option<Color> {
        self.state.borrow().colors.get(id as usize).copied()
    }

    fn set_color(&mut self, id: VertexId, color: Color) -> Result<(), PlasteyError> {
        let mut state = self.state.borrow_mut();
        let slot = state
            .colors
            .get_mut(id as usize)
            .ok_or(PlasteyError::UnknownVertex(id))?;
        *slot = color;
        Ok(())
    }

    fn flush(&mut self) {
        self.state.borrow_mut().flushes += 1;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pivot
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct PivotState {
    orientation: Mat3,
    scale: f32,
}

/// Records the accumulated orientation and scale of the scene root.
#[derive(Debug, Clone)]
pub struct SimPivot {
    state: Rc<Cell<PivotState>>,
}

impl Default for SimPivot {
    fn default() -> Self {
        Self {
            state: Rc::new(Cell::new(PivotState {
                orientation: Mat3::identity(),
                scale: 1.0,
            })),
        }
    }
}

impl SimPivot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orientation(&self) -> Mat3 {
        self.state.get().orientation
    }

    pub fn scale(&self) -> f32 {
        self.state.get().scale
    }
}

impl Pivot for SimPivot {
    fn apply_rotation(&mut self, euler: Vec3) {
        let mut state = self.state.get();
        state.orientation = Mat3::from_euler(euler).mul(&state.orientation);
        self.state.set(state);
    }

    fn apply_scale(&mut self, factor: f32) {
        let mut state = self.state.get();
        state.scale *= factor;
        self.state.set(state);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text
// ────────────────────────────────────────────────────────────────────────────

/// Keeps every message ever written, plus a count of clears.
#[derive(Debug, Clone, Default)]
pub struct SimText {
    written: Rc<RefCell<Vec<String>>>,
    clears: Rc<Cell<usize>>,
}

impl SimText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.written.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.written.borrow().last().cloned()
    }

    pub fn clears(&self) -> usize {
        self.clears.get()
    }
}

impl TextSink for SimText {
    fn write(&mut self, message: &str) {
        self.written.borrow_mut().push(message.to_string());
    }

    fn clear(&mut self) {
        self.clears.set(self.clears.get() + 1);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Head tracker
// ────────────────────────────────────────────────────────────────────────────

/// A headset that never moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedHead {
    pub pose: HeadPose,
}

impl HeadTracker for FixedHead {
    fn pose(&mut self) -> Option<HeadPose> {
        Some(self.pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_centred_and_row_major() {
        let mesh = SimMesh::grid(2, 2, 2.0);
        assert_eq!(mesh.position(0), Some(Vec3::new(-1.0, -1.0, 0.0)));
        assert_eq!(mesh.position(1), Some(Vec3::new(1.0, -1.0, 0.0)));
        assert_eq!(mesh.position(2), Some(Vec3::new(-1.0, 1.0, 0.0)));
        assert!(mesh.position(4).is_none());
    }

    #[test]
    fn unknown_vertex_is_rejected() {
        let mut mesh = SimMesh::grid(1, 1, 1.0);
        assert!(matches!(
            mesh.set_position(5, Vec3::zero()),
            Err(PlasteyError::UnknownVertex(5))
        ));
        assert!(mesh.set_color(5, Color::WHITE).is_err());
    }

    #[test]
    fn clones_share_state() {
        let mesh = SimMesh::grid(1, 1, 1.0);
        let mut handle = mesh.clone();
        handle.set_position(0, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        handle.flush();
        assert_eq!(mesh.position(0), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(mesh.flushes(), 1);
    }

    #[test]
    fn pivot_accumulates_scale_and_rotation() {
        let pivot = SimPivot::new();
        let mut handle = pivot.clone();
        handle.apply_scale(0.5);
        handle.apply_scale(3.0);
        handle.apply_rotation(Vec3::new(0.0, 0.0, 0.5));
        handle.apply_rotation(Vec3::new(0.0, 0.0, -0.5));
        assert!((pivot.scale() - 1.5).abs() < 1e-6);
        assert!(pivot.orientation().approx_eq(&Mat3::identity(), 1e-5));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        clock.clone().advance(1.5);
        assert!((clock.now() - 1.5).abs() < f64::EPSILON);
    }
}
