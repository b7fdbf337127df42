//! The shared vertex set.
//!
//! Vertices are created once by the renderer and live for the whole
//! session; the core only moves and recolors them.  Ids are dense,
//! `0..len()`.

use plastey_types::{Color, PlasteyError, VertexId, Vec3};

/// A fixed-size set of renderable vertices.
pub trait VertexMesh {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: VertexId) -> bool {
        (id as usize) < self.len()
    }

    /// Current position, or `None` for an unknown id.
    fn position(&self, id: VertexId) -> Option<Vec3>;

    /// # Errors
    ///
    /// Returns [`PlasteyError::UnknownVertex`] if `id` is out of range.
    fn set_position(&mut self, id: VertexId, position: Vec3) -> Result<(), PlasteyError>;

    fn color(&self, id: VertexId) -> Option<Color>;

    /// # Errors
    ///
    /// Returns [`PlasteyError::UnknownVertex`] if `id` is out of range.
    fn set_color(&mut self, id: VertexId, color: Color) -> Result<(), PlasteyError>;

    /// Push pending position changes to the renderable representation.
    fn flush(&mut self);
}
