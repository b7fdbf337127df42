//! Ownership model of the shared vertices.
//!
//! Every vertex is in exactly one of three states: free, `selected` (owned
//! by the local operator) or `locked` (owned by the remote peer).  The two
//! sets are disjoint at all times.
//!
//! | Operation | Outcome |
//! |---|---|
//! | `select` on a locked vertex | [`SelectError::Locked`] |
//! | `select` on a selected vertex | [`SelectError::AlreadySelected`] |
//! | `lock` | always succeeds; a local selection of the vertex is dropped |
//! | `deselect` / `unlock` of an absent id | no-op, returns `None` |
//!
//! # Example
//!
//! ```rust
//! use plastey_hal::sim::SimMesh;
//! use plastey_kernel::surface::Surface;
//! use plastey_types::SelectError;
//!
//! let mut surface = Surface::new(Box::new(SimMesh::grid(2, 2, 1.0)));
//! surface.lock(0).unwrap();
//! assert_eq!(surface.select(0), Err(SelectError::Locked(0)));
//! assert_eq!(surface.select(1), Ok(1));
//! assert_eq!(surface.select(1), Err(SelectError::AlreadySelected(1)));
//! ```

use std::collections::BTreeSet;

use plastey_hal::mesh::VertexMesh;
use plastey_types::{Color, PlasteyError, SelectError, VertexId, VertexUpdate, Vec3};
use tracing::debug;

pub struct Surface {
    mesh: Box<dyn VertexMesh>,
    selected: BTreeSet<VertexId>,
    locked: BTreeSet<VertexId>,
}

impl Surface {
    pub fn new(mesh: Box<dyn VertexMesh>) -> Self {
        Self {
            mesh,
            selected: BTreeSet::new(),
            locked: BTreeSet::new(),
        }
    }

    // ── Vertex access ───────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.mesh.contains(id)
    }

    pub fn position(&self, id: VertexId) -> Option<Vec3> {
        self.mesh.position(id)
    }

    pub fn set_position(&mut self, id: VertexId, position: Vec3) -> Result<(), PlasteyError> {
        self.mesh.set_position(id, position)
    }

    pub fn color(&self, id: VertexId) -> Option<Color> {
        self.mesh.color(id)
    }

    pub fn set_color(&mut self, id: VertexId, color: Color) -> Result<(), PlasteyError> {
        self.mesh.set_color(id, color)
    }

    /// First vertex, in id order, whose position satisfies `predicate`.
    pub fn find_vertex(&self, mut predicate: impl FnMut(Vec3) -> bool) -> Option<VertexId> {
        (0..self.mesh.len() as VertexId)
            .find(|&id| self.mesh.position(id).is_some_and(&mut predicate))
    }

    /// Move every selected vertex by `offset`.
    pub fn translate_selected(&mut self, offset: Vec3) {
        for &id in &self.selected {
            if let Some(p) = self.mesh.position(id) {
                // ids in `selected` always exist
                let _ = self.mesh.set_position(id, p + offset);
            }
        }
    }

    /// Flush position changes to the renderable mesh.
    pub fn update(&mut self) {
        self.mesh.flush();
    }

    // ── Ownership ───────────────────────────────────────────────────────────

    pub fn select(&mut self, id: VertexId) -> Result<VertexId, SelectError> {
        if !self.mesh.contains(id) {
            return Err(SelectError::UnknownVertex(id));
        }
        if self.locked.contains(&id) {
            return Err(SelectError::Locked(id));
        }
        if !self.selected.insert(id) {
            return Err(SelectError::AlreadySelected(id));
        }
        debug!(vertex = id, "selected");
        Ok(id)
    }

    pub fn deselect(&mut self, id: VertexId) -> Option<VertexId> {
        self.selected.remove(&id).then_some(id)
    }

    /// Mark `id` as owned by the peer.
    ///
    /// Returns `true` when the lock displaced a local selection.
    ///
    /// # Errors
    ///
    /// Returns [`PlasteyError::UnknownVertex`] for an id outside the mesh.
    pub fn lock(&mut self, id: VertexId) -> Result<bool, PlasteyError> {
        if !self.mesh.contains(id) {
            return Err(PlasteyError::UnknownVertex(id));
        }
        self.locked.insert(id);
        let preempted = self.selected.remove(&id);
        if preempted {
            debug!(vertex = id, "peer lock displaced local selection");
        }
        Ok(preempted)
    }

    pub fn unlock(&mut self, id: VertexId) -> Option<VertexId> {
        self.locked.remove(&id).then_some(id)
    }

    /// Clear every lock and return the ids that were locked.
    pub fn unlock_all(&mut self) -> Vec<VertexId> {
        std::mem::take(&mut self.locked).into_iter().collect()
    }

    /// Clear the local selection and return the ids that were selected.
    pub fn deselect_all(&mut self) -> Vec<VertexId> {
        std::mem::take(&mut self.selected).into_iter().collect()
    }

    pub fn is_selected(&self, id: VertexId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_locked(&self, id: VertexId) -> bool {
        self.locked.contains(&id)
    }

    pub fn selected(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.selected.iter().copied()
    }

    pub fn locked(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.locked.iter().copied()
    }

    /// Current selection with positions, as sent to the peer.
    pub fn selection_payload(&self) -> Vec<VertexUpdate> {
        self.selected
            .iter()
            .filter_map(|&id| self.mesh.position(id).map(|p| VertexUpdate::new(id, p)))
            .collect()
    }

    /// Positions of every vertex, in id order.
    pub fn vertex_positions(&self) -> Vec<VertexUpdate> {
        (0..self.mesh.len() as VertexId)
            .filter_map(|id| self.mesh.position(id).map(|p| VertexUpdate::new(id, p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastey_hal::sim::SimMesh;

    fn surface() -> (Surface, SimMesh) {
        let mesh = SimMesh::grid(3, 3, 1.0);
        (Surface::new(Box::new(mesh.clone())), mesh)
    }

    #[test]
    fn locked_vertex_cannot_be_selected() {
        let (mut s, _) = surface();
        s.lock(2).unwrap();
        assert_eq!(s.select(2), Err(SelectError::Locked(2)));
        assert!(!s.is_selected(2));
    }

    #[test]
    fn selected_vertex_cannot_be_selected_twice() {
        let (mut s, _) = surface();
        assert_eq!(s.select(4), Ok(4));
        assert_eq!(s.select(4), Err(SelectError::AlreadySelected(4)));
    }

    #[test]
    fn unknown_vertex_is_rejected() {
        let (mut s, _) = surface();
        assert_eq!(s.select(99), Err(SelectError::UnknownVertex(99)));
        assert!(matches!(s.lock(99), Err(PlasteyError::UnknownVertex(99))));
    }

    #[test]
    fn deselect_and_unlock_are_idempotent() {
        let (mut s, _) = surface();
        s.select(1).unwrap();
        assert_eq!(s.deselect(1), Some(1));
        assert_eq!(s.deselect(1), None);
        assert_eq!(s.unlock(1), None);
    }

    #[test]
    fn lock_displaces_selection_keeping_sets_disjoint() {
        let (mut s, _) = surface();
        s.select(3).unwrap();
        assert!(s.lock(3).unwrap());
        assert!(s.is_locked(3));
        assert!(!s.is_selected(3));
        assert!(!s.lock(3).unwrap());
    }

    #[test]
    fn bulk_clears_return_previous_members() {
        let (mut s, _) = surface();
        s.select(5).unwrap();
        s.select(1).unwrap();
        s.lock(7).unwrap();
        assert_eq!(s.deselect_all(), vec![1, 5]);
        assert_eq!(s.unlock_all(), vec![7]);
        assert_eq!(s.selected().count(), 0);
        assert_eq!(s.locked().count(), 0);
    }

    #[test]
    fn local_and_peer_ownership_end_to_end() {
        let (mut s, _) = surface();
        assert_eq!(s.select(2), Ok(2));
        assert!(!s.lock(6).unwrap());

        assert_eq!(s.select(6), Err(SelectError::Locked(6)));
        assert_eq!(s.select(2), Err(SelectError::AlreadySelected(2)));

        assert_eq!(s.unlock_all(), vec![6]);
        assert_eq!(s.select(6), Ok(6));
        assert!(s.is_selected(2) && s.is_selected(6));
    }

    #[test]
    fn find_vertex_scans_in_id_order() {
        let (s, _) = surface();
        let hit = s.find_vertex(|p| p.y > 0.5);
        assert_eq!(hit, Some(6));
        assert_eq!(s.find_vertex(|p| p.z > 1.0), None);
    }

    #[test]
    fn translate_moves_only_selected() {
        let (mut s, mesh) = surface();
        s.select(0).unwrap();
        let before = mesh.position(1).unwrap();
        s.translate_selected(Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(mesh.position(0).unwrap().z, 2.0);
        assert_eq!(mesh.position(1).unwrap(), before);
    }

    #[test]
    fn payload_lists_selected_positions() {
        let (mut s, _) = surface();
        s.select(4).unwrap();
        let payload = s.selection_payload();
        assert_eq!(payload, vec![VertexUpdate::new(4, Vec3::zero())]);
    }

    #[test]
    fn update_flushes_mesh() {
        let (mut s, mesh) = surface();
        s.update();
        assert_eq!(mesh.flushes(), 1);
    }
}
