//! Vertex snapshots: the sculpted surface saved as JSON.
//!
//! A snapshot stores every vertex position with the id of the session that
//! produced it.  Loading one back validates every id before any vertex is
//! moved, so a snapshot of a different mesh leaves the surface untouched.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use plastey_kernel::Surface;
use plastey_types::{PlasteyError, VertexUpdate};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub saved_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub vertices: Vec<VertexUpdate>,
}

impl VertexSnapshot {
    /// Capture the current positions of every vertex.
    pub fn capture(session_id: Uuid, surface: &Surface) -> Self {
        Self {
            saved_at: Utc::now(),
            session_id,
            vertices: surface.vertex_positions(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PlasteyError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| snapshot_err(path, e))?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|e| PlasteyError::Codec(e.to_string()))?;
        fs::write(path, raw).map_err(|e| snapshot_err(path, e))?;
        info!(path = %path.display(), vertices = self.vertices.len(), "snapshot saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PlasteyError> {
        let raw = fs::read_to_string(path).map_err(|e| snapshot_err(path, e))?;
        serde_json::from_str(&raw)
            .map_err(|e| PlasteyError::Snapshot(format!("{}: {e}", path.display())))
    }

    /// Move the surface's vertices to the saved positions.  Returns how
    /// many vertices were restored.
    ///
    /// # Errors
    ///
    /// Returns [`PlasteyError::UnknownVertex`] for the first id the surface
    /// does not contain; nothing is moved in that case.
    pub fn apply(&self, surface: &mut Surface) -> Result<usize, PlasteyError> {
        if let Some(unknown) = self.vertices.iter().find(|v| !surface.contains(v.id)) {
            return Err(PlasteyError::UnknownVertex(unknown.id));
        }
        for vertex in &self.vertices {
            surface.set_position(vertex.id, vertex.position)?;
        }
        surface.update();
        info!(session = %self.session_id, vertices = self.vertices.len(), "snapshot restored");
        Ok(self.vertices.len())
    }
}

fn snapshot_err(path: &Path, e: std::io::Error) -> PlasteyError {
    PlasteyError::Snapshot(format!("{}: {e}", path.display()))
}
