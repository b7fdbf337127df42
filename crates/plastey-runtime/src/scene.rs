//! The state discrete actions operate on.
//!
//! [`Scene`] bundles the surface with the operator-facing collaborators
//! (status text, scene pivot) and the color palette.  It is the target type
//! of the session [`History`][plastey_kernel::History], so every undo/redo
//! closure receives `&mut Scene`.

use plastey_hal::pivot::Pivot;
use plastey_hal::text::TextSink;
use plastey_kernel::Surface;
use plastey_types::{Color, VertexId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Colors used for fingertips and vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub finger_base: Color,
    pub pick_active: Color,
    pub pinch_ok: Color,
    pub pinch_fail: Color,
    pub grab_active: Color,
    pub vertex_base: Color,
    pub vertex_selected: Color,
    pub vertex_locked: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            finger_base: Color(1.0, 1.0, 1.0, 1.0),
            pick_active: Color(0.0, 1.0, 0.0, 0.35),
            pinch_ok: Color(0.0, 1.0, 0.0, 0.35),
            pinch_fail: Color(1.0, 0.0, 0.0, 1.0),
            grab_active: Color(0.0, 0.0, 1.0, 1.0),
            vertex_base: Color(0.0, 0.073, 0.036, 1.0),
            vertex_selected: Color(0.0, 1.0, 0.448, 1.0),
            vertex_locked: Color(1.0, 0.448, 0.0, 1.0),
        }
    }
}

/// Ownership-driven vertex color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Base,
    Selected,
    Locked,
}

pub struct Scene {
    pub surface: Surface,
    pub text: Box<dyn TextSink>,
    pub pivot: Box<dyn Pivot>,
    pub palette: Palette,
}

impl Scene {
    pub fn new(surface: Surface, text: Box<dyn TextSink>, pivot: Box<dyn Pivot>, palette: Palette) -> Self {
        Self {
            surface,
            text,
            pivot,
            palette,
        }
    }

    pub fn say(&mut self, message: &str) {
        self.text.write(message);
    }

    pub fn paint(&mut self, id: VertexId, paint: Paint) {
        let color = match paint {
            Paint::Base => self.palette.vertex_base,
            Paint::Selected => self.palette.vertex_selected,
            Paint::Locked => self.palette.vertex_locked,
        };
        if let Err(e) = self.surface.set_color(id, color) {
            warn!(vertex = id, error = %e, "could not recolor vertex");
        }
    }

    /// Paint every vertex with the color of its current ownership.
    pub fn repaint_all(&mut self) {
        for id in 0..self.surface.len() as VertexId {
            let paint = if self.surface.is_selected(id) {
                Paint::Selected
            } else if self.surface.is_locked(id) {
                Paint::Locked
            } else {
                Paint::Base
            };
            self.paint(id, paint);
        }
    }
}
