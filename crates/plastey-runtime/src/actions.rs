//! Discrete, undoable actions.
//!
//! Every action is pushed as an `(undo, redo)` pair and then executed once
//! through [`History::perform`], so the first run and later replays share
//! one code path.  Replays prefix their status message and only report
//! ownership conflicts instead of treating them as failures, because the
//! peer may have locked the vertex in the meantime.

use plastey_kernel::{History, Replay};
use plastey_types::{SelectError, Vec3, VertexId};
use tracing::{debug, info};

use crate::scene::{Paint, Scene};

/// Select `id` if it is free, deselect it if it is ours.  Locked vertices
/// only produce a status message.
pub fn toggle_selection(scene: &mut Scene, history: &mut History<Scene>, id: VertexId) {
    if scene.surface.is_locked(id) {
        scene.say(&format!("Vertex {id} is locked by the other user"));
        return;
    }
    if scene.surface.is_selected(id) {
        history.push(select(id), deselect(id));
    } else {
        history.push(deselect(id), select(id));
    }
    history.perform(scene);
}

/// Record a finished drag of `id` from `from` to `to`.  The vertex is
/// already at `to`, so nothing is executed now.
pub fn record_move(history: &mut History<Scene>, id: VertexId, from: Vec3, to: Vec3) {
    history.push(move_to(id, from), move_to(id, to));
    debug!(vertex = id, "drag recorded");
}

/// Deselect every local vertex as one undoable action.
pub fn deselect_all(scene: &mut Scene, history: &mut History<Scene>) {
    let ids: Vec<VertexId> = scene.surface.selected().collect();
    if ids.is_empty() {
        scene.say("Nothing is selected");
        return;
    }
    let reselect = ids.clone();
    history.push(
        move |scene: &mut Scene, replay: Replay| {
            let restored = reselect
                .iter()
                .filter(|&&id| apply_select(scene, id).is_ok())
                .count();
            scene.say(&format!("{}{restored} vertices reselected", replay.prefix()));
        },
        move |scene: &mut Scene, replay: Replay| {
            for &id in &ids {
                if scene.surface.deselect(id).is_some() {
                    scene.paint(id, Paint::Base);
                }
            }
            scene.say(&format!("{}All vertices deselected", replay.prefix()));
        },
    );
    history.perform(scene);
}

/// Undo the last action, reporting an empty history on the HUD.
pub fn undo(scene: &mut Scene, history: &mut History<Scene>) {
    history.undo(scene, |scene| scene.say("Nothing to undo"));
}

/// Redo the next action, reporting an empty history on the HUD.
pub fn redo(scene: &mut Scene, history: &mut History<Scene>) {
    history.redo(scene, |scene| scene.say("Nothing to redo"));
}

// ────────────────────────────────────────────────────────────────────────────
// Action closures
// ────────────────────────────────────────────────────────────────────────────

fn apply_select(scene: &mut Scene, id: VertexId) -> Result<VertexId, SelectError> {
    let id = scene.surface.select(id)?;
    scene.paint(id, Paint::Selected);
    Ok(id)
}

fn select(id: VertexId) -> impl FnMut(&mut Scene, Replay) + 'static {
    move |scene, replay| match apply_select(scene, id) {
        Ok(_) => {
            info!(vertex = id, ?replay, "vertex selected");
            scene.say(&format!("{}Vertex {id} selected", replay.prefix()));
        }
        Err(e) => scene.say(&format!("{}{e}", replay.prefix())),
    }
}

fn deselect(id: VertexId) -> impl FnMut(&mut Scene, Replay) + 'static {
    move |scene, replay| {
        if scene.surface.deselect(id).is_some() {
            scene.paint(id, Paint::Base);
            info!(vertex = id, ?replay, "vertex deselected");
            scene.say(&format!("{}Vertex {id} deselected", replay.prefix()));
        }
    }
}

fn move_to(id: VertexId, position: Vec3) -> impl FnMut(&mut Scene, Replay) + 'static {
    move |scene, replay| {
        if scene.surface.is_locked(id) {
            scene.say(&format!("{}Vertex {id} is locked by the other user", replay.prefix()));
            return;
        }
        if scene.surface.set_position(id, position).is_ok() {
            scene.surface.update();
            scene.say(&format!("{}Vertex {id} moved", replay.prefix()));
        }
    }
}
