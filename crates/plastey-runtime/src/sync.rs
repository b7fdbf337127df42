//! Per-frame selection exchange with the remote peer.
//!
//! [`observe`] is registered as the `"sync"` session observer when the
//! session has a transport.  Every frame it sends the local selection (or a
//! pending restart) and applies the peer's answer:
//!
//! - every vertex the peer holds is moved to the peer's position, locked
//!   and painted locked;
//! - vertices the peer held last frame but no longer reports are unlocked
//!   and painted base;
//! - a [`SyncMessage::Restart`] answer interrupts the session.
//!
//! A failed exchange is logged and leaves the lock state untouched, so one
//! dropped frame does not flicker the peer's selection.  A disconnect is
//! different: the peer will not come back within this session, so every
//! vertex it held is unlocked and the exchange stops.

use std::collections::BTreeSet;

use plastey_types::{Interrupt, PlasteyError, SyncMessage, VertexId, VertexUpdate};
use tracing::{debug, info, warn};

use crate::scene::{Paint, Scene};
use crate::session::{SessionFrame, SessionStates};

/// Session registry reference the sync observer is registered under.
pub const SYNC: &str = "sync";

pub fn observe(frame: &mut SessionFrame<'_>, states: &mut SessionStates) {
    if states.peer_lost {
        return;
    }
    let Some(transport) = frame.transport.as_deref_mut() else {
        return;
    };

    let restarting = std::mem::take(&mut states.restart_requested);
    let outgoing = if restarting {
        SyncMessage::Restart
    } else {
        SyncMessage::Selections(frame.scene.surface.selection_payload())
    };

    let reply = transport.transfer(&outgoing);
    if restarting {
        info!("restart sent to peer");
        *frame.interrupt = Some(Interrupt::Restart);
    }
    match reply {
        Ok(SyncMessage::Restart) => {
            info!("peer requested a restart");
            *frame.interrupt = Some(Interrupt::Restart);
        }
        Ok(SyncMessage::Selections(updates)) => apply_peer_selection(frame.scene, &updates),
        Err(PlasteyError::Disconnected(reason)) => {
            warn!(frame = states.frame, %reason, "peer disconnected; releasing its vertices");
            states.peer_lost = true;
            release_peer(frame.scene);
        }
        Err(e) => warn!(frame = states.frame, error = %e, "peer exchange failed; keeping previous locks"),
    }
}

/// Mirror the peer's selection into the local lock set.
pub fn apply_peer_selection(scene: &mut Scene, updates: &[VertexUpdate]) {
    let mut held = BTreeSet::new();
    for update in updates {
        if !scene.surface.contains(update.id) {
            warn!(vertex = update.id, "peer sent an unknown vertex");
            continue;
        }
        held.insert(update.id);
        if let Err(e) = scene.surface.set_position(update.id, update.position) {
            warn!(vertex = update.id, error = %e, "could not move peer vertex");
        }
        match scene.surface.lock(update.id) {
            Ok(true) => scene.say(&format!("Vertex {} was taken by the other user", update.id)),
            Ok(false) => {}
            Err(e) => warn!(vertex = update.id, error = %e, "could not lock peer vertex"),
        }
        scene.paint(update.id, Paint::Locked);
    }

    let released: Vec<VertexId> = scene.surface.locked().filter(|id| !held.contains(id)).collect();
    for id in released {
        scene.surface.unlock(id);
        scene.paint(id, Paint::Base);
    }
    if !updates.is_empty() {
        debug!(held = held.len(), "peer selection applied");
    }
    scene.surface.update();
}

/// Unlock everything the peer held.
pub fn release_peer(scene: &mut Scene) {
    let released = scene.surface.unlock_all();
    for &id in &released {
        scene.paint(id, Paint::Base);
    }
    scene.say("The other user left");
    debug!(released = released.len(), "peer locks released");
    scene.surface.update();
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastey_hal::VertexMesh;
    use crate::gesture::testing::{Rig, rig};
    use crate::scene::Palette;
    use plastey_kernel::History;
    use plastey_middleware::ScriptedTransport;
    use plastey_types::Vec3;

    fn exchange(scene: &mut Scene, transport: &mut ScriptedTransport, states: &mut SessionStates) -> Option<Interrupt> {
        let mut history = History::new();
        let mut interrupt = None;
        let mut frame = SessionFrame {
            scene,
            history: &mut history,
            transport: Some(transport),
            interrupt: &mut interrupt,
        };
        observe(&mut frame, states);
        interrupt
    }

    #[test]
    fn peer_selection_locks_and_moves_vertices() {
        let Rig { mut scene, mesh, .. } = rig();
        let script = ScriptedTransport::new();
        let moved = Vec3::new(1.0, 2.0, 3.0);
        script.reply(SyncMessage::Selections(vec![VertexUpdate::new(2, moved)]));
        scene.surface.select(5).unwrap();

        let mut states = SessionStates::default();
        assert_eq!(exchange(&mut scene, &mut script.clone(), &mut states), None);

        assert!(scene.surface.is_locked(2));
        assert_eq!(mesh.position(2), Some(moved));
        assert_eq!(mesh.color(2), Some(Palette::default().vertex_locked));
        let sent = script.sent();
        let SyncMessage::Selections(ours) = &sent[0] else {
            panic!("expected a selection payload, got {sent:?}");
        };
        assert_eq!(ours.iter().map(|u| u.id).collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn vertices_released_by_peer_are_unlocked() {
        let Rig { mut scene, mesh, .. } = rig();
        let script = ScriptedTransport::new();
        script
            .reply(SyncMessage::Selections(vec![VertexUpdate::new(1, Vec3::zero())]))
            .reply(SyncMessage::Selections(Vec::new()));
        let mut states = SessionStates::default();

        exchange(&mut scene, &mut script.clone(), &mut states);
        assert!(scene.surface.is_locked(1));
        exchange(&mut scene, &mut script.clone(), &mut states);
        assert!(!scene.surface.is_locked(1));
        assert_eq!(mesh.color(1), Some(Palette::default().vertex_base));
    }

    #[test]
    fn peer_lock_preempts_local_selection() {
        let Rig { mut scene, text, .. } = rig();
        scene.surface.select(3).unwrap();
        apply_peer_selection(&mut scene, &[VertexUpdate::new(3, Vec3::zero())]);
        assert!(scene.surface.is_locked(3));
        assert!(!scene.surface.is_selected(3));
        assert!(text.last().unwrap().contains("taken"));
    }

    #[test]
    fn transport_error_keeps_locks() {
        let Rig { mut scene, .. } = rig();
        let script = ScriptedTransport::new();
        script
            .reply(SyncMessage::Selections(vec![VertexUpdate::new(7, Vec3::zero())]))
            .fail("timed out");
        let mut states = SessionStates::default();

        exchange(&mut scene, &mut script.clone(), &mut states);
        exchange(&mut scene, &mut script.clone(), &mut states);
        assert!(scene.surface.is_locked(7));
    }

    #[test]
    fn disconnect_frees_peer_vertices_and_stops_exchanging() {
        let Rig { mut scene, mesh, text, .. } = rig();
        let script = ScriptedTransport::new();
        script.reply(SyncMessage::Selections(vec![VertexUpdate::new(7, Vec3::zero())]));
        let mut states = SessionStates::default();

        exchange(&mut scene, &mut script.clone(), &mut states);
        assert!(scene.surface.is_locked(7));

        script.hang_up();
        for _ in 0..3 {
            assert_eq!(exchange(&mut scene, &mut script.clone(), &mut states), None);
        }
        assert!(states.peer_lost);
        assert!(!scene.surface.is_locked(7));
        assert_eq!(mesh.color(7), Some(Palette::default().vertex_base));
        assert_eq!(text.last().as_deref(), Some("The other user left"));
        assert_eq!(scene.surface.select(7), Ok(7));
        assert_eq!(script.sent().len(), 1, "no exchange after the disconnect");
    }

    #[test]
    fn restart_is_sent_and_received() {
        let Rig { mut scene, .. } = rig();
        let script = ScriptedTransport::new();
        let mut states = SessionStates {
            restart_requested: true,
            ..SessionStates::default()
        };
        assert_eq!(exchange(&mut scene, &mut script.clone(), &mut states), Some(Interrupt::Restart));
        assert_eq!(script.sent(), vec![SyncMessage::Restart]);
        assert!(!states.restart_requested);

        script.reply(SyncMessage::Restart);
        assert_eq!(exchange(&mut scene, &mut script.clone(), &mut states), Some(Interrupt::Restart));
    }

    #[test]
    fn unknown_peer_vertex_is_ignored() {
        let Rig { mut scene, .. } = rig();
        apply_peer_selection(&mut scene, &[VertexUpdate::new(99, Vec3::zero())]);
        assert_eq!(scene.surface.locked().count(), 0);
    }
}
