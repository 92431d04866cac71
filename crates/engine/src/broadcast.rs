use moor_mud_common::{Coords, LocKey};
use moor_mud_events::{Event, EventBus, EventKind};
use std::sync::Arc;

use crate::session::SessionManager;

/// Room-scoped and global message fan-out with per-recipient locale
/// rendering. Messages carry a [`LocKey`] rather than a
/// pre-rendered string so mixed-locale rooms render correctly for every
/// occupant.
pub struct BroadcastRouter {
    sessions: Arc<SessionManager>,
    catalog: Arc<dyn moor_mud_common::MessageCatalog>,
    bus: Arc<EventBus>,
}

impl BroadcastRouter {
    pub fn new(
        sessions: Arc<SessionManager>,
        catalog: Arc<dyn moor_mud_common::MessageCatalog>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            sessions,
            catalog,
            bus,
        }
    }

    /// Sends `msg` to every authenticated session at `coords`, excluding
    /// `exclude` if given.
    pub fn broadcast_to_room(
        &self,
        coords: Coords,
        msg: LocKey,
        exclude: Option<moor_mud_common::SessionId>,
    ) {
        for session in self.sessions.authenticated_at(coords) {
            if Some(session.id) != exclude {
                let rendered = self.catalog.render(&session.locale(), &msg);
                session.send_line(rendered);
            }
        }
        self.bus.publish(
            Event::new(EventKind::RoomBroadcast)
                .with_coords(coords)
                .with_data("key", msg.key),
        );
    }

    /// Sends `msg` to every authenticated session in the world.
    pub fn broadcast_to_all(&self, msg: LocKey) {
        for session in self.sessions.all_authenticated() {
            let rendered = self.catalog.render(&session.locale(), &msg);
            session.send_line(rendered);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moor_mud_common::DefaultCatalog;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn excluded_session_does_not_receive_its_own_broadcast() {
        let sessions = Arc::new(SessionManager::new());
        let bus = EventBus::new(10);
        let catalog: Arc<dyn moor_mud_common::MessageCatalog> = Arc::new(DefaultCatalog::new());
        let router = BroadcastRouter::new(sessions.clone(), catalog, bus);

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let s1 = Arc::new(crate::session::SessionState::new(
                moor_mud_common::SessionId::new(),
                tx1,
        ));
        *s1.phase.write().unwrap() = crate::session::SessionPhase::Authenticated;
        s1.set_coords(Coords::new(0, 0));
        sessions.register(s1.clone());

        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let s2 = Arc::new(crate::session::SessionState::new(
                moor_mud_common::SessionId::new(),
                tx2,
        ));
        *s2.phase.write().unwrap() = crate::session::SessionPhase::Authenticated;
        s2.set_coords(Coords::new(0, 0));
        sessions.register(s2.clone());

        router.broadcast_to_room(
            Coords::new(0, 0),
            LocKey::new("combat.aggro").param("monster", "rat").param("target", "alice"),
            Some(s1.id),
        );

        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }
}
