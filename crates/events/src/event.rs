use chrono::{DateTime, Utc};
use moor_mud_common::{Coords, SessionId};
use std::collections::HashMap;
use uuid::Uuid;

/// Discriminant used for subscriber routing. `SchedulerTick`'s interval
/// payload lives on `Event::interval`, not here, so it can still be
/// subscribed to as a single kind.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EventKind {
    PlayerConnected,
    PlayerDisconnected,
    PlayerLogin,
    PlayerLogout,
    PlayerCommand,
    PlayerMoved,
    RoomEntered,
    RoomLeft,
    RoomBroadcast,
    PlayerEmote,
    PlayerGive,
    PlayerFollow,
    ObjectPickedUp,
    ObjectDropped,
    ServerStarted,
    ServerStopping,
    SchedulerTick,
    WorldUpdated,
}

/// A single bus event. `data` is a free-form string map; it is the core's
/// answer to "this event carries whatever the publisher wants to say"
/// without the bus needing a variant per payload shape.
#[derive(Clone, Debug)]
pub struct Event {
    pub id: Uuid,
    pub kind: EventKind,
    pub source: Option<SessionId>,
    pub coords: Option<Coords>,
    pub target: Option<String>,
    pub data: HashMap<String, String>,
    pub interval: Option<u8>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            source: None,
            coords: None,
            target: None,
            data: HashMap::new(),
            interval: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: SessionId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_coords(mut self, coords: Coords) -> Self {
        self.coords = Some(coords);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_interval(mut self, interval: u8) -> Self {
        self.interval = Some(interval);
        self
    }
}
