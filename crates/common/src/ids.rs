use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
                Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

uuid_id!(PlayerId, "Unique identifier for a registered player account.");
uuid_id!(RoomId, "Unique identifier for a room, independent of its (x, y).");
uuid_id!(ObjectId, "Unique identifier for a game object instance.");
uuid_id!(MonsterId, "Unique identifier for a live monster instance.");
uuid_id!(NpcId, "Unique identifier for an NPC instance.");
uuid_id!(SessionId, "Unique identifier for one connection's session.");
uuid_id!(CombatId, "Unique identifier for one active combat.");

/// Integer grid coordinate a room occupies. `(x, y)` uniquely identifies at
/// most one room (invariant 1 in).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
