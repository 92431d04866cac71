//! Shared identifiers, error taxonomy, locale, configuration, and stat
//! formulas used across the moor-mud core engine crates.

pub mod config;
pub mod direction;
pub mod error;
pub mod faction;
pub mod ids;
pub mod locale;
pub mod stats;

pub use config::Config;
pub use direction::{Direction, RESERVED_DIRECTION_ALIASES};
pub use error::{MudError, MudResult};
pub use faction::{Faction, FactionRelations, Relation};
pub use ids::{Coords, MonsterId, NpcId, ObjectId, PlayerId, RoomId, SessionId, CombatId};
pub use locale::{DefaultCatalog, LocKey, Locale, LocalizedText, MessageCatalog};
pub use stats::Stats;
