//! The authoritative world store (rooms, objects, monsters, NPCs) and the
//! repository traits that form the persistence boundary.

pub mod model;
pub mod repository;
pub mod store;

pub use model::{
    DropEntry, EquipmentSlot, GameObject, Location, Monster, MonsterBehavior, MonsterTemplate,
    MonsterType, Npc, ObjectCategory, Player, Room, ShopEntry, SpawnDescriptor,
};
pub use repository::{
    InMemoryRepositories, MonsterRepository, NpcRepository, ObjectRepository, PlayerRepository,
    RoomRepository,
};
pub use store::{IntegritySweepReport, WorldStore};
