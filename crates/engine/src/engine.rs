use moor_mud_common::{
    Config, Faction, FactionRelations, MessageCatalog, MonsterId, MudError, MudResult, ObjectId,
    PlayerId, RoomId, Stats,
};
use moor_mud_events::EventBus;
use moor_mud_world::{EquipmentSlot, GameObject, Location, Monster, ObjectCategory, WorldStore};
use std::sync::Arc;

use crate::broadcast::BroadcastRouter;
use crate::combat::CombatRegistry;
use crate::dispatcher::CommandDispatcher;
use crate::scheduler::Scheduler;
use crate::session::SessionManager;

/// Extension point fired once, on a freshly-registered player's first
/// successful login. The core ships content-free (`NoopWelcomeHook`);
/// quest/tutorial content is data-driven and lives outside this crate
/// per spec.md's quest/dialogue non-goal.
pub trait WelcomeHook: Send + Sync {
    /// Returns the lines to show the new player, if any.
    fn on_first_login(&self, player: &moor_mud_world::Player) -> Vec<String>;
}

pub struct NoopWelcomeHook;

impl WelcomeHook for NoopWelcomeHook {
    fn on_first_login(&self, _player: &moor_mud_world::Player) -> Vec<String> {
        Vec::new()
    }
}

/// The assembled engine: every subsystem (C1-C10) reachable from one
/// handle, passed around the workspace as `Arc<Engine>`.
pub struct Engine {
    pub config: Config,
    pub world: Arc<WorldStore>,
    pub bus: Arc<EventBus>,
    pub sessions: Arc<SessionManager>,
    pub combats: Arc<CombatRegistry>,
    pub broadcast: Arc<BroadcastRouter>,
    pub scheduler: Arc<Scheduler>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub catalog: Arc<dyn MessageCatalog>,
    pub players: Arc<dyn moor_mud_world::PlayerRepository>,
    pub relations: FactionRelations,
    pub default_respawn_room: RoomId,
    pub welcome_hook: Arc<dyn WelcomeHook>,
}

impl Engine {
    pub async fn player_stats(&self, player_id: PlayerId) -> MudResult<Stats> {
        let player = self
            .players
            .find_by_id(player_id)
            .await?
            .ok_or_else(|| MudError::not_found(format!("player {player_id}")))?;
        Ok(player.stats)
    }

    /// Bonus damage from the player's equipped weapon, if any
    ///. A weapon's `damage_bonus` property is an integer string;
    /// missing or unparseable defaults to 0.
    pub async fn equipped_weapon_bonus(&self, player_id: PlayerId) -> i32 {
        self.world
            .get_objects_in(&Location::Inventory(player_id))
            .into_iter()
            .find(|o| {
                o.is_equipped
                    && o.category == ObjectCategory::Weapon
                    && o.equipment_slot == Some(EquipmentSlot::Weapon)
        })
            .and_then(|o| o.properties.get("damage_bonus").cloned())
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(0)
    }

    /// Rolls the monster's drop table into the player's inventory (falling
    /// back to the room if a stack is full) and credits gold.
    pub async fn award_kill_rewards(&self, player_id: PlayerId, monster: &Monster) {
        let mut rng = rand::rng();
        use rand::Rng;
        for entry in &monster.drop_table {
            if !rng.random_bool(entry.drop_chance.clamp(0.0, 1.0)) {
                continue;
            }
            let quantity = if entry.max_quantity > entry.min_quantity {
                rng.random_range(entry.min_quantity..=entry.max_quantity)
            } else {
                entry.min_quantity.max(1)
            };
            let location = Location::Inventory(player_id);
            if let Some(item) =
            self.world
                .instantiate_item_template(&entry.item_template_id, location, quantity)
            {
                self.world.put_object(item);
            }
        }
        if let Ok(Some(mut player)) = self.players.find_by_id(player_id).await {
            player.gold += monster.gold_reward;
            let _ = self.players.update(player).await;
        }
    }

    /// Restores a defeated player to the default respawn room at
    /// `hp`. No items are dropped.
    pub async fn respawn_player_after_death(&self, player_id: PlayerId, hp: i32) {
        if let Ok(Some(mut player)) = self.players.find_by_id(player_id).await {
            player.current_hp = hp;
            if let Some(room) = self.world.get_room(self.default_respawn_room) {
                player.last_room_id = Some(room.id);
                player.last_coords = Some(room.coords);
            }
            let _ = self.players.update(player).await;
        }
        if let Some(session) = self.sessions.session_for_player(player_id) {
            if let Some(room) = self.world.get_room(self.default_respawn_room) {
                session.set_coords(room.coords);
            }
        }
    }

    /// Places a freshly-created item instance into a room or inventory;
    /// used by admin `spawnmonster`/`createobject` and the drop/get verbs.
    pub fn put_object(&self, object: GameObject) -> ObjectId {
        self.world.put_object(object)
    }

    pub async fn find_player_faction(&self, player_id: PlayerId) -> Faction {
        self.players
            .find_by_id(player_id)
            .await
            .ok()
            .flatten()
            .map(|p| p.faction)
            .unwrap_or_else(|| Faction::new("player"))
    }

    /// Runs the world integrity sweep and reports what it repaired.
    pub fn run_integrity_sweep(&self) -> moor_mud_world::IntegritySweepReport {
        self.world.integrity_sweep()
    }

    /// Culls any monster template over its configured global cap. Run on
    /// boot and by the admin surface on demand.
    pub fn cull_all_excess_instances(&self) -> usize {
        self.world
            .global_cap_template_ids()
            .iter()
            .map(|template_id| self.world.cull_excess_instances(template_id).len())
            .sum()
    }

    pub fn find_monster_at_by_name(&self, coords: moor_mud_common::Coords, needle: &str, locale: &moor_mud_common::Locale) -> Option<MonsterId> {
        let needle = needle.to_lowercase();
        self.world
            .get_monsters_at(coords)
            .into_iter()
            .find(|m| m.name.get(locale).to_lowercase().contains(&needle))
            .map(|m| m.id)
    }
}

pub fn default_player_stats() -> Stats {
    Stats::default()
}

pub fn spawn_into_room_or_inventory(
    world: &WorldStore,
    item: GameObject,
    player_id: PlayerId,
    room_id: RoomId,
) -> ObjectId {
    let at_capacity = world
        .get_objects_in(&Location::Inventory(player_id))
        .iter()
        .filter(|o| o.name.0 == item.name.0)
        .map(|o| o.quantity)
        .sum::<u32>()
    >= item.max_stack.max(1) * 64;
    let mut item = item;
    if at_capacity {
        item.location = Location::Room(room_id);
    } else {
        item.location = Location::Inventory(player_id);
    }
    world.put_object(item)
}
