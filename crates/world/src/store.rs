use crate::model::{
    GameObject, Location, Monster, MonsterTemplate, MonsterType, Npc, Room, SpawnDescriptor,
};
use chrono::Utc;
use dashmap::DashMap;
use moor_mud_common::{Coords, Direction, MonsterId, MudError, MudResult, NpcId, ObjectId, RoomId};
use std::collections::HashMap;
use std::sync::RwLock;

/// The authoritative in-memory view of the world, the sole source every
/// mutation goes through. Every public method here is the only path to
/// mutating rooms, objects, monsters, and NPCs; coordinate indexes update
/// in the same call as the backing map, giving each aggregate its own
/// critical section without requiring a single global lock.
pub struct WorldStore {
    rooms: DashMap<RoomId, Room>,
    room_by_coords: DashMap<Coords, RoomId>,
    /// Optional `enter`-style portal connections, keyed by source coords.
    portals: DashMap<Coords, Coords>,
    objects: DashMap<ObjectId, GameObject>,
    monsters: DashMap<MonsterId, Monster>,
    npcs: DashMap<NpcId, Npc>,
    spawn_points: DashMap<RoomId, Vec<SpawnDescriptor>>,
    templates: DashMap<String, MonsterTemplate>,
    global_caps: DashMap<String, usize>,
    default_room: RwLock<Option<RoomId>>,
    /// Canonical item blueprints, keyed by template id. Seed/admin content
    /// populates this table; the core only knows how
    /// to clone a template into a fresh instance with a real location.
    item_templates: DashMap<String, GameObject>,
}

impl Default for WorldStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            room_by_coords: DashMap::new(),
            portals: DashMap::new(),
            objects: DashMap::new(),
            monsters: DashMap::new(),
            npcs: DashMap::new(),
            spawn_points: DashMap::new(),
            templates: DashMap::new(),
            global_caps: DashMap::new(),
            default_room: RwLock::new(None),
            item_templates: DashMap::new(),
        }
    }

    // ---- item templates ----------------------------------------------

    pub fn register_item_template(&self, template_id: impl Into<String>, blueprint: GameObject) {
        self.item_templates.insert(template_id.into(), blueprint);
    }

    pub fn get_item_template(&self, template_id: &str) -> Option<GameObject> {
        self.item_templates.get(template_id).map(|t| t.clone())
    }

    /// Clones a registered item template into a new instance at `location`,
    /// with a fresh id and the requested quantity.
    pub fn instantiate_item_template(
        &self,
        template_id: &str,
        location: Location,
        quantity: u32,
    ) -> Option<GameObject> {
        let mut instance = self.get_item_template(template_id)?;
        instance.id = moor_mud_common::ObjectId::new();
        instance.location = location;
        instance.quantity = quantity.max(1);
        Some(instance)
    }

    // ---- rooms -----------------------------------------------------

    pub fn set_default_room(&self, id: RoomId) {
        *self.default_room.write().unwrap() = Some(id);
    }

    pub fn default_room(&self) -> Option<RoomId> {
        *self.default_room.read().unwrap()
    }

    pub fn get_room(&self, id: RoomId) -> Option<Room> {
        self.rooms.get(&id).map(|r| r.clone())
    }

    pub fn get_room_at(&self, coords: Coords) -> Option<Room> {
        let id = *self.room_by_coords.get(&coords)?;
        self.get_room(id)
    }

    pub fn create_room(&self, room: Room) -> MudResult<RoomId> {
        if self.room_by_coords.contains_key(&room.coords) {
            return Err(MudError::user_input(format!(
                        "a room already exists at {}",
                        room.coords
            )));
        }
        let id = room.id;
        self.room_by_coords.insert(room.coords, id);
        self.rooms.insert(id, room);
        Ok(id)
    }

    pub fn update_room(&self, id: RoomId, patch: impl FnOnce(&mut Room)) -> MudResult<()> {
        let mut room = self
            .rooms
            .get_mut(&id)
            .ok_or_else(|| MudError::not_found(format!("room {id}")))?;
        let old_coords = room.coords;
        patch(&mut room);
        room.updated_at = Utc::now();
        if room.coords != old_coords {
            self.room_by_coords.remove(&old_coords);
            self.room_by_coords.insert(room.coords, id);
        }
        Ok(())
    }

    /// Deletes a room, first reassigning any room-located objects to the
    /// default room.
    pub fn delete_room(&self, id: RoomId) -> MudResult<()> {
        let room = self
            .rooms
            .remove(&id)
            .ok_or_else(|| MudError::not_found(format!("room {id}")))?
            .1;
        self.room_by_coords.remove(&room.coords);
        self.portals.remove(&room.coords);

        if let Some(default_room) = self.default_room() {
            if default_room != id {
                for mut obj in self.objects.iter_mut() {
                    if obj.location == Location::Room(id) {
                        obj.location = Location::Room(default_room);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn connect_portal(&self, from: Coords, to: Coords) {
        self.portals.insert(from, to);
    }

    /// Exits are derived on demand from coordinate adjacency, plus any
    /// portal connection registered for this room's coordinates.
    pub fn compute_exits(&self, room_id: RoomId) -> MudResult<HashMap<Direction, RoomId>> {
        let room = self
            .get_room(room_id)
            .ok_or_else(|| MudError::not_found(format!("room {room_id}")))?;
        let mut exits = HashMap::new();
        for dir in [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ] {
            let target_coords = dir.apply(room.coords);
            if let Some(target_id) = self.room_by_coords.get(&target_coords) {
                exits.insert(dir, *target_id);
            }
        }
        Ok(exits)
    }

    /// The `enter` portal target room, if any, from this room's coordinates.
    pub fn portal_target(&self, room_id: RoomId) -> Option<RoomId> {
        let room = self.get_room(room_id)?;
        let target_coords = *self.portals.get(&room.coords)?;
        let target_id = *self.room_by_coords.get(&target_coords)?;
        Some(target_id)
    }

    // ---- objects -----------------------------------------------------

    pub fn get_object(&self, id: ObjectId) -> Option<GameObject> {
        self.objects.get(&id).map(|o| o.clone())
    }

    pub fn put_object(&self, obj: GameObject) -> ObjectId {
        let id = obj.id;
        self.objects.insert(id, obj);
        id
    }

    pub fn remove_object(&self, id: ObjectId) -> Option<GameObject> {
        self.objects.remove(&id).map(|(_, o)| o)
    }

    pub fn get_objects_in(&self, location: &Location) -> Vec<GameObject> {
        self.objects
            .iter()
            .filter(|o| &o.location == location)
            .map(|o| o.clone())
            .collect()
    }

    /// Validates the target location exists before moving.
    pub fn move_object(&self, id: ObjectId, new_location: Location) -> MudResult<()> {
        match &new_location {
            Location::Room(room_id) => {
                if !self.rooms.contains_key(room_id) {
                    return Err(MudError::not_found(format!("room {room_id}")));
                }
            }
            Location::Container(container_id) => {
                if !self.objects.contains_key(container_id) {
                    return Err(MudError::not_found(format!("container {container_id}")));
                }
            }
            Location::Inventory(_) => {}
        }
        let mut obj = self
            .objects
            .get_mut(&id)
            .ok_or_else(|| MudError::not_found(format!("object {id}")))?;
        obj.location = new_location;
        Ok(())
    }

    // ---- monsters ------------------------------------------------------

    pub fn register_template(&self, template: MonsterTemplate) {
        self.templates.insert(template.template_id.clone(), template);
    }

    pub fn get_template(&self, template_id: &str) -> Option<MonsterTemplate> {
        self.templates.get(template_id).map(|t| t.clone())
    }

    pub fn set_spawn_points(&self, room_id: RoomId, descriptors: Vec<SpawnDescriptor>) {
        self.spawn_points.insert(room_id, descriptors);
    }

    pub fn spawn_points(&self) -> Vec<(RoomId, Vec<SpawnDescriptor>)> {
        self.spawn_points
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect()
    }

    pub fn set_global_cap(&self, template_id: impl Into<String>, max: usize) {
        self.global_caps.insert(template_id.into(), max);
    }

    pub fn global_cap(&self, template_id: &str) -> Option<usize> {
        self.global_caps.get(template_id).map(|v| *v)
    }

    pub fn global_cap_template_ids(&self) -> Vec<String> {
        self.global_caps.iter().map(|e| e.key().clone()).collect()
    }

    pub fn alive_count_for_template(&self, template_id: &str) -> usize {
        self.monsters
            .iter()
            .filter(|m| m.is_alive && m.template_id == template_id)
            .count()
    }

    pub fn get_monster(&self, id: MonsterId) -> Option<Monster> {
        self.monsters.get(&id).map(|m| m.clone())
    }

    pub fn get_monsters_at(&self, coords: Coords) -> Vec<Monster> {
        self.monsters
            .iter()
            .filter(|m| m.is_alive && m.current_coords == coords)
            .map(|m| m.clone())
            .collect()
    }

    pub fn all_monster_ids(&self) -> Vec<MonsterId> {
        self.monsters.iter().map(|m| *m.key()).collect()
    }

    /// Global cap aware creation: returns `None` without inserting if the
    /// template's cap is saturated (invariant 6).
    pub fn create_monster(&self, monster: Monster) -> Option<MonsterId> {
        if let Some(cap) = self.global_cap(&monster.template_id) {
            if self.alive_count_for_template(&monster.template_id) >= cap {
                return None;
            }
        }
        let id = monster.id;
        self.monsters.insert(id, monster);
        Some(id)
    }

    pub fn update_monster(&self, id: MonsterId, patch: impl FnOnce(&mut Monster)) -> MudResult<()> {
        let mut m = self
            .monsters
            .get_mut(&id)
            .ok_or_else(|| MudError::not_found(format!("monster {id}")))?;
        patch(&mut m);
        Ok(())
    }

    pub fn kill_monster(&self, id: MonsterId) -> MudResult<()> {
        let mut m = self
            .monsters
            .get_mut(&id)
            .ok_or_else(|| MudError::not_found(format!("monster {id}")))?;
        m.kill(Utc::now());
        Ok(())
    }

    pub fn respawn_monster(&self, id: MonsterId) -> MudResult<()> {
        let mut m = self
            .monsters
            .get_mut(&id)
            .ok_or_else(|| MudError::not_found(format!("monster {id}")))?;
        m.respawn();
        Ok(())
    }

    /// Oldest-first cull of instances above the global cap, used on boot
    /// and by the admin integrity-repair surface (invariant 6, S5).
    pub fn cull_excess_instances(&self, template_id: &str) -> Vec<MonsterId> {
        let Some(cap) = self.global_cap(template_id) else {
            return Vec::new();
        };
        let mut alive: Vec<Monster> = self
            .monsters
            .iter()
            .filter(|m| m.is_alive && m.template_id == template_id)
            .map(|m| m.clone())
            .collect();
        if alive.len() <= cap {
            return Vec::new();
        }
        alive.sort_by_key(|m| m.created_at);
        let excess = alive.len() - cap;
        let culled: Vec<MonsterId> = alive.iter().take(excess).map(|m| m.id).collect();
        for id in &culled {
            self.monsters.remove(id);
        }
        culled
    }

    // ---- npcs ------------------------------------------------------

    pub fn put_npc(&self, npc: Npc) -> NpcId {
        let id = npc.id;
        self.npcs.insert(id, npc);
        id
    }

    pub fn get_npc(&self, id: NpcId) -> Option<Npc> {
        self.npcs.get(&id).map(|n| n.clone())
    }

    pub fn get_npcs_at(&self, coords: Coords) -> Vec<Npc> {
        self.npcs
            .iter()
            .filter(|n| n.is_active && n.coords == coords)
            .map(|n| n.clone())
            .collect()
    }

    pub fn get_npcs_in_room(&self, room_id: RoomId) -> MudResult<Vec<Npc>> {
        let room = self
            .get_room(room_id)
            .ok_or_else(|| MudError::not_found(format!("room {room_id}")))?;
        Ok(self.get_npcs_at(room.coords))
    }

    // ---- integrity sweep -------------------------------------------

    /// Detects orphaned objects (location resolves to nothing) and
    /// relocates them to the default room; returns how many were repaired.
    /// Also culls any template over its global cap. Run on boot and
    /// on-demand from the admin surface.
    pub fn integrity_sweep(&self) -> IntegritySweepReport {
        let mut relocated_objects = 0usize;
        if let Some(default_room) = self.default_room() {
            for mut obj in self.objects.iter_mut() {
                let resolves = match &obj.location {
                    Location::Room(room_id) => self.rooms.contains_key(room_id),
                    Location::Container(container_id) => self.objects.contains_key(container_id),
                    Location::Inventory(_) => true,
                };
                if !resolves {
                    tracing::error!(object_id = %obj.id, "orphaned object, relocating to default room");
                    obj.location = Location::Room(default_room);
                    relocated_objects += 1;
                }
            }
        }

        let mut culled_monsters = 0usize;
        let template_ids: Vec<String> = self.global_caps.iter().map(|e| e.key().clone()).collect();
        for template_id in template_ids {
            culled_monsters += self.cull_excess_instances(&template_id).len();
        }

        IntegritySweepReport {
            relocated_objects,
            culled_monsters,
        }
    }

    pub fn aggressive_monster_at(&self, coords: Coords, excluding_in_combat: &[MonsterId]) -> Option<Monster> {
        self.monsters
            .iter()
            .find(|m| {
                m.is_alive
                    && m.current_coords == coords
                    && m.monster_type == MonsterType::Aggressive
                    && !excluding_in_combat.contains(m.key())
        })
            .map(|m| m.clone())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct IntegritySweepReport {
    pub relocated_objects: usize,
    pub culled_monsters: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use moor_mud_common::LocalizedText;

    fn room_at(x: i32, y: i32) -> Room {
        Room::new(Coords::new(x, y), LocalizedText::new().with("en", "a room"))
    }

    #[test]
    fn coords_uniquely_identify_a_room() {
        let store = WorldStore::new();
        store.create_room(room_at(0, 0)).unwrap();
        let err = store.create_room(room_at(0, 0));
        assert!(err.is_err());
    }

    #[test]
    fn exits_are_derived_from_adjacency() {
        let store = WorldStore::new();
        let a = store.create_room(room_at(0, 0)).unwrap();
        let b = store.create_room(room_at(0, 1)).unwrap();
        let exits = store.compute_exits(a).unwrap();
        assert_eq!(exits.get(&Direction::North), Some(&b));
        assert_eq!(exits.get(&Direction::South), None);
    }

    #[test]
    fn deleting_a_room_relocates_its_objects() {
        let store = WorldStore::new();
        let default_room = store.create_room(room_at(0, 0)).unwrap();
        store.set_default_room(default_room);
        let doomed = store.create_room(room_at(5, 5)).unwrap();
        let obj = GameObject::new(
            LocalizedText::new().with("en", "a rock"),
            LocalizedText::new(),
            crate::model::ObjectCategory::Misc,
            Location::Room(doomed),
        );
        let obj_id = store.put_object(obj);
        store.delete_room(doomed).unwrap();
        let relocated = store.get_object(obj_id).unwrap();
        assert_eq!(relocated.location, Location::Room(default_room));
    }

    #[test]
    fn global_cap_rejects_creation_beyond_limit() {
        let store = WorldStore::new();
        store.set_global_cap("rat", 1);
        let template = MonsterTemplate {
            template_id: "rat".to_string(),
            name: LocalizedText::new().with("en", "rat"),
            description: LocalizedText::new(),
            monster_type: MonsterType::Aggressive,
            behavior: crate::model::MonsterBehavior::Roaming,
            stats: Default::default(),
            gold_reward: 1,
            drop_table: vec![],
            aggro_range: 1,
            roaming_range: 3,
            roam_chance: 0.1,
            respawn_delay_secs: 60,
            faction: moor_mud_common::Faction::new("vermin"),
            properties: Default::default(),
        };
        let m1 = Monster::from_template(&template, Coords::new(0, 0));
        assert!(store.create_monster(m1).is_some());
        let m2 = Monster::from_template(&template, Coords::new(0, 0));
        assert!(store.create_monster(m2).is_none());
    }

    #[test]
    fn cull_removes_oldest_instances_first() {
        let store = WorldStore::new();
        store.set_global_cap("rat", 3);
        let template = MonsterTemplate {
            template_id: "rat".to_string(),
            name: LocalizedText::new().with("en", "rat"),
            description: LocalizedText::new(),
            monster_type: MonsterType::Aggressive,
            behavior: crate::model::MonsterBehavior::Roaming,
            stats: Default::default(),
            gold_reward: 1,
            drop_table: vec![],
            aggro_range: 1,
            roaming_range: 3,
            roam_chance: 0.1,
            respawn_delay_secs: 60,
            faction: moor_mud_common::Faction::new("vermin"),
            properties: Default::default(),
        };
        // Bypass the cap check directly to simulate 5 pre-existing rows.
        for i in 0..5 {
            let mut m = Monster::from_template(&template, Coords::new(0, 0));
            m.created_at = Utc::now() - chrono::Duration::seconds(5 - i);
            store.monsters.insert(m.id, m);
        }
        let culled = store.cull_excess_instances("rat");
        assert_eq!(culled.len(), 2);
        assert_eq!(store.alive_count_for_template("rat"), 3);
    }
}
