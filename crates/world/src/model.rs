use chrono::{DateTime, Utc};
use moor_mud_common::{
    Coords, Faction, LocalizedText, MonsterId, NpcId, ObjectId, PlayerId, RoomId, Stats,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A registered player account. Created at registration, mutated on
/// login/logout/move/combat, never destroyed by the core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub credential_hash: String,
    pub display_name: String,
    pub last_name_change: Option<DateTime<Utc>>,
    pub preferred_locale: String,
    pub is_admin: bool,
    pub last_room_id: Option<RoomId>,
    pub last_coords: Option<Coords>,
    pub stats: Stats,
    pub current_hp: i32,
    pub faction: Faction,
    pub quest_progress: HashMap<String, i64>,
    pub completed_quests: HashSet<String>,
    pub gold: i64,
}

impl Player {
    pub fn new(username: impl Into<String>, credential_hash: impl Into<String>) -> Self {
        let username = username.into();
        let stats = Stats::default();
        let max_hp = stats.max_hp();
        Self {
            id: PlayerId::new(),
            display_name: username.clone(),
            username,
            credential_hash: credential_hash.into(),
            last_name_change: None,
            preferred_locale: "en".to_string(),
            is_admin: false,
            last_room_id: None,
            last_coords: None,
            stats,
            current_hp: max_hp,
            faction: Faction::new("player"),
            quest_progress: HashMap::new(),
            completed_quests: HashSet::new(),
            gold: 0,
        }
    }

    /// 3-20 chars, alphanumeric + space + Hangul syllables.
    pub fn is_valid_display_name(name: &str) -> bool {
        let len = name.chars().count();
        if !(3..=20).contains(&len) {
            return false;
        }
        name.chars().all(|c| {
                c.is_ascii_alphanumeric() || c == ' ' || ('\u{AC00}'..='\u{D7A3}').contains(&c)
        })
    }

    /// Admins bypass only the 24h cooldown, never the validity rule.
    pub fn can_change_name(&self, now: DateTime<Utc>) -> bool {
        if self.is_admin {
            return true;
        }
        match self.last_name_change {
            None => true,
            Some(last) => now - last >= chrono::Duration::hours(24),
        }
    }

    pub fn hours_until_rename(&self, now: DateTime<Utc>) -> f64 {
        match self.last_name_change {
            None => 0.0,
            Some(last) => {
                let elapsed = (now - last).num_seconds() as f64 / 3600.0;
                (24.0 - elapsed).max(0.0)
            }
        }
    }
}

/// Identified by both an opaque id and a unique `(x, y)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub coords: Coords,
    pub description: LocalizedText,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(coords: Coords, description: LocalizedText) -> Self {
        let now = Utc::now();
        Self {
            id: RoomId::new(),
            coords,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum ObjectCategory {
    Weapon,
    Armor,
    Consumable,
    Misc,
    Container,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Trinket,
}

/// An object's single location: a room, a player's inventory, or a
/// container object.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Location {
    Room(RoomId),
    Inventory(PlayerId),
    Container(ObjectId),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameObject {
    pub id: ObjectId,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub category: ObjectCategory,
    pub weight: f32,
    pub equipment_slot: Option<EquipmentSlot>,
    pub is_equipped: bool,
    pub stackable: bool,
    pub max_stack: u32,
    pub quantity: u32,
    pub properties: HashMap<String, String>,
    pub location: Location,
}

impl GameObject {
    pub fn new(name: LocalizedText, description: LocalizedText, category: ObjectCategory, location: Location) -> Self {
        Self {
            id: ObjectId::new(),
            name,
            description,
            category,
            weight: 1.0,
            equipment_slot: None,
            is_equipped: false,
            stackable: false,
            max_stack: 1,
            quantity: 1,
            properties: HashMap::new(),
            location,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum MonsterType {
    Aggressive,
    Passive,
    Neutral,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum MonsterBehavior {
    Stationary,
    Roaming,
    Territorial,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DropEntry {
    pub item_template_id: String,
    pub drop_chance: f64,
    pub min_quantity: u32,
    pub max_quantity: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Monster {
    pub id: MonsterId,
    pub template_id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub monster_type: MonsterType,
    pub behavior: MonsterBehavior,
    pub stats: Stats,
    pub current_hp: i32,
    pub gold_reward: i64,
    pub drop_table: Vec<DropEntry>,
    pub spawn_coords: Coords,
    pub current_coords: Coords,
    pub aggro_range: i32,
    pub roaming_range: i32,
    pub roam_chance: f64,
    pub respawn_delay_secs: i64,
    pub is_alive: bool,
    pub last_death_time: Option<DateTime<Utc>>,
    pub faction: Faction,
    pub created_at: DateTime<Utc>,
    pub properties: HashMap<String, String>,
}

impl Monster {
    pub fn from_template(template: &MonsterTemplate, at: Coords) -> Self {
        let current_hp = template.stats.max_hp();
        let mut properties = template.properties.clone();
        properties.insert("template_id".to_string(), template.template_id.clone());
        Self {
            id: MonsterId::new(),
            template_id: template.template_id.clone(),
            name: template.name.clone(),
            description: template.description.clone(),
            monster_type: template.monster_type,
            behavior: template.behavior,
            stats: template.stats,
            current_hp,
            gold_reward: template.gold_reward,
            drop_table: template.drop_table.clone(),
            spawn_coords: at,
            current_coords: at,
            aggro_range: template.aggro_range,
            roaming_range: template.roaming_range,
            roam_chance: template.roam_chance,
            respawn_delay_secs: template.respawn_delay_secs,
            is_alive: true,
            last_death_time: None,
            faction: template.faction.clone(),
            created_at: Utc::now(),
            properties,
        }
    }

    /// Invariant 2: `is_alive=false ⇔ current_hp=0`.
    pub fn kill(&mut self, now: DateTime<Utc>) {
        self.is_alive = false;
        self.current_hp = 0;
        self.last_death_time = Some(now);
    }

    pub fn respawn(&mut self) {
        self.is_alive = true;
        self.current_hp = self.stats.max_hp();
        self.current_coords = self.spawn_coords;
    }

    pub fn is_due_to_respawn(&self, now: DateTime<Utc>) -> bool {
        if self.is_alive {
            return false;
        }
        match self.last_death_time {
            None => true,
            Some(died) => (now - died).num_seconds() >= self.respawn_delay_secs,
        }
    }
}

/// Canonical template a monster instance is cloned from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub template_id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub monster_type: MonsterType,
    pub behavior: MonsterBehavior,
    pub stats: Stats,
    pub gold_reward: i64,
    pub drop_table: Vec<DropEntry>,
    pub aggro_range: i32,
    pub roaming_range: i32,
    pub roam_chance: f64,
    pub respawn_delay_secs: i64,
    pub faction: Faction,
    pub properties: HashMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShopEntry {
    pub item_template_id: String,
    pub price: i64,
    pub currency: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub coords: Coords,
    pub dialogue: HashMap<String, LocalizedText>,
    pub shop_inventory: Vec<ShopEntry>,
    pub faction: Faction,
    pub is_active: bool,
    pub properties: HashMap<String, String>,
}

/// A spawn point descriptor: which template may appear in a room, how many
/// at once, and with what per-tick probability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpawnDescriptor {
    pub template_id: String,
    pub max_per_room: usize,
    pub spawn_chance: f64,
}
