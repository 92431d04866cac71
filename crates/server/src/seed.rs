use moor_mud_common::{Coords, Faction, LocalizedText, Stats};
use moor_mud_world::{
    DropEntry, EquipmentSlot, GameObject, Location, MonsterBehavior, MonsterTemplate,
    MonsterType, ObjectCategory, Room, ShopEntry, SpawnDescriptor,
};
use moor_mud_world::WorldStore;

/// Populates a brand-new [`WorldStore`] with a small but complete default
/// world: a five-room cross (town square plus one step in each cardinal
/// direction), a weapon template for sale at the square, and a goblin
/// template that spawns in the forest room. This is demo content, not
/// part of the engine's contract — a real deployment loads its own world
/// from the repository layer instead.
pub fn seed_default_world(world: &WorldStore) {
    let square = world
        .create_room(Room::new(
            Coords::new(0, 0),
            LocalizedText::new()
                .with("en", "The town square. Paths lead off in every direction.")
                .with("ko", "마을 광장입니다. 사방으로 길이 나 있습니다."),
        ))
        .expect("seed room should always be creatable");
    world.set_default_room(square);

    world
        .create_room(Room::new(
            Coords::new(0, 1),
            LocalizedText::new()
                .with("en", "A quiet chapel north of the square.")
                .with("ko", "광장 북쪽의 조용한 예배당입니다."),
        ))
        .unwrap();
    let forest = world
        .create_room(Room::new(
            Coords::new(0, -1),
            LocalizedText::new()
                .with("en", "The edge of a dark forest, south of the square.")
                .with("ko", "광장 남쪽, 어두운 숲의 가장자리입니다."),
        ))
        .unwrap();
    world
        .create_room(Room::new(
            Coords::new(1, 0),
            LocalizedText::new()
                .with("en", "A market street lined with shuttered stalls.")
                .with("ko", "문을 닫은 가판대들이 늘어선 시장 거리입니다."),
        ))
        .unwrap();
    world
        .create_room(Room::new(
            Coords::new(-1, 0),
            LocalizedText::new()
                .with("en", "A quiet residential lane.")
                .with("ko", "한적한 주택가 골목입니다."),
        ))
        .unwrap();

    let mut sword_template = GameObject::new(
        LocalizedText::new().with("en", "iron sword").with("ko", "철검"),
        LocalizedText::new()
            .with("en", "A well-balanced iron sword.")
            .with("ko", "균형 잡힌 철검입니다."),
        ObjectCategory::Weapon,
        Location::Room(square),
    );
    sword_template.equipment_slot = Some(EquipmentSlot::Weapon);
    sword_template
        .properties
        .insert("damage_bonus".to_string(), "3".to_string());
    world.register_item_template("iron_sword", sword_template);

    let shop_npc = moor_mud_world::Npc {
        id: moor_mud_common::NpcId::new(),
        name: LocalizedText::new().with("en", "Gareth the smith").with("ko", "대장장이 가레스"),
        description: LocalizedText::new()
            .with("en", "A soot-streaked smith minding his stall.")
            .with("ko", "그을음이 묻은 대장장이가 가판대를 지키고 있습니다."),
        coords: Coords::new(0, 0),
        dialogue: std::collections::HashMap::from([(
            "greeting".to_string(),
            LocalizedText::new()
                .with("en", "Welcome, traveler. Care to see my wares?")
                .with("ko", "어서 오세요, 여행자여. 물건 좀 보시겠소?"),
        )]),
        shop_inventory: vec![ShopEntry {
            item_template_id: "iron_sword".to_string(),
            price: 25,
            currency: "gold".to_string(),
        }],
        faction: Faction::new("townsfolk"),
        is_active: true,
        properties: std::collections::HashMap::new(),
    };
    world.put_npc(shop_npc);

    let goblin = MonsterTemplate {
        template_id: "goblin".to_string(),
        name: LocalizedText::new().with("en", "goblin").with("ko", "고블린"),
        description: LocalizedText::new()
            .with("en", "A snarling goblin, knife in hand.")
            .with("ko", "칼을 든 사나운 고블린입니다."),
        monster_type: MonsterType::Aggressive,
        behavior: MonsterBehavior::Roaming,
        stats: Stats {
            strength: 11,
            dexterity: 12,
            constitution: 9,
            intelligence: 7,
            wisdom: 7,
            charisma: 6,
            level: 2,
        },
        gold_reward: 5,
        drop_table: vec![DropEntry {
            item_template_id: "iron_sword".to_string(),
            drop_chance: 0.1,
            min_quantity: 1,
            max_quantity: 1,
        }],
        aggro_range: 1,
        roaming_range: 2,
        roam_chance: 0.3,
        respawn_delay_secs: 120,
        faction: Faction::new("goblins"),
        properties: std::collections::HashMap::new(),
    };
    world.register_template(goblin);
    world.set_global_cap("goblin", 3);
    world.set_spawn_points(
        forest,
        vec![SpawnDescriptor {
            template_id: "goblin".to_string(),
            max_per_room: 2,
            spawn_chance: 0.5,
        }],
    );
}
