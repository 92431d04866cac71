use chrono::Utc;
use moor_mud_common::{Direction, LocKey};
use moor_mud_world::{Monster, MonsterBehavior};
use rand::Rng;
use std::sync::Arc;
use strum::IntoEnumIterator;

use crate::engine::Engine;

/// One pass of the monster lifecycle, driven by the scheduler's 30-second
/// tick: respawn, initial-spawn, then roaming.
pub async fn run_lifecycle_tick(engine: Arc<Engine>) {
    respawn_pass(&engine);
    initial_spawn_pass(&engine);
    roaming_pass(&engine).await;
}

fn respawn_pass(engine: &Arc<Engine>) {
    let now = Utc::now();
    for id in engine.world.all_monster_ids() {
        let Some(monster) = engine.world.get_monster(id) else {
            continue;
        };
        if monster.is_due_to_respawn(now) {
            let _ = engine.world.respawn_monster(id);
            tracing::debug!(monster_id = %id, "monster respawned");
        }
    }
}

fn initial_spawn_pass(engine: &Arc<Engine>) {
    let mut rng = rand::rng();
    for (room_id, descriptors) in engine.world.spawn_points() {
        let Some(room) = engine.world.get_room(room_id) else {
            continue;
        };
        for descriptor in descriptors {
            let Some(template) = engine.world.get_template(&descriptor.template_id) else {
                continue;
            };
            let alive_in_room = engine
                .world
                .get_monsters_at(room.coords)
                .into_iter()
                .filter(|m| m.template_id == descriptor.template_id)
                .count();
            if alive_in_room >= descriptor.max_per_room {
                continue;
            }
            if !rng.random_bool(descriptor.spawn_chance.clamp(0.0, 1.0)) {
                continue;
            }
            let instance = Monster::from_template(&template, room.coords);
            if engine.world.create_monster(instance).is_some() {
                tracing::debug!(template = %descriptor.template_id, room = %room_id, "monster spawned");
            }
        }
    }
}

async fn roaming_pass(engine: &Arc<Engine>) {
    let mut rng = rand::rng();
    for id in engine.world.all_monster_ids() {
        let Some(monster) = engine.world.get_monster(id) else {
            continue;
        };
        if !monster.is_alive {
            continue;
        }
        if !matches!(
            monster.behavior,
            MonsterBehavior::Roaming | MonsterBehavior::Territorial
        ) {
            continue;
        }
        if engine.combats.monster_in_combat(id) {
            continue;
        }
        if !rng.random_bool(monster.roam_chance.clamp(0.0, 1.0)) {
            continue;
        }
        let Some(dir) = pick_roam_direction(engine, &monster) else {
            continue;
        };
        let from = monster.current_coords;
        let to = dir.apply(from);
        let _ = engine.world.update_monster(id, |m| m.current_coords = to);

        let name = monster.name.get(&moor_mud_common::Locale::default_locale()).to_string();
        engine.broadcast.broadcast_to_room(
            from,
            LocKey::new("movement.left").param("name", &name).param("direction", dir.name()),
            None,
        );
        engine.broadcast.broadcast_to_room(
            to,
            LocKey::new("movement.entered")
                .param("name", &name)
                .param("direction", dir.opposite().name()),
            None,
        );
    }
}

/// Picks a random cardinal exit whose destination room exists and lies
/// within the monster's roaming area box.
fn pick_roam_direction(engine: &Arc<Engine>, monster: &Monster) -> Option<Direction> {
    let mut candidates = Vec::new();
    for dir in Direction::iter() {
        let target = dir.apply(monster.current_coords);
        if engine.world.get_room_at(target).is_none() {
            continue;
        }
        let dx = (target.x - monster.spawn_coords.x).abs();
        let dy = (target.y - monster.spawn_coords.y).abs();
        if dx.max(dy) <= monster.roaming_range {
            candidates.push(dir);
        }
    }
    if candidates.is_empty() {
        return None;
    }
    let idx = rand::rng().random_range(0..candidates.len());
    Some(candidates[idx])
}
