use moor_mud_common::{Faction, LocKey, Relation};
use moor_mud_world::Location;
use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::Engine;
use crate::scheduler::TimePhase;
use crate::session::{RoomHandleEntry, SessionState};

/// Renders the numeric-handle room view: description, time
/// phase, exits, players, objects, NPCs (friendly/neutral bucketed),
/// monsters (hostile bucketed). Refreshes the session's handle table so
/// `look 3`/`inspect 2` resolve against what was just shown.
pub async fn render_room_view(engine: &Arc<Engine>, session: &Arc<SessionState>) -> String {
    let locale = session.locale();
    let Some(coords) = session.coords() else {
        return engine
            .catalog
            .render(&locale, &LocKey::new("error.generic"));
    };
    let Some(room) = engine.world.get_room_at(coords) else {
        return engine
            .catalog
            .render(&locale, &LocKey::new("error.generic"));
    };

    let mut out = String::new();
    out.push_str(room.description.get(&locale));
    out.push('\n');
    out.push_str(match engine.scheduler.time_phase() {
            TimePhase::Day => "It is daytime.",
            TimePhase::Night => "It is nighttime.",
    });
    out.push('\n');

    let exits = engine.world.compute_exits(room.id).unwrap_or_default();
    let mut exit_names: Vec<&str> = exits.keys().map(|d| d.name()).collect();
    if engine.world.portal_target(room.id).is_some() {
        exit_names.push("enter");
    }
    exit_names.sort_unstable();
    out.push_str(&format!("Exits: {}\n", exit_names.join(", ")));

    let mut handle_table = HashMap::new();
    let mut next_handle = 1u32;

    let objects = engine.world.get_objects_in(&Location::Room(room.id));
    let mut object_lines = Vec::new();
    for obj in objects {
        handle_table.insert(next_handle, RoomHandleEntry::Object(obj.id));
        object_lines.push(format!(" [{}] {}", next_handle, obj.name.get(&locale)));
        next_handle += 1;
    }
    if !object_lines.is_empty() {
        out.push_str("Items here:\n");
        out.push_str(&object_lines.join("\n"));
        out.push('\n');
    }

    let viewer_faction = engine.viewer_faction(session).await;

    let npcs = engine.world.get_npcs_at(coords);
    if !npcs.is_empty() {
        out.push_str("NPCs here:\n");
        for npc in npcs {
            let relation = engine.relations.classify(&viewer_faction, &npc.faction);
            handle_table.insert(next_handle, RoomHandleEntry::Npc(npc.id));
            out.push_str(&format!(
                    " [{}] {} ({})\n",
                    next_handle,
                    npc.name.get(&locale),
                    relation_label(relation)
            ));
            next_handle += 1;
        }
    }

    let monsters = engine.world.get_monsters_at(coords);
    if !monsters.is_empty() {
        out.push_str("Monsters here:\n");
        for monster in monsters {
            handle_table.insert(next_handle, RoomHandleEntry::Monster(monster.id));
            out.push_str(&format!(
                    " [{}] {} (HP {}/{})\n",
                    next_handle,
                    monster.name.get(&locale),
                    monster.current_hp,
                    monster.stats.max_hp()
            ));
            next_handle += 1;
        }
    }

    let players: Vec<_> = engine
        .sessions
        .authenticated_at(coords)
        .into_iter()
        .filter(|s| s.id != session.id)
        .collect();
    if !players.is_empty() {
        out.push_str("Players here:\n");
        for other in &players {
            if let (Some(pid), Some(name)) = (other.player_id(), other.display_name()) {
                handle_table.insert(next_handle, RoomHandleEntry::Player(pid, name.clone()));
                out.push_str(&format!(" [{}] {}\n", next_handle, name));
                next_handle += 1;
            }
        }
    }

    session.set_room_handles(handle_table);
    out
}

fn relation_label(relation: Relation) -> &'static str {
    match relation {
        Relation::Friendly => "friendly",
        Relation::Neutral => "neutral",
        Relation::Hostile => "hostile",
    }
}

pub async fn send_room_view(engine: &Arc<Engine>, session: &Arc<SessionState>) {
    let view = render_room_view(engine, session).await;
    session.send_line(view);
}

impl Engine {
    pub async fn viewer_faction(&self, session: &Arc<SessionState>) -> Faction {
        if let Some(player_id) = session.player_id() {
            if let Ok(Some(player)) = self.players.find_by_id(player_id).await {
                return player.faction;
            }
        }
        Faction::new("player")
    }
}
