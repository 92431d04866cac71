use moor_mud_common::{Direction, LocKey};
use moor_mud_events::{Event, EventKind};
use std::sync::Arc;

use crate::engine::Engine;
use crate::room_view::send_room_view;
use crate::session::SessionState;

#[derive(Eq, PartialEq, Debug)]
pub enum MoveOutcome {
    Moved,
    NoExit,
    InCombat,
}

/// Moves `session` one step in `dir`: the full choreography of
/// §4.5 — leave/enter narration, follower propagation, numeric-handle room
/// view, and the aggro check on arrival. Combat-gated: refuses while
/// `in_combat`.
pub async fn move_player_by_direction(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    dir: Direction,
) -> MoveOutcome {
    if session.in_combat() {
        return MoveOutcome::InCombat;
    }
    let Some(from) = session.coords() else {
        return MoveOutcome::NoExit;
    };
    let Some(target) = resolve_exit(engine, from, dir) else {
        return MoveOutcome::NoExit;
    };

    let mover_name = session.display_name().unwrap_or_default();
    relocate(engine, session, from, target).await;

    let dir_name = dir.name();
    engine.broadcast.broadcast_to_room(
        from,
        LocKey::new("movement.left")
            .param("name", &mover_name)
            .param("direction", dir_name),
        Some(session.id),
    );
    engine.broadcast.broadcast_to_room(
        target,
        LocKey::new("movement.entered")
            .param("name", &mover_name)
            .param("direction", dir.opposite().name()),
        Some(session.id),
    );

    propagate_followers(engine, &mover_name, from, dir).await;

    send_room_view(engine, session).await;
    maybe_trigger_aggro(engine, session, target).await;

    MoveOutcome::Moved
}

/// Resolves `dir` from `from` via derived exits, falling back to the
/// portal table for `enter`-style connections.
fn resolve_exit(
    engine: &Arc<Engine>,
    from: moor_mud_common::Coords,
    dir: Direction,
) -> Option<moor_mud_common::Coords> {
    let room = engine.world.get_room_at(from)?;
    let exits = engine.world.compute_exits(room.id).ok()?;
    let target_id = *exits.get(&dir)?;
    engine.world.get_room(target_id).map(|r| r.coords)
}

async fn relocate(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    from: moor_mud_common::Coords,
    to: moor_mud_common::Coords,
) {
    session.set_coords(to);
    if let Some(player_id) = session.player_id() {
        if let Ok(Some(mut player)) = engine.players.find_by_id(player_id).await {
            player.last_coords = Some(to);
            if let Some(room) = engine.world.get_room_at(to) {
                player.last_room_id = Some(room.id);
            }
            let _ = engine.players.update(player).await;
        }
    }
    engine.bus.publish(
        Event::new(EventKind::RoomLeft)
            .with_source(session.id)
            .with_coords(from),
    );
    engine.bus.publish(
        Event::new(EventKind::RoomEntered)
            .with_source(session.id)
            .with_coords(to),
    );
    engine
        .bus
        .publish(Event::new(EventKind::PlayerMoved).with_source(session.id).with_coords(to));
}

/// Single-hop follower propagation. A follower's own followers are not re-scanned here — each
/// mover's propagation pass only moves its *direct* followers once per
/// move, which is what prevents cycles without needing to detect them.
async fn propagate_followers(
    engine: &Arc<Engine>,
    leader_name: &str,
    from: moor_mud_common::Coords,
    dir: Direction,
) {
    for follower in engine.sessions.followers_of(leader_name, from) {
        let Some(target) = resolve_exit(engine, from, dir) else {
            *follower.following.write().unwrap() = None;
            follower.send_line(engine.catalog.render(
                    &follower.locale(),
                    &LocKey::new("movement.follow_failed").param("leader", leader_name),
            ));
            continue;
        };
        let follower_name = follower.display_name().unwrap_or_default();
        relocate(engine, &follower, from, target).await;
        engine.broadcast.broadcast_to_room(
            from,
            LocKey::new("movement.left")
                .param("name", &follower_name)
                .param("direction", dir.name()),
            Some(follower.id),
        );
        engine.broadcast.broadcast_to_room(
            target,
            LocKey::new("movement.entered")
                .param("name", &follower_name)
                .param("direction", dir.opposite().name()),
            Some(follower.id),
        );
        send_room_view(engine, &follower).await;
        maybe_trigger_aggro(engine, &follower, target).await;
    }
}

/// Asks the monster lifecycle for an aggressive, not-yet-engaged monster
/// at `coords` and, if found, initiates combat.
async fn maybe_trigger_aggro(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    coords: moor_mud_common::Coords,
) {
    if session.in_combat() {
        return;
    }
    let excluded = engine.combats.monster_ids_in_combat();
    let Some(monster) = engine.world.aggressive_monster_at(coords, &excluded) else {
        return;
    };
    let Some(player_id) = session.player_id() else {
        return;
    };
    let Ok(Some(player)) = engine.players.find_by_id(player_id).await else {
        return;
    };
    let monster_name = monster.name.get(&session.locale()).to_string();
    engine.broadcast.broadcast_to_room(
        coords,
        LocKey::new("combat.aggro")
            .param("monster", &monster_name)
            .param("target", player.display_name.clone()),
        None,
    );
    crate::combat::start_combat(
        engine,
        player_id,
        session.id,
        player.stats,
        player.current_hp,
        monster.id,
    )
        .await;
}
