use std::sync::Arc;

use moor_mud_common::LocKey;

use crate::dispatcher::{CombatGate, CommandDispatcher, CommandOutcome, CommandSpec};
use crate::engine::Engine;
use crate::movement::{move_player_by_direction, MoveOutcome};
use crate::room_view::{render_room_view, send_room_view};
use crate::session::{RoomHandleEntry, SessionState};

pub fn register(dispatcher: &Arc<CommandDispatcher>) {
    dispatcher.register(
        CommandSpec {
            name: "north",
            aliases: vec!["n"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Move north.",
        },
        noop_movement_handler(),
    );
    dispatcher.register(
        CommandSpec {
            name: "south",
            aliases: vec!["s"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Move south.",
        },
        noop_movement_handler(),
    );
    dispatcher.register(
        CommandSpec {
            name: "east",
            aliases: vec!["e"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Move east.",
        },
        noop_movement_handler(),
    );
    dispatcher.register(
        CommandSpec {
            name: "west",
            aliases: vec!["w"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Move west.",
        },
        noop_movement_handler(),
    );

    dispatcher.register(
        CommandSpec {
            name: "look",
            aliases: vec!["l"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Look at the room, or `look <n>` to inspect a numbered entry.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_look(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "enter",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Enter a portal connection from this room, if one exists.",
        },
        Arc::new(|engine, session, _args| Box::pin(handle_enter(engine, session))),
    );
}

/// `north`/`south`/`east`/`west` are resolved by the dispatcher itself
/// before registry lookup; these registrations
/// exist only so `help` and alias-collision stripping see them, and are
/// never actually invoked.
fn noop_movement_handler() -> crate::dispatcher::HandlerFn {
    Arc::new(|_engine, _session, _args| {
            Box::pin(async { CommandOutcome::error_plain("movement is handled before dispatch") })
    })
}

/// Direction commands bypass the registry entirely (the dispatcher
/// recognizes `n/s/e/w` and their full names before ever calling
/// `lookup`); this is the actual handler it invokes.
pub async fn handle_direction(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    dir: moor_mud_common::Direction,
) {
    match move_player_by_direction(engine, session, dir).await {
        MoveOutcome::Moved => {}
        MoveOutcome::NoExit => {
            let msg = engine.catalog.render(
                &session.locale(),
                &LocKey::new("movement.no_exit").param("direction", dir.name()),
            );
            session.send_line(msg);
        }
        MoveOutcome::InCombat => {
            let msg = engine
                .catalog
                .render(&session.locale(), &LocKey::new("movement.in_combat"));
            session.send_line(msg);
        }
    }
}

async fn handle_look(
    engine: Arc<Engine>,
    session: Arc<SessionState>,
    args: Vec<String>,
) -> CommandOutcome {
    let Some(handle_arg) = args.first() else {
        let view = render_room_view(&engine, &session).await;
        return CommandOutcome::success(view);
    };
    let Ok(n) = handle_arg.parse::<u32>() else {
        return CommandOutcome::error_plain("Usage: look [number]");
    };
    describe_handle(&engine, &session, n).await
}

async fn handle_enter(engine: Arc<Engine>, session: Arc<SessionState>) -> CommandOutcome {
    if session.in_combat() {
        return CommandOutcome::error_loc(LocKey::new("movement.in_combat"));
    }
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(room) = engine.world.get_room_at(coords) else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(target_id) = engine.world.portal_target(room.id) else {
        return CommandOutcome::error_loc(
            LocKey::new("movement.no_exit").param("direction", "in"),
        );
    };
    let Some(target_room) = engine.world.get_room(target_id) else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };

    session.set_coords(target_room.coords);
    if let Some(player_id) = session.player_id() {
        if let Ok(Some(mut player)) = engine.players.find_by_id(player_id).await {
            player.last_coords = Some(target_room.coords);
            player.last_room_id = Some(target_room.id);
            let _ = engine.players.update(player).await;
        }
    }
    send_room_view(&engine, &session).await;
    CommandOutcome::info("You step through.")
}

/// Resolves the numbered entry from the session's last room-view handle
/// table into a short description.
async fn describe_handle(engine: &Arc<Engine>, session: &Arc<SessionState>, n: u32) -> CommandOutcome {
    let Some(entry) = session.resolve_handle(n) else {
        return CommandOutcome::error_plain("Nothing matches that number here.");
    };
    let locale = session.locale();
    let text = match entry {
        RoomHandleEntry::Object(id) => engine
            .world
            .get_object(id)
            .map(|o| o.description.get(&locale).to_string())
            .unwrap_or_else(|| "It's gone.".to_string()),
        RoomHandleEntry::Monster(id) => engine
            .world
            .get_monster(id)
            .map(|m| format!("{}\nHP: {}/{}", m.description.get(&locale), m.current_hp, m.stats.max_hp()))
            .unwrap_or_else(|| "It's gone.".to_string()),
        RoomHandleEntry::Npc(id) => engine
            .world
            .get_npc(id)
            .map(|n| n.description.get(&locale).to_string())
            .unwrap_or_else(|| "They're gone.".to_string()),
        RoomHandleEntry::Player(_, name) => format!("{name} is here."),
    };
    CommandOutcome::success(text)
}
