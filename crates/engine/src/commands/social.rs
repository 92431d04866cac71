use std::sync::Arc;

use moor_mud_common::LocKey;
use moor_mud_events::{Event, EventKind};

use crate::dispatcher::{CombatGate, CommandDispatcher, CommandOutcome, CommandSpec};
use crate::engine::Engine;
use crate::session::SessionState;

pub fn register(dispatcher: &Arc<CommandDispatcher>) {
    dispatcher.register(
        CommandSpec {
            name: "say",
            aliases: vec!["'"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "say <message> - speak to everyone in the room.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_say(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "whisper",
            aliases: vec!["tell"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "whisper <player> <message> - speak privately to one player in the room.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_whisper(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "emote",
            aliases: vec!["me"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "emote <action> - perform a visible action.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_emote(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "who",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "List every connected player.",
        },
        Arc::new(|engine, _session, _args| Box::pin(handle_who(engine))),
    );
    dispatcher.register(
        CommandSpec {
            name: "players",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "List players in this room.",
        },
        Arc::new(|engine, session, _args| Box::pin(handle_players(engine, session))),
    );
    dispatcher.register(
        CommandSpec {
            name: "here",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Summarize everything present in this room.",
        },
        Arc::new(|engine, session, _args| Box::pin(handle_here(engine, session))),
    );
    dispatcher.register(
        CommandSpec {
            name: "follow",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "follow <player> - move when they move.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_follow(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "stop",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Stop following whoever you're following.",
        },
        Arc::new(|engine, session, _args| Box::pin(handle_stop(engine, session))),
    );
}

async fn handle_say(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    if args.is_empty() {
        return CommandOutcome::error_plain("Say what?");
    }
    let text = args.join(" ");
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let name = session.display_name().unwrap_or_default();
    engine.bus.publish(
        Event::new(EventKind::PlayerEmote)
            .with_source(session.id)
            .with_coords(coords)
            .with_data("kind", "say")
            .with_data("text", &text),
    );
    for other in engine.sessions.authenticated_at(coords) {
        if other.id == session.id {
            other.send_line(format!("You say, \"{text}\""));
        } else {
            other.send_line(format!("{name} says, \"{text}\""));
        }
    }
    CommandOutcome::silent()
}

async fn handle_whisper(
    engine: Arc<Engine>,
    session: Arc<SessionState>,
    args: Vec<String>,
) -> CommandOutcome {
    if args.len() < 2 {
        return CommandOutcome::error_plain("Usage: whisper <player> <message>");
    }
    let target_name = &args[0];
    let text = args[1..].join(" ");
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(target) = engine
        .sessions
        .authenticated_at(coords)
        .into_iter()
        .find(|s| {
            s.display_name()
                .map(|n| unicase::UniCase::new(n.as_str()) == unicase::UniCase::new(target_name.as_str()))
                .unwrap_or(false)
    })
    else {
        return CommandOutcome::error_plain(format!("{target_name} isn't here."));
    };
    let name = session.display_name().unwrap_or_default();
    target.send_line(format!("{name} whispers, \"{text}\""));
    CommandOutcome::success(format!("You whisper to {}, \"{text}\"", target.display_name().unwrap_or_default()))
}

async fn handle_emote(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    if args.is_empty() {
        return CommandOutcome::error_plain("Emote what?");
    }
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let name = session.display_name().unwrap_or_default();
    let action = args.join(" ");
    for other in engine.sessions.authenticated_at(coords) {
        other.send_line(format!("{name} {action}"));
    }
    CommandOutcome::silent()
}

async fn handle_who(engine: Arc<Engine>) -> CommandOutcome {
    let mut names: Vec<String> = engine
        .sessions
        .all_authenticated()
        .into_iter()
        .filter_map(|s| s.display_name())
        .collect();
    names.sort_unstable();
    if names.is_empty() {
        return CommandOutcome::success("No one else is online.");
    }
    CommandOutcome::success(format!("Online ({}): {}", names.len(), names.join(", ")))
}

async fn handle_players(engine: Arc<Engine>, session: Arc<SessionState>) -> CommandOutcome {
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let mut names: Vec<String> = engine
        .sessions
        .authenticated_at(coords)
        .into_iter()
        .filter_map(|s| s.display_name())
        .collect();
    names.sort_unstable();
    if names.is_empty() {
        return CommandOutcome::success("You are alone here.");
    }
    CommandOutcome::success(format!("Here: {}", names.join(", ")))
}

async fn handle_here(engine: Arc<Engine>, session: Arc<SessionState>) -> CommandOutcome {
    let view = crate::room_view::render_room_view(&engine, &session).await;
    CommandOutcome::success(view)
}

async fn handle_follow(
    engine: Arc<Engine>,
    session: Arc<SessionState>,
    args: Vec<String>,
) -> CommandOutcome {
    let Some(target_name) = args.first() else {
        return CommandOutcome::error_plain("Usage: follow <player>");
    };
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(leader) = engine
        .sessions
        .authenticated_at(coords)
        .into_iter()
        .find(|s| {
            s.id != session.id
                && s.display_name()
                .map(|n| unicase::UniCase::new(n.as_str()) == unicase::UniCase::new(target_name.as_str()))
                .unwrap_or(false)
    })
    else {
        return CommandOutcome::error_plain(format!("{target_name} isn't here."));
    };
    let leader_name = leader.display_name().unwrap_or_default();
    *session.following.write().unwrap() = Some(leader_name.clone());
    CommandOutcome::success_loc(LocKey::new("movement.follow_start").param("leader", &leader_name))
}

async fn handle_stop(_engine: Arc<Engine>, session: Arc<SessionState>) -> CommandOutcome {
    let leader = session.following.write().unwrap().take();
    match leader {
        Some(leader) => CommandOutcome::success_loc(LocKey::new("movement.follow_stopped").param("leader", &leader)),
        None => CommandOutcome::error_plain("You aren't following anyone."),
    }
}
