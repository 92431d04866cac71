use std::sync::Arc;

use moor_mud_common::{Locale, LocKey};
use moor_mud_world::Player;

use crate::dispatcher::{CombatGate, CommandDispatcher, CommandOutcome, CommandSpec};
use crate::engine::Engine;
use crate::session::SessionState;

pub fn register(dispatcher: &Arc<CommandDispatcher>) {
    dispatcher.register(
        CommandSpec {
            name: "help",
            aliases: vec!["?"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "List every command you can use.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_help(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "language",
            aliases: vec!["lang"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "language <en|ko> - set your display locale.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_language(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "changename",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "changename <new name> - rename your character (once per 24h).",
        },
        Arc::new(|engine, session, args| Box::pin(handle_changename(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "stats",
            aliases: vec!["score"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Show your character sheet.",
        },
        Arc::new(|engine, session, _args| Box::pin(handle_stats(engine, session))),
    );
    dispatcher.register(
        CommandSpec {
            name: "quit",
            aliases: vec!["exit"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Disconnect.",
        },
        Arc::new(|_engine, _session, _args| Box::pin(handle_quit())),
    );
}

async fn handle_help(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let is_admin = session.is_admin();
    let mut specs: Vec<_> = engine
        .dispatcher
        .all_specs()
        .into_iter()
        .filter(|s| is_admin || !s.is_admin)
        .collect();
    specs.sort_by_key(|s| s.name);

    if let Some(topic) = args.first() {
        return match specs.iter().find(|s| s.name == topic.to_lowercase()) {
            Some(spec) => CommandOutcome::success(format!("{}: {}", spec.name, spec.help)),
            None => CommandOutcome::error_plain(format!("No help for '{topic}'.")),
        };
    }

    let lines: Vec<String> = specs.iter().map(|s| format!("  {:<12} {}", s.name, s.help)).collect();
    CommandOutcome::success(format!("Commands:\n{}", lines.join("\n")))
}

async fn handle_language(_engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(tag) = args.first() else {
        return CommandOutcome::error_plain("Usage: language <en|ko>");
    };
    *session.locale.write().unwrap() = Locale::new(tag.to_lowercase());
    CommandOutcome::success(format!("Language set to {tag}."))
}

async fn handle_changename(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let new_name = args.join(" ");
    if !Player::is_valid_display_name(&new_name) {
        return CommandOutcome::error_loc(LocKey::new("name.invalid"));
    }
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Ok(Some(mut player)) = engine.players.find_by_id(player_id).await else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let now = chrono::Utc::now();
    if !player.can_change_name(now) {
        let hours = player.hours_until_rename(now).ceil() as i64;
        return CommandOutcome::error_loc(LocKey::new("name.rate_limited").param("hours", hours));
    }
    player.display_name = new_name.clone();
    if !player.is_admin {
        player.last_name_change = Some(now);
    }
    let _ = engine.players.update(player).await;
    *session.display_name.write().unwrap() = Some(new_name.clone());
    CommandOutcome::success(format!("Your name is now {new_name}."))
}

async fn handle_stats(engine: Arc<Engine>, session: Arc<SessionState>) -> CommandOutcome {
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Ok(Some(player)) = engine.players.find_by_id(player_id).await else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let s = player.stats;
    CommandOutcome::success(format!(
        "{} (level {})\nHP: {}/{}\nSTR {} DEX {} CON {} INT {} WIS {} CHA {}\nAC {} | Gold {}",
        player.display_name,
        s.level,
        player.current_hp,
        s.max_hp(),
        s.strength,
        s.dexterity,
        s.constitution,
        s.intelligence,
        s.wisdom,
        s.charisma,
        s.armor_class(),
        player.gold,
    ))
}

async fn handle_quit() -> CommandOutcome {
    CommandOutcome::success("Farewell.").with_disconnect()
}
