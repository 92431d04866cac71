use std::sync::Arc;

use moor_mud_common::LocKey;

use crate::dispatcher::{CombatGate, CommandDispatcher, CommandOutcome, CommandSpec};
use crate::engine::Engine;
use crate::session::SessionState;

pub fn register(dispatcher: &Arc<CommandDispatcher>) {
    dispatcher.register(
        CommandSpec {
            name: "attack",
            aliases: vec!["kill", "att"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "attack <monster> - initiate combat with a monster in the room.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_attack(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "combat",
            aliases: vec!["cs"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::CombatOnly,
            help: "Show the current combat's status (supplemental).",
        },
        Arc::new(|engine, session, _args| Box::pin(handle_combat_status(engine, session))),
    );
}

/// `attack <monster>` only runs when the dispatcher determined the session
/// is NOT already in combat (the in-combat case is intercepted earlier as a
/// `CombatAction::Attack` turn submission,.4 step 5).
async fn handle_attack(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(needle) = args.first() else {
        return CommandOutcome::error_plain("Attack what?");
    };
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let locale = session.locale();
    let Some(monster_id) = engine.find_monster_at_by_name(coords, needle, &locale) else {
        return CommandOutcome::error_plain(format!("There's no {needle} here."));
    };
    if engine.combats.monster_in_combat(monster_id) {
        return CommandOutcome::error_plain("Someone is already fighting that.");
    }
    let Ok(Some(player)) = engine.players.find_by_id(player_id).await else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    crate::combat::start_combat(
        &engine,
        player_id,
        session.id,
        player.stats,
        player.current_hp,
        monster_id,
    )
        .await;
    CommandOutcome::silent()
}

async fn handle_combat_status(engine: Arc<Engine>, session: Arc<SessionState>) -> CommandOutcome {
    let Some(combat_id) = session.combat_id() else {
        return CommandOutcome::error_loc(LocKey::new("combat.only_in_combat"));
    };
    let Some(combat) = engine.combats.get(combat_id) else {
        return CommandOutcome::error_loc(LocKey::new("combat.only_in_combat"));
    };
    let inner = combat.inner.lock().unwrap();
    CommandOutcome::success(format!(
            "Round {}: you {}/{} HP, {} {}/{} HP",
            inner.round,
            inner.player_hp,
            inner.player_max_hp,
            combat.monster_name,
            inner.monster_hp,
            inner.monster_max_hp,
    ))
}
