use std::sync::Arc;

use moor_mud_common::{Coords, LocKey, LocalizedText};
use moor_mud_events::{Event, EventKind};
use moor_mud_world::{GameObject, Location, Monster, MonsterBehavior, MonsterTemplate, MonsterType, ObjectCategory, Room};

use crate::dispatcher::{CombatGate, CommandDispatcher, CommandOutcome, CommandSpec};
use crate::engine::Engine;
use crate::room_view::send_room_view;
use crate::session::SessionState;

pub fn register(dispatcher: &Arc<CommandDispatcher>) {
    dispatcher.register(
        admin_spec("goto", "goto <x> <y> - teleport yourself to a room's coordinates."),
        Arc::new(|engine, session, args| Box::pin(handle_goto(engine, session, args))),
    );
    dispatcher.register(
        admin_spec("kick", "kick <player> - disconnect a non-admin player."),
        Arc::new(|engine, session, args| Box::pin(handle_kick(engine, session, args))),
    );
    dispatcher.register(
        admin_spec("createroom", "createroom <x> <y> <description...> - create a room."),
        Arc::new(|engine, session, args| Box::pin(handle_createroom(engine, session, args))),
    );
    dispatcher.register(
        admin_spec("editroom", "editroom <description...> - rewrite this room's description."),
        Arc::new(|engine, session, args| Box::pin(handle_editroom(engine, session, args))),
    );
    dispatcher.register(
        admin_spec(
            "createexit",
            "createexit <x> <y> - connect this room's `enter` portal to the given coordinates.",
        ),
        Arc::new(|engine, session, args| Box::pin(handle_createexit(engine, session, args))),
    );
    dispatcher.register(
        admin_spec(
            "createobject",
            "createobject <template id> <name...> - register an item template and drop one here.",
        ),
        Arc::new(|engine, session, args| Box::pin(handle_createobject(engine, session, args))),
    );
    dispatcher.register(
        admin_spec(
            "spawnmonster",
            "spawnmonster <template id> - spawn one instance of a registered monster template here.",
        ),
        Arc::new(|engine, session, args| Box::pin(handle_spawnmonster(engine, session, args))),
    );
    dispatcher.register(
        admin_spec(
            "scheduler",
            "scheduler list|info <job>|enable <job>|disable <job> - manage scheduled jobs.",
        ),
        Arc::new(|engine, _session, args| Box::pin(handle_scheduler(engine, args))),
    );
    dispatcher.register(
        admin_spec("validate", "Run the world integrity sweep and repair orphaned state."),
        Arc::new(|engine, _session, _args| Box::pin(handle_validate(engine))),
    );
}

fn admin_spec(name: &'static str, help: &'static str) -> CommandSpec {
    CommandSpec {
        name,
        aliases: vec![],
        is_admin: true,
        requires_auth: true,
        combat_gate: CombatGate::Always,
        help,
    }
}

fn notify_world_updated(engine: &Arc<Engine>, kind: &str) {
    engine
        .bus
        .publish(Event::new(EventKind::WorldUpdated).with_data("kind", kind));
}

async fn handle_goto(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let (Some(x), Some(y)) = (
        args.first().and_then(|a| a.parse::<i32>().ok()),
        args.get(1).and_then(|a| a.parse::<i32>().ok()),
    ) else {
        return CommandOutcome::error_plain("Usage: goto <x> <y>");
    };
    let target = Coords::new(x, y);
    if engine.world.get_room_at(target).is_none() {
        return CommandOutcome::error_plain("No room exists there.");
    }
    if let Some(from) = session.coords() {
        engine.broadcast.broadcast_to_room(
            from,
            LocKey::new("movement.left")
                .param("name", session.display_name().unwrap_or_default())
                .param("direction", "in a puff of smoke"),
            Some(session.id),
        );
    }
    session.set_coords(target);
    engine.broadcast.broadcast_to_room(
        target,
        LocKey::new("movement.entered")
            .param("name", session.display_name().unwrap_or_default())
            .param("direction", "a flash of light"),
        Some(session.id),
    );
    send_room_view(&engine, &session).await;
    CommandOutcome::silent()
}

async fn handle_kick(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(target_name) = args.first() else {
        return CommandOutcome::error_plain("Usage: kick <player>");
    };
    let Some(target) = engine
        .sessions
        .all_authenticated()
        .into_iter()
        .find(|s| s.display_name().map(|n| n.eq_ignore_ascii_case(target_name)).unwrap_or(false))
    else {
        return CommandOutcome::error_plain(format!("{target_name} is not online."));
    };
    if target.id == session.id {
        return CommandOutcome::error_plain("You can't kick yourself.");
    }
    if target.is_admin() {
        return CommandOutcome::error_plain("You can't kick another administrator.");
    }
    target.send_line("You have been disconnected by an administrator.");
    target.request_close();
    CommandOutcome::success(format!("{target_name} has been kicked."))
}

async fn handle_createroom(engine: Arc<Engine>, _session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    if args.len() < 3 {
        return CommandOutcome::error_plain("Usage: createroom <x> <y> <description...>");
    }
    let (Ok(x), Ok(y)) = (args[0].parse::<i32>(), args[1].parse::<i32>()) else {
        return CommandOutcome::error_plain("Usage: createroom <x> <y> <description...>");
    };
    let description = args[2..].join(" ");
    let room = Room::new(Coords::new(x, y), LocalizedText::new().with("en", description));
    match engine.world.create_room(room) {
        Ok(id) => {
            notify_world_updated(&engine, "room_created");
            CommandOutcome::success(format!("Room {id} created at ({x}, {y})."))
        }
        Err(err) => CommandOutcome::error_plain(err.to_string()),
    }
}

async fn handle_editroom(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    if args.is_empty() {
        return CommandOutcome::error_plain("Usage: editroom <description...>");
    }
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(room) = engine.world.get_room_at(coords) else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let description = args.join(" ");
    match engine
        .world
        .update_room(room.id, |r| r.description = LocalizedText::new().with("en", description.clone()))
    {
        Ok(()) => {
            notify_world_updated(&engine, "room_edited");
            CommandOutcome::success("Room description updated.")
        }
        Err(err) => CommandOutcome::error_plain(err.to_string()),
    }
}

async fn handle_createexit(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let (Some(x), Some(y)) = (
        args.first().and_then(|a| a.parse::<i32>().ok()),
        args.get(1).and_then(|a| a.parse::<i32>().ok()),
    ) else {
        return CommandOutcome::error_plain("Usage: createexit <x> <y>");
    };
    let Some(from) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let target = Coords::new(x, y);
    if engine.world.get_room_at(target).is_none() {
        return CommandOutcome::error_plain("No room exists at that destination.");
    }
    engine.world.connect_portal(from, target);
    notify_world_updated(&engine, "exit_created");
    CommandOutcome::success(format!("An `enter` portal now leads to ({x}, {y})."))
}

async fn handle_createobject(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    if args.len() < 2 {
        return CommandOutcome::error_plain("Usage: createobject <template id> <name...>");
    }
    let template_id = args[0].clone();
    let name = args[1..].join(" ");
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(room) = engine.world.get_room_at(coords) else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let blueprint = GameObject::new(
        LocalizedText::new().with("en", name.clone()),
        LocalizedText::new().with("en", name.clone()),
        ObjectCategory::Misc,
        Location::Room(room.id),
    );
    engine.world.register_item_template(template_id.clone(), blueprint);
    let Some(instance) = engine
        .world
        .instantiate_item_template(&template_id, Location::Room(room.id), 1)
    else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    engine.world.put_object(instance);
    notify_world_updated(&engine, "object_created");
    CommandOutcome::success(format!("Created {name} here."))
}

async fn handle_spawnmonster(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(template_id) = args.first() else {
        return CommandOutcome::error_plain("Usage: spawnmonster <template id>");
    };
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let template = match engine.world.get_template(template_id) {
        Some(t) => t,
        None => {
            // No template registered yet; mint a minimal placeholder so
            // admins can spawn ad hoc test monsters without editing seed data.
            let placeholder = MonsterTemplate {
                template_id: template_id.clone(),
                name: LocalizedText::new().with("en", template_id.clone()),
                description: LocalizedText::new().with("en", "A test monster."),
                monster_type: MonsterType::Neutral,
                behavior: MonsterBehavior::Stationary,
                stats: Default::default(),
                gold_reward: 0,
                drop_table: vec![],
                aggro_range: 0,
                roaming_range: 0,
                roam_chance: 0.0,
                respawn_delay_secs: 300,
                faction: moor_mud_common::Faction::new("monster"),
                properties: Default::default(),
            };
            engine.world.register_template(placeholder.clone());
            placeholder
        }
    };
    let instance = Monster::from_template(&template, coords);
    match engine.world.create_monster(instance) {
        Some(_) => {
            notify_world_updated(&engine, "monster_spawned");
            CommandOutcome::success(format!("Spawned {template_id} here."))
        }
        None => CommandOutcome::error_plain("That template is at its global cap."),
    }
}

async fn handle_scheduler(engine: Arc<Engine>, args: Vec<String>) -> CommandOutcome {
    let Some(sub) = args.first().map(|s| s.to_lowercase()) else {
        return CommandOutcome::error_plain("Usage: scheduler list|info <job>|enable <job>|disable <job>");
    };
    match sub.as_str() {
        "list" => {
            let jobs = engine.scheduler.list();
            if jobs.is_empty() {
                return CommandOutcome::success("No jobs registered.");
            }
            let lines: Vec<String> = jobs
                .iter()
                .map(|j| {
                    format!(
                        "  {} enabled={} runs={} errors={}",
                        j.name,
                        j.enabled.load(std::sync::atomic::Ordering::SeqCst),
                        j.run_count.load(std::sync::atomic::Ordering::SeqCst),
                        j.error_count.load(std::sync::atomic::Ordering::SeqCst),
                    )
                })
                .collect();
            CommandOutcome::success(lines.join("\n"))
        }
        "info" => {
            let Some(name) = args.get(1) else {
                return CommandOutcome::error_plain("Usage: scheduler info <job>");
            };
            match engine.scheduler.get(name) {
                Some(job) => CommandOutcome::success(format!(
                    "{}: intervals={:?} last_run={:?}",
                    job.name,
                    job.intervals,
                    *job.last_run.read().unwrap(),
                )),
                None => CommandOutcome::error_plain(format!("No job named '{name}'.")),
            }
        }
        "enable" | "disable" => {
            let Some(name) = args.get(1) else {
                return CommandOutcome::error_plain(format!("Usage: scheduler {sub} <job>"));
            };
            if engine.scheduler.set_enabled(name, sub == "enable") {
                CommandOutcome::success(format!("{name} {sub}d."))
            } else {
                CommandOutcome::error_plain(format!("No job named '{name}'."))
            }
        }
        _ => CommandOutcome::error_plain("Usage: scheduler list|info <job>|enable <job>|disable <job>"),
    }
}

async fn handle_validate(engine: Arc<Engine>) -> CommandOutcome {
    let report = engine.run_integrity_sweep();
    CommandOutcome::success(format!(
        "Integrity sweep: relocated {} objects, culled {} monsters.",
        report.relocated_objects, report.culled_monsters,
    ))
}
