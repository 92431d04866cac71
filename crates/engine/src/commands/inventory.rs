use std::sync::Arc;

use moor_mud_common::LocKey;
use moor_mud_events::{Event, EventKind};
use moor_mud_world::Location;

use crate::dispatcher::{CombatGate, CommandDispatcher, CommandOutcome, CommandSpec};
use crate::engine::Engine;
use crate::session::{RoomHandleEntry, SessionState};

pub fn register(dispatcher: &Arc<CommandDispatcher>) {
    dispatcher.register(
        CommandSpec {
            name: "inventory",
            aliases: vec!["i", "inv"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "List what you're carrying.",
        },
        Arc::new(|engine, session, _args| Box::pin(handle_inventory(engine, session))),
    );
    dispatcher.register(
        CommandSpec {
            name: "get",
            aliases: vec!["take"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "get <number> - pick up an item from the room.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_get(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "drop",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "drop <number> - drop an item from your inventory.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_drop(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "equip",
            aliases: vec!["wear", "wield"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "equip <number> - equip a weapon, armor piece, or trinket from your inventory.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_equip(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "unequip",
            aliases: vec!["remove"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "unequip <number> - unequip an item.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_unequip(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "unequipall",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "Unequip everything you're wearing/wielding.",
        },
        Arc::new(|engine, session, _args| Box::pin(handle_unequip_all(engine, session))),
    );
    dispatcher.register(
        CommandSpec {
            name: "inspect",
            aliases: vec!["examine", "x"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "inspect <number> - examine a numbered entry in the room.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_inspect(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "talk",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "talk <number> - talk to an NPC present in the room.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_talk(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "shop",
            aliases: vec![],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "shop <number> - list an NPC merchant's wares.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_shop(engine, session, args))),
    );
    dispatcher.register(
        CommandSpec {
            name: "trade",
            aliases: vec!["buy"],
            is_admin: false,
            requires_auth: true,
            combat_gate: CombatGate::Always,
            help: "trade <npc number> <item template id> - buy an item from a merchant.",
        },
        Arc::new(|engine, session, args| Box::pin(handle_trade(engine, session, args))),
    );
}

async fn handle_inventory(engine: Arc<Engine>, session: Arc<SessionState>) -> CommandOutcome {
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let locale = session.locale();
    let items = engine.world.get_objects_in(&Location::Inventory(player_id));
    if items.is_empty() {
        return CommandOutcome::success("You aren't carrying anything.");
    }
    let lines: Vec<String> = items
        .iter()
        .map(|o| {
            let equipped = if o.is_equipped { " (equipped)" } else { "" };
            format!(" {} x{}{}", o.name.get(&locale), o.quantity, equipped)
    })
        .collect();
    CommandOutcome::success(format!("You are carrying:\n{}", lines.join("\n")))
}

fn resolve_object_handle(session: &SessionState, n: u32) -> Option<moor_mud_common::ObjectId> {
    match session.resolve_handle(n)? {
        RoomHandleEntry::Object(id) => Some(id),
        _ => None,
    }
}

async fn handle_get(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(n) = args.first().and_then(|a| a.parse::<u32>().ok()) else {
        return CommandOutcome::error_plain("Usage: get <number>");
    };
    let Some(object_id) = resolve_object_handle(&session, n) else {
        return CommandOutcome::error_plain("There's nothing like that here.");
    };
    match engine.world.move_object(object_id, Location::Inventory(player_id)) {
        Ok(()) => {
            let name = engine
                .world
                .get_object(object_id)
                .map(|o| o.name.get(&session.locale()).to_string())
                .unwrap_or_default();
            engine.bus.publish(
                Event::new(EventKind::ObjectPickedUp)
                    .with_source(session.id)
                    .with_target(object_id.to_string()),
            );
            CommandOutcome::success(format!("You pick up {name}."))
        }
        Err(err) => CommandOutcome::error_plain(err.to_string()),
    }
}

async fn handle_drop(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(coords) = session.coords() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(room) = engine.world.get_room_at(coords) else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(n) = args.first().and_then(|a| a.parse::<u32>().ok()) else {
        return CommandOutcome::error_plain("Usage: drop <number>");
    };
    let items = engine.world.get_objects_in(&Location::Inventory(player_id));
    let Some(item) = (n as usize).checked_sub(1).and_then(|i| items.get(i)) else {
        return CommandOutcome::error_plain("You aren't carrying that.");
    };
    let object_id = item.id;
    let name = item.name.get(&session.locale()).to_string();
    match engine.world.move_object(object_id, Location::Room(room.id)) {
        Ok(()) => {
            engine.bus.publish(
                Event::new(EventKind::ObjectDropped)
                    .with_source(session.id)
                    .with_target(object_id.to_string()),
            );
            CommandOutcome::success(format!("You drop {name}."))
        }
        Err(err) => CommandOutcome::error_plain(err.to_string()),
    }
}

async fn handle_equip(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(n) = args.first().and_then(|a| a.parse::<u32>().ok()) else {
        return CommandOutcome::error_plain("Usage: equip <number>");
    };
    let items = engine.world.get_objects_in(&Location::Inventory(player_id));
    let Some(item) = (n as usize).checked_sub(1).and_then(|i| items.get(i)) else {
        return CommandOutcome::error_plain("You aren't carrying that.");
    };
    let Some(slot) = item.equipment_slot else {
        return CommandOutcome::error_plain("That can't be equipped.");
    };
    let item_id = item.id;
    let name = item.name.get(&session.locale()).to_string();

    // Unequip whatever already occupies that slot.
    for other in engine.world.get_objects_in(&Location::Inventory(player_id)) {
        if other.is_equipped && other.equipment_slot == Some(slot) {
            let mut other = other;
            other.is_equipped = false;
            engine.world.put_object(other);
        }
    }

    let Some(mut item) = engine.world.get_object(item_id) else {
        return CommandOutcome::error_plain("That item is gone.");
    };
    item.is_equipped = true;
    engine.world.put_object(item);
    CommandOutcome::success(format!("You equip {name}."))
}

async fn handle_unequip(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Some(n) = args.first().and_then(|a| a.parse::<u32>().ok()) else {
        return CommandOutcome::error_plain("Usage: unequip <number>");
    };
    let items = engine.world.get_objects_in(&Location::Inventory(player_id));
    let Some(item) = (n as usize).checked_sub(1).and_then(|i| items.get(i)) else {
        return CommandOutcome::error_plain("You aren't carrying that.");
    };
    if !item.is_equipped {
        return CommandOutcome::error_plain("That isn't equipped.");
    }
    let mut item = item.clone();
    let name = item.name.get(&session.locale()).to_string();
    item.is_equipped = false;
    engine.world.put_object(item);
    CommandOutcome::success(format!("You unequip {name}."))
}

async fn handle_unequip_all(engine: Arc<Engine>, session: Arc<SessionState>) -> CommandOutcome {
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let mut count = 0;
    for mut item in engine.world.get_objects_in(&Location::Inventory(player_id)) {
        if item.is_equipped {
            item.is_equipped = false;
            engine.world.put_object(item);
            count += 1;
        }
    }
    if count == 0 {
        CommandOutcome::success("You have nothing equipped.")
    } else {
        CommandOutcome::success(format!("You unequip everything ({count} items)."))
    }
}

async fn handle_inspect(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(n) = args.first().and_then(|a| a.parse::<u32>().ok()) else {
        return CommandOutcome::error_plain("Usage: inspect <number>");
    };
    let Some(entry) = session.resolve_handle(n) else {
        return CommandOutcome::error_plain("Nothing matches that number here.");
    };
    let locale = session.locale();
    let text = match entry {
        RoomHandleEntry::Object(id) => engine
            .world
            .get_object(id)
            .map(|o| o.description.get(&locale).to_string()),
        RoomHandleEntry::Monster(id) => engine
            .world
            .get_monster(id)
            .map(|m| m.description.get(&locale).to_string()),
        RoomHandleEntry::Npc(id) => engine
            .world
            .get_npc(id)
            .map(|n| n.description.get(&locale).to_string()),
        RoomHandleEntry::Player(_, name) => Some(format!("{name} is here.")),
    };
    match text {
        Some(text) => CommandOutcome::success(text),
        None => CommandOutcome::error_plain("It's gone."),
    }
}

async fn handle_talk(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(n) = args.first().and_then(|a| a.parse::<u32>().ok()) else {
        return CommandOutcome::error_plain("Usage: talk <number>");
    };
    let Some(RoomHandleEntry::Npc(npc_id)) = session.resolve_handle(n) else {
        return CommandOutcome::error_plain("There's no one like that to talk to here.");
    };
    let Some(npc) = engine.world.get_npc(npc_id) else {
        return CommandOutcome::error_plain("They're gone.");
    };
    let locale = session.locale();
    let greeting = npc
        .dialogue
        .get("greeting")
        .map(|t| t.get(&locale).to_string())
        .unwrap_or_else(|| format!("{} has nothing to say.", npc.name.get(&locale)));
    CommandOutcome::success(format!("{}: {}", npc.name.get(&locale), greeting))
}

async fn handle_shop(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    let Some(n) = args.first().and_then(|a| a.parse::<u32>().ok()) else {
        return CommandOutcome::error_plain("Usage: shop <number>");
    };
    let Some(RoomHandleEntry::Npc(npc_id)) = session.resolve_handle(n) else {
        return CommandOutcome::error_plain("There's no merchant like that here.");
    };
    let Some(npc) = engine.world.get_npc(npc_id) else {
        return CommandOutcome::error_plain("They're gone.");
    };
    if npc.shop_inventory.is_empty() {
        return CommandOutcome::success(format!("{} isn't selling anything.", npc.name.get(&session.locale())));
    }
    let lines: Vec<String> = npc
        .shop_inventory
        .iter()
        .map(|entry| {
            let item_name = engine
                .world
                .get_item_template(&entry.item_template_id)
                .map(|t| t.name.get(&session.locale()).to_string())
                .unwrap_or_else(|| entry.item_template_id.clone());
            format!(" {item_name} - {} {}", entry.price, entry.currency)
    })
        .collect();
    CommandOutcome::success(format!(
            "{} offers:\n{}",
            npc.name.get(&session.locale()),
            lines.join("\n")
    ))
}

async fn handle_trade(engine: Arc<Engine>, session: Arc<SessionState>, args: Vec<String>) -> CommandOutcome {
    if args.len() < 2 {
        return CommandOutcome::error_plain("Usage: trade <number> <item template id>");
    }
    let Some(n) = args[0].parse::<u32>().ok() else {
        return CommandOutcome::error_plain("Usage: trade <number> <item template id>");
    };
    let template_id = &args[1];
    let Some(RoomHandleEntry::Npc(npc_id)) = session.resolve_handle(n) else {
        return CommandOutcome::error_plain("There's no merchant like that here.");
    };
    let Some(npc) = engine.world.get_npc(npc_id) else {
        return CommandOutcome::error_plain("They're gone.");
    };
    let Some(entry) = npc
        .shop_inventory
        .iter()
        .find(|e| &e.item_template_id == template_id)
    else {
        return CommandOutcome::error_plain("They don't sell that.");
    };
    let Some(player_id) = session.player_id() else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    let Ok(Some(mut player)) = engine.players.find_by_id(player_id).await else {
        return CommandOutcome::error_loc(LocKey::new("error.generic"));
    };
    if player.gold < entry.price {
        return CommandOutcome::error_plain("You can't afford that.");
    }
    let Some(item) = engine
        .world
        .instantiate_item_template(template_id, Location::Inventory(player_id), 1)
    else {
        return CommandOutcome::error_plain("That item no longer exists.");
    };
    let item_name = item.name.get(&session.locale()).to_string();
    engine.world.put_object(item);
    player.gold -= entry.price;
    let _ = engine.players.update(player).await;
    CommandOutcome::success(format!("You buy {item_name} for {} {}.", entry.price, entry.currency))
}
