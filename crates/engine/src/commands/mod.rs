//! The full player-facing verb surface, registered against a
//! [`crate::dispatcher::CommandDispatcher`] at boot.

pub mod admin;
pub mod combat_cmds;
pub mod inventory;
pub mod meta;
pub mod movement;
pub mod social;

use std::sync::Arc;

use crate::dispatcher::CommandDispatcher;

/// Registers every command handler. Called once from the server binary
/// after the `Engine` is assembled.
pub fn register_all(dispatcher: &Arc<CommandDispatcher>) {
    movement::register(dispatcher);
    social::register(dispatcher);
    inventory::register(dispatcher);
    combat_cmds::register(dispatcher);
    meta::register(dispatcher);
    admin::register(dispatcher);
}
