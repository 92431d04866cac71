use std::sync::Arc;
use std::time::Duration;

use moor_mud_common::Locale;
use moor_mud_net::LineTransport;
use moor_mud_world::Player;

use crate::engine::Engine;
use crate::room_view::send_room_view;
use crate::session::{SessionPhase, SessionState};

const MAX_AUTH_ATTEMPTS: u32 = 3;
const MENU: &str = "\n1) Login\n2) Register\n3) Quit\n> ";

/// Runs the connect-time menu to completion: three attempts
/// at login/register before the connection is dropped, or an explicit
/// choice to quit. Returns `true` once `session` has reached
/// `SessionPhase::Authenticated`.
pub async fn run_auth_phase<T: LineTransport>(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    transport: &mut T,
) -> bool {
    *session.phase.write().unwrap() = SessionPhase::Menu;
    let _ = transport
        .write_line("Welcome to Moor MUD.")
        .await;

    loop {
        if session.auth_attempts.load(std::sync::atomic::Ordering::SeqCst) >= MAX_AUTH_ATTEMPTS {
            let _ = transport.write_line("Too many failed attempts. Goodbye.").await;
            let _ = transport.close("too many auth attempts").await;
            return false;
        }

        let _ = transport.write_line(MENU).await;
        let Some(choice) = read_line(transport).await else {
            return false;
        };

        match choice.trim() {
            "1" => {
                if try_login(engine, session, transport).await {
                    return true;
                }
            }
            "2" => {
                if try_register(engine, session, transport).await {
                    return true;
                }
            }
            "3" => {
                let _ = transport.write_line("Farewell.").await;
                let _ = transport.close("quit at menu").await;
                return false;
            }
            _ => {
                let _ = transport.write_line("Please choose 1, 2, or 3.").await;
            }
        }
    }
}

async fn read_line<T: LineTransport>(transport: &mut T) -> Option<String> {
    match transport.read_line(Duration::from_secs(300)).await {
        Ok(Some(line)) => Some(line),
        Ok(None) if transport.is_closed() => None,
        Ok(None) => Some(String::new()),
        Err(_) => None,
    }
}

async fn try_login<T: LineTransport>(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    transport: &mut T,
) -> bool {
    let _ = transport.write_line("Username:").await;
    let Some(username) = read_line(transport).await else {
        return false;
    };
    let username = username.trim().to_string();

    let _ = transport.disable_echo().await;
    let _ = transport.write_line("Password:").await;
    let password = read_line(transport).await;
    let _ = transport.enable_echo().await;
    let Some(password) = password else {
        return false;
    };

    let verified = engine
        .players
        .verify_credentials(&username, password.trim())
        .await
        .unwrap_or(false);

    if !verified {
        session.auth_attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let _ = transport
            .write_line(engine.catalog.render(&session.locale(), &moor_mud_common::LocKey::new("auth.login_failed")))
            .await;
        return false;
    }

    let Ok(Some(player)) = engine.players.find_by_username(&username).await else {
        return false;
    };

    if let Some(old) = engine.sessions.bind_player(player.id, session) {
        old.send_line(engine.catalog.render(
                &old.locale(),
                &moor_mud_common::LocKey::new("auth.logged_in_elsewhere"),
        ));
        old.request_close();
    }

    finish_login(engine, session, transport, player).await;
    true
}

async fn try_register<T: LineTransport>(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    transport: &mut T,
) -> bool {
    let _ = transport.write_line("Choose a username:").await;
    let Some(username) = read_line(transport).await else {
        return false;
    };
    let username = username.trim().to_string();
    if username.is_empty() {
        let _ = transport.write_line("Username cannot be empty.").await;
        return false;
    }
    if engine.players.find_by_username(&username).await.ok().flatten().is_some() {
        let _ = transport.write_line("That username is taken.").await;
        return false;
    }

    let _ = transport.disable_echo().await;
    let _ = transport.write_line("Choose a password:").await;
    let password = read_line(transport).await;
    let _ = transport.write_line("\nConfirm password:").await;
    let confirm = read_line(transport).await;
    let _ = transport.enable_echo().await;
    let (Some(password), Some(confirm)) = (password, confirm) else {
        return false;
    };
    if password.trim() != confirm.trim() || password.trim().is_empty() {
        let _ = transport.write_line("Passwords did not match.").await;
        return false;
    }

    let mut player = Player::new(username, password.trim().to_string());
    if let Some(room_id) = engine.world.default_room() {
        if let Some(room) = engine.world.get_room(room_id) {
            player.last_room_id = Some(room.id);
            player.last_coords = Some(room.coords);
        }
    }
    if engine.players.insert(player.clone()).await.is_err() {
        let _ = transport.write_line("Registration failed.").await;
        return false;
    }

    engine.sessions.bind_player(player.id, session);
    let _ = transport.write_line("Registration complete.").await;
    for line in engine.welcome_hook.on_first_login(&player) {
        let _ = transport.write_line(&line).await;
    }
    finish_login(engine, session, transport, player).await;
    true
}

/// Shared tail of both login paths: sets session state, restores the
/// player's last known position (or the default room), and shows the
/// arrival room view.
async fn finish_login<T: LineTransport>(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    transport: &mut T,
    player: Player,
) {
    *session.player_id.write().unwrap() = Some(player.id);
    *session.username.write().unwrap() = Some(player.username.clone());
    *session.display_name.write().unwrap() = Some(player.display_name.clone());
    *session.is_admin.write().unwrap() = player.is_admin;
    *session.locale.write().unwrap() = Locale::new(player.preferred_locale.clone());
    *session.phase.write().unwrap() = SessionPhase::Authenticated;

    let coords = player
        .last_coords
        .filter(|c| engine.world.get_room_at(*c).is_some())
        .or_else(|| engine.world.default_room().and_then(|id| engine.world.get_room(id)).map(|r| r.coords));
    if let Some(coords) = coords {
        session.set_coords(coords);
    }

    let welcome = engine.catalog.render(
        &session.locale(),
        &moor_mud_common::LocKey::new("auth.login_success").param("username", &player.display_name),
    );
    let _ = transport.write_line(&welcome).await;

    engine.bus.publish(
        moor_mud_events::Event::new(moor_mud_events::EventKind::PlayerLogin).with_source(session.id),
    );
    send_room_view(engine, session).await;
}
