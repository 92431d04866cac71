//! The concurrent game engine: session lifecycle, command
//! dispatch, movement, monster lifecycle, combat turn loop, scheduler, and
//! broadcast router, assembled behind [`Engine`] and driven by
//! [`run_connection`] per accepted transport.

pub mod auth;
pub mod broadcast;
pub mod combat;
pub mod commands;
pub mod dispatcher;
pub mod engine;
pub mod monsters;
pub mod movement;
pub mod room_view;
pub mod scheduler;
pub mod session;

pub use engine::{Engine, NoopWelcomeHook, WelcomeHook};
pub use session::{SessionManager, SessionState};

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use moor_mud_common::SessionId;
use moor_mud_net::LineTransport;
use tokio::sync::mpsc;

/// Drives one accepted connection end to end: the
/// auth menu, then the read-dispatch-write loop until the transport
/// closes, an idle timeout elapses, or something (e.g. admin `kick`)
/// requests the session close. Registers and unregisters the session with
/// `engine.sessions` on the way in and out.
pub async fn run_connection<T: LineTransport>(engine: Arc<Engine>, mut transport: T) {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let session = Arc::new(SessionState::new(SessionId::new(), out_tx));
    engine.sessions.register(session.clone());

    if auth::run_auth_phase(&engine, &session, &mut transport).await {
        game_loop(&engine, &session, &mut transport, &mut out_rx).await;
    }

    let _ = transport.close("connection ended").await;
    if let Some(player_id) = session.player_id() {
        if let Ok(Some(mut player)) = engine.players.find_by_id(player_id).await {
            player.last_coords = session.coords().or(player.last_coords);
            let _ = engine.players.update(player).await;
        }
    }
    engine.sessions.unregister(session.id);
}

async fn game_loop<T: LineTransport>(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    transport: &mut T,
    out_rx: &mut mpsc::UnboundedReceiver<String>,
) {
    let idle_timeout = chrono::Duration::seconds(engine.config.session_idle_timeout_secs as i64);
    loop {
        if session.should_close() || transport.is_closed() {
            return;
        }
        if session.idle_for() > idle_timeout {
            let _ = transport.write_line("You have been idle too long. Disconnecting.").await;
            return;
        }

        tokio::select! {
            biased;

            outbound = out_rx.recv() => {
                match outbound {
                    Some(line) => {
                        if transport.write_line(&line).await.is_err() {
                            return;
                        }
                    }
                    None => return,
                }
            }

            line = transport.read_line(Duration::from_secs(5)) => {
                match line {
                    Ok(Some(raw)) => {
                        if raw.trim().is_empty() {
                            continue;
                        }
                        dispatcher::dispatch(engine, session, &raw).await;
                    }
                    Ok(None) => {
                        if transport.is_closed() {
                            return;
                        }
                        // read timed out; loop back around to re-check
                        // should_close/idle_for without blocking forever.
                    }
                    Err(_) => return,
                }
            }
        }

        if session.should_close() {
            // drain anything already queued (e.g. a "Goodbye." or a kick
            // notice) before tearing the transport down.
            while let Ok(line) = out_rx.try_recv() {
                let _ = transport.write_line(&line).await;
            }
            return;
        }
    }
}

/// Wires the three background loops the scheduler/monster lifecycle need
///, spawning each as its own task. The
/// caller (the server binary) holds the returned handles only to decide
/// when to abort them at shutdown; they otherwise run for the process
/// lifetime.
pub fn spawn_background_tasks(engine: Arc<Engine>) -> Vec<tokio::task::JoinHandle<()>> {
    let tick_engine = engine.clone();
    let tick_handle = tokio::spawn(async move { scheduler::run_tick_loop(tick_engine).await });

    let day_night_engine = engine.clone();
    let day_night_handle =
    tokio::spawn(async move { scheduler::run_day_night_loop(day_night_engine).await });

    let reaper_handle = tokio::spawn(run_idle_reaper(engine));

    vec![tick_handle, day_night_handle, reaper_handle]
}

/// Periodically scans every session for one that's both past its idle
/// deadline and not already mid-teardown, and requests it close. The connection task itself does the actual
/// disconnect; this only flips the flag.
async fn run_idle_reaper(engine: Arc<Engine>) {
    let interval = Duration::from_secs(engine.config.session_reaper_interval_secs);
    let idle_timeout = chrono::Duration::seconds(engine.config.session_idle_timeout_secs as i64);
    loop {
        tokio::time::sleep(interval).await;
        for session in engine.sessions.all() {
            if session.force_close.load(Ordering::SeqCst) {
                continue;
            }
            if session.idle_for() > idle_timeout {
                session.request_close();
            }
        }
    }
}
