mod config;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use moor_mud_common::{DefaultCatalog, FactionRelations, MessageCatalog};
use moor_mud_engine::combat::CombatRegistry;
use moor_mud_engine::{broadcast::BroadcastRouter, commands, dispatcher::CommandDispatcher};
use moor_mud_engine::{monsters, scheduler::Scheduler, session::SessionManager};
use moor_mud_engine::{run_connection, spawn_background_tasks, Engine, NoopWelcomeHook};
use moor_mud_events::EventBus;
use moor_mud_net::listen;
use moor_mud_world::{InMemoryRepositories, WorldStore};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::config::Args;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let config = config::load(&args)?;

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_ansi(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_max_level(if args.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("unable to configure logging");

    let world = Arc::new(WorldStore::new());
    seed::seed_default_world(&world);

    let players: Arc<dyn moor_mud_world::PlayerRepository> = Arc::new(InMemoryRepositories::new());
    let bus = EventBus::new(config.event_history_capacity);
    let bus_task = bus.start();
    let sessions = Arc::new(SessionManager::new());
    let catalog: Arc<dyn MessageCatalog> = Arc::new(DefaultCatalog::new());
    let broadcast = Arc::new(BroadcastRouter::new(sessions.clone(), catalog.clone(), bus.clone()));
    let combats = Arc::new(CombatRegistry::new());
    let scheduler = Arc::new(Scheduler::new());
    let dispatcher = Arc::new(CommandDispatcher::new());
    commands::register_all(&dispatcher);

    let mut relations = FactionRelations::new();
    relations.mark_neutral(
        moor_mud_common::Faction::new("player"),
        moor_mud_common::Faction::new("townsfolk"),
    );

    let default_respawn_room = world
        .default_room()
        .expect("seed world always registers a default room");

    let engine = Arc::new(Engine {
        config: config.clone(),
        world,
        bus,
        sessions,
        combats,
        broadcast,
        scheduler,
        dispatcher,
        catalog,
        players,
        relations,
        default_respawn_room,
        welcome_hook: Arc::new(NoopWelcomeHook),
    });

    let culled = engine.cull_all_excess_instances();
    if culled > 0 {
        info!(culled, "trimmed seed monsters over their global cap");
    }
    engine.bus.publish(moor_mud_events::Event::new(
        moor_mud_events::EventKind::ServerStarted,
    ));

    engine.scheduler.register_job(
        "monster_lifecycle",
        vec![0, 30],
        Arc::new(|engine| Box::pin(monsters::run_lifecycle_tick(engine))),
    );

    let mut background = spawn_background_tasks(engine.clone());

    let listen_addr: SocketAddr = format!("{}:{}", config.listen_address, config.listen_port)
        .parse()
        .expect("listen_address/listen_port must form a valid socket address");

    let listen_engine = engine.clone();
    let listen_task = tokio::spawn(async move {
        let engine = listen_engine;
        if let Err(e) = listen(listen_addr, move |transport, peer| {
            let engine = engine.clone();
            async move {
                info!(%peer, "connection accepted");
                run_connection(engine, transport).await;
                info!(%peer, "connection closed");
            }
        })
        .await
        {
            tracing::error!(error = %e, "listener exited with an error");
        }
    });

    let mut hup = signal(SignalKind::hangup())?;
    let mut term = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = listen_task => info!("listener task exited"),
        _ = hup.recv() => info!("received SIGHUP, shutting down"),
        _ = term.recv() => info!("received SIGTERM, shutting down"),
        _ = interrupt.recv() => info!("received SIGINT, shutting down"),
    }

    for handle in background.drain(..) {
        handle.abort();
    }
    engine.bus.publish(moor_mud_events::Event::new(
        moor_mud_events::EventKind::ServerStopping,
    ));
    engine.bus.stop().await;
    bus_task.abort();

    Ok(())
}
