use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use gauntlet_execution::DayScheduler;
use gauntlet_arena::api::{self, AppState};
use gauntlet_arena::{
    ArenaConfig, ArenaHost, BroadcastSink, InMemoryBank, MemoryStore, SessionDeps, SessionStore,
    SqliteStore, SystemClock, TaskConfig,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ArenaConfig::from_env();
    let store: Arc<dyn SessionStore> = match &config.db_path {
        Some(path) => Arc::new(
            SqliteStore::open(path, config.store_buffer)
                .with_context(|| format!("open snapshot store at {}", path.display()))?,
        ),
        None => {
            warn!("ARENA_DB_PATH not set; sessions will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    let sink = BroadcastSink::new(config.announce_buffer);
    let announcements = sink.sender();

    let deps = SessionDeps {
        balance: Arc::new(InMemoryBank::new(config.starting_balance)),
        announcer: Arc::new(sink),
        store,
        clock: Arc::new(SystemClock),
    };
    let scheduler = DayScheduler::new(config.day_config())
        .map_err(anyhow::Error::msg)
        .context("invalid day window config")?;
    let task_config = TaskConfig {
        poll: config.poll_interval(),
        feast_pause: config.feast_pause(),
        command_buffer: config.command_buffer,
        scheduler,
    };
    let host = Arc::new(ArenaHost::new(deps, task_config, config.seed));
    host.resume_running()
        .await
        .context("resume persisted sessions")?;

    let app = api::router(AppState {
        host,
        announcements,
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen addr")?;
    info!(%addr, "arena service listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;
    axum::serve(listener, app).await?;
    Ok(())
}
