//! Marquee - main entry point
//!
//! Wires the scheduler, player shim, command bus, runtime state, and HTTP
//! control surface together. The process entry point owns every shared
//! object and injects it explicitly; there are no global singletons.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee::config::Config;
use marquee::playback::bus::command_bus;
use marquee::playback::player::{PlayerHandle, TimedPlayer};
use marquee::playback::Scheduler;
use marquee::{api, db, SharedState};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "marquee")]
#[command(about = "Unattended signage playback scheduling daemon")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "MARQUEE_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP port (overrides the config file)
    #[arg(short, long, env = "MARQUEE_PORT")]
    port: Option<u16>,

    /// SQLite database path (overrides the config file)
    #[arg(short, long, env = "MARQUEE_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path).context("Failed to load configuration file")?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("marquee={},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting marquee on port {}", config.port);
    info!("Database: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let pool = SqlitePoolOptions::new()
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true),
        )
        .await
        .context("Failed to open database")?;
    db::init::initialize_database(&pool)
        .await
        .context("Failed to initialize database")?;

    let state = Arc::new(SharedState::new());
    let (bus, commands) = command_bus();
    let (player, player_commands) = PlayerHandle::new();
    let (player_event_tx, player_events) = mpsc::unbounded_channel();
    let (output_tx, mut output_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Headless duration-driven player; a real renderer replaces this by
    // draining the same command channel.
    tokio::spawn(TimedPlayer::new(player_commands, player_event_tx).run());

    // Output-routing collaborator boundary: commands are forwarded, not
    // interpreted.
    tokio::spawn(async move {
        while let Some(command) = output_rx.recv().await {
            info!(command = ?command, "Forwarding output command to output router");
        }
    });

    let scheduler = Scheduler::new(
        pool.clone(),
        Arc::clone(&state),
        commands,
        player,
        player_events,
        output_tx,
    );
    tokio::spawn(scheduler.run(shutdown_rx));
    info!("Scheduler started");

    api::server::run(&config, state, bus, pool)
        .await
        .context("HTTP server error")?;

    let _ = shutdown_tx.send(true);
    info!("Shutdown complete");
    Ok(())
}
