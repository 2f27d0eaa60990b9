use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use fleetcast_core::{FleetcastConfig, RecordStore};
use fleetcast_runner::WorkerDispatcher;
use fleetcast_scheduler::{planning_table, SchedulerEngine};

#[derive(Parser)]
#[command(name = "fleetcast-daemon", about = "Device-fleet posting scheduler")]
struct Cli {
    /// Path to fleetcast.toml (defaults to ~/.fleetcast/fleetcast.toml).
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler loop (the default).
    Run,
    /// Print the expanded schedule as the operator surface sees it.
    Plan,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetcast=info,fleetcast_daemon=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // load config: explicit flag > FLEETCAST_CONFIG env > ~/.fleetcast/fleetcast.toml
    let config_path = cli
        .config
        .or_else(|| std::env::var("FLEETCAST_CONFIG").ok());
    let config = FleetcastConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        FleetcastConfig::default()
    });

    match cli.command.unwrap_or(Command::Run) {
        Command::Plan => print_plan(&config),
        Command::Run => run_scheduler(config).await?,
    }

    Ok(())
}

/// Render the planning table: one line per (device, system, base time).
fn print_plan(config: &FleetcastConfig) {
    let store = RecordStore::new(config.records.dir.clone());
    let snapshot = store.load_snapshot();

    println!(
        "{:<8} {:<10} {:<10} {:<18} {:<12} {:>5}  {:>6}  {:>7}  {}",
        "time", "device", "system", "engine", "platform", "count", "base", "offset", "albums"
    );
    for job in planning_table(&snapshot) {
        let albums = [job.album_intro.as_deref(), job.album_multi.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" + ");
        println!(
            "{:<8} {:<10} {:<10} {:<18} {:<12} {:>5}  {:>6}  {:>6}m  {}",
            job.effective_time.to_string(),
            job.device_id,
            job.system_key,
            job.engine.to_string(),
            job.platform,
            job.item_count,
            job.base_time.to_string(),
            job.offset_minutes,
            albums,
        );
    }
}

async fn run_scheduler(config: FleetcastConfig) -> anyhow::Result<()> {
    info!(records = %config.records.dir, "fleetcast scheduler starting");

    let dispatcher = Arc::new(WorkerDispatcher::new(
        config.worker.clone(),
        &config.retry,
    ));
    let engine = SchedulerEngine::new(&config, dispatcher);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine_task = tokio::spawn(async move { engine.run(shutdown_rx).await });

    // Cooperative stop only: ctrl-c ends the loop; an in-flight worker child
    // is killed with it and may be retried at its next occurrence.
    tokio::signal::ctrl_c().await?;
    info!("stop requested, shutting down");

    let _ = shutdown_tx.send(true);
    engine_task.await?;

    Ok(())
}
