//! League Sync - OCL Draft League Data Pipeline
//!
//! Syncs draft logs and decklists from event directories to SQLite and
//! maintains the derived card collection. Runs continuously on a fixed
//! cadence; a failed cycle stops the scheduler rather than retrying.

use clap::Parser;
use league_sync::{config::SyncConfig, database, sync};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::interval;

/// OCL league sync server - reconciles draft exports into SQLite
#[derive(Parser, Debug)]
#[command(name = "league_sync")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// Path to the JSON sync configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Run once and exit (default: run continuously on a schedule)
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Sync cadence in minutes when running continuously
    #[arg(long, default_value_t = 5)]
    interval_minutes: u64,
}

/// Returns the default database path: ~/.local/share/league_sync/league.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("league_sync")
        .join("league.db")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);

    log::info!("Starting league_sync...");
    log::info!("Database path: {}", db_path.display());

    let config = match SyncConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load config {}: {}", args.config.display(), e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Data folder: {} ({} configured event(s))",
        config.data_folder.display(),
        config.events.len()
    );

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {}", e);
                std::process::exit(1);
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    // Open database connection
    let conn = match Connection::open(&db_path) {
        Ok(conn) => {
            log::info!("Opened database: {}", db_path.display());
            conn
        }
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database schema
    if let Err(e) = database::init_schema(&conn) {
        log::error!("Failed to initialize database schema: {}", e);
        std::process::exit(1);
    }

    match database::get_player_count(&conn) {
        Ok(count) => log::info!("Player directory holds {} player(s)", count),
        Err(e) => log::warn!("Failed to read player count: {}", e),
    }

    // Wrap connection in Arc<Mutex> for sharing with the refresh tasks
    let db = Arc::new(Mutex::new(conn));

    if args.once {
        if let Err(e) = sync::run_sync(&db, &config).await {
            log::error!("Sync failed: {}", e);
            std::process::exit(1);
        }
    } else {
        log::info!(
            "Running in daemon mode, syncing every {} minute(s)",
            args.interval_minutes
        );
        run_daemon(&db, &config, args.interval_minutes).await;
    }
}

/// Run the sync daemon on a fixed cadence. Reschedules after each
/// successful cycle; stops permanently after a failed one (the operator
/// restarts after investigating).
async fn run_daemon(db: &Arc<Mutex<Connection>>, config: &SyncConfig, interval_minutes: u64) {
    let mut ticker = interval(Duration::from_secs(interval_minutes * 60));

    loop {
        // The first tick completes immediately, so the first cycle runs at startup
        ticker.tick().await;
        if let Err(e) = sync::run_sync(db, config).await {
            log::error!("Sync cycle failed: {}. Scheduler stopped; restart to resume.", e);
            break;
        }
    }
}
