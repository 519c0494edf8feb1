use anyhow::Result;
use filestore_index::{FileIndex, RecordJournal};
use sqlx::sqlite::SqlitePoolOptions;
use std::{path::Path, process::ExitCode, sync::Arc};
use tracing_subscriber::EnvFilter;

mod app_error;
mod commands;
mod config;

use app_error::AppError;
use config::{AppConfig, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Logging setup (stderr, stdout carries command output) ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let err = AppError::from(err);
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

async fn run() -> Result<()> {
    // --- Parse config + command ---
    let (cfg, command) = AppConfig::from_env_and_args()?;
    tracing::debug!("Running {:?} with config: {:?}", command, cfg);

    // --- Initialize SQLite connection ---
    let db_url = &cfg.database_url;
    prepare_database_file(db_url)?;

    let db: Arc<sqlx::Pool<sqlx::Sqlite>> = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?,
    );

    // --- Handle migration mode ---
    if matches!(command, Command::Migrate) {
        RecordJournal::new(db).migrate().await?;
        tracing::info!("Database migration complete.");
        return Ok(());
    }

    let index = FileIndex::open(db, cfg.index_options()).await?;
    commands::dispatch(&index, &cfg, command).await
}

/// Make sure the SQLite file and its parent directory exist before SQLx
/// connects, since a plain `sqlite://` URL does not create them.
fn prepare_database_file(db_url: &str) -> Result<()> {
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");
    let db_path = db_path.split('?').next().unwrap_or_default();
    if db_path.is_empty() || db_path.starts_with(":memory:") {
        return Ok(());
    }
    tracing::debug!("Interpreted SQLite path => {}", db_path);

    let db_path = Path::new(db_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(db_path)
    {
        Ok(_) => tracing::debug!("Database file can be created/opened."),
        Err(e) => tracing::warn!("Failed to open database file manually: {}", e),
    }
    Ok(())
}
