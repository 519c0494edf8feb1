use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filestore_index::{IndexOptions, SortDirection, SortKey};
use std::{env, path::PathBuf, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub case_sensitive_search: bool,
    pub page_size: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Virtual folder index for a networked file store")]
pub struct Args {
    /// Database URL (overrides FILESTORE_INDEX_DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Compare search patterns case-sensitively (overrides FILESTORE_INDEX_CASE_SENSITIVE)
    #[arg(long, global = true)]
    pub case_sensitive: Option<bool>,

    /// Default page size for listings (overrides FILESTORE_INDEX_PAGE_SIZE)
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run migrations and exit
    Migrate,

    /// List the folders directly below PREFIX
    Folders {
        #[arg(default_value = "/")]
        prefix: String,
        #[arg(long, default_value_t = 0)]
        start: usize,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List the files directly inside FOLDER
    Ls {
        #[arg(default_value = "/")]
        folder: String,
        /// `*`/`?` wildcard pattern on the file name
        #[arg(long)]
        pattern: Option<String>,
        /// name or size
        #[arg(long, default_value = "name")]
        sort: SortKey,
        /// asc or desc
        #[arg(long, default_value = "asc")]
        order: SortDirection,
        #[arg(long, default_value_t = 0)]
        start: usize,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one record, tombstones included
    Stat { name: String },

    /// Register a local file as uploaded under NAME, resuming a broken upload
    Upload {
        name: String,
        file: PathBuf,
        /// Bytes recorded per progress step
        #[arg(long, default_value_t = 1024 * 1024)]
        chunk_size: usize,
        /// Extra metadata as KEY=VALUE
        #[arg(long = "meta", value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,
    },

    /// Rename a file
    Mv { old_name: String, new_name: String },

    /// Mark a file as deleted
    Rm { name: String },

    /// List files whose upload never finished
    Incomplete,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_db = env::var("FILESTORE_INDEX_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/file_index.db".into());
        let env_case_sensitive = env_or("FILESTORE_INDEX_CASE_SENSITIVE", true)?;
        let env_page_size = env_or("FILESTORE_INDEX_PAGE_SIZE", 1024)?;

        // --- Merge ---
        let cfg = Self {
            database_url: args.database_url.unwrap_or(env_db),
            case_sensitive_search: args.case_sensitive.unwrap_or(env_case_sensitive),
            page_size: args.page_size.unwrap_or(env_page_size),
        };

        Ok((cfg, args.command))
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            case_sensitive_search: self.case_sensitive_search,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))
}
