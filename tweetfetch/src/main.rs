//! tweetfetch - resolve tweet ids from CSV files into JSON files
//!
//! Scans `<root>/*/*tweet*.csv`, looks every id up through the Twitter v2
//! API in batches of 100 and writes `<root>/<set>/data/<name>/<id>.json`.
//! Inputs whose output directory already exists are skipped.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tweetfetch::RunConfig;
use tweetfetch_common::config::{
    resolve_value, TomlConfig, DEFAULT_API_BASE_URL, DEFAULT_CREDENTIALS_PATH,
    DEFAULT_PATTERN, DEFAULT_PAUSE_MS,
};

/// Command-line arguments for tweetfetch
#[derive(Parser, Debug)]
#[command(name = "tweetfetch")]
#[command(about = "Resolve tweet ids listed in CSV files into one JSON file per tweet")]
#[command(version)]
struct Args {
    /// Folder whose subfolders contain the input CSV files
    #[arg(short, long, env = "TWEETFETCH_ROOT")]
    root_folder: Option<PathBuf>,

    /// JSON file with oauth_token, app_key and app_secret
    #[arg(short = 'k', long, env = "TWEETFETCH_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// File name fragment identifying input CSV files
    #[arg(short, long, env = "TWEETFETCH_PATTERN")]
    pattern: Option<String>,

    /// Fail the batch on HTTP 429 instead of sleeping until the limit resets
    #[arg(long)]
    no_wait_on_rate_limit: bool,

    /// Pause after each processed file, in milliseconds
    #[arg(long, env = "TWEETFETCH_PAUSE_MS")]
    pause_ms: Option<u64>,

    /// API host
    #[arg(long, env = "TWEETFETCH_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Optional TOML config file
    #[arg(short, long, env = "TWEETFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Do not draw progress bars
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load(args.config.as_deref())
        .context("Failed to load TOML config")?;

    // Initialize tracing
    let default_filter = format!(
        "tweetfetch={level},tweetfetch_common={level}",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tweetfetch {}", env!("CARGO_PKG_VERSION"));

    let config = build_run_config(&args, toml_config);

    info!("Root folder: {}", config.root_folder.display());
    info!("Credentials: {}", config.credentials_path.display());
    info!(
        "Pattern: *{}*.csv, wait on rate limit: {}",
        config.pattern, config.wait_on_rate_limit
    );

    let summary = tweetfetch::run(&config)
        .await
        .context("Tweet lookup run failed")?;

    info!(
        "Done: {} processed, {} skipped, {} tweets written, {} failed batches",
        summary.files_processed,
        summary.files_skipped,
        summary.totals.records_written,
        summary.totals.batches_failed
    );

    Ok(())
}

fn build_run_config(args: &Args, toml_config: TomlConfig) -> RunConfig {
    let wait_flag = args.no_wait_on_rate_limit.then_some(false);

    RunConfig {
        root_folder: resolve_value(
            "root_folder",
            args.root_folder.clone(),
            toml_config.root_folder,
            PathBuf::from("."),
        ),
        credentials_path: resolve_value(
            "credentials_path",
            args.credentials.clone(),
            toml_config.credentials_path,
            PathBuf::from(DEFAULT_CREDENTIALS_PATH),
        ),
        pattern: resolve_value(
            "pattern",
            args.pattern.clone(),
            toml_config.pattern,
            DEFAULT_PATTERN.to_string(),
        ),
        wait_on_rate_limit: resolve_value(
            "wait_on_rate_limit",
            wait_flag,
            toml_config.wait_on_rate_limit,
            true,
        ),
        pause_between_files: Duration::from_millis(resolve_value(
            "pause_ms",
            args.pause_ms,
            toml_config.pause_ms,
            DEFAULT_PAUSE_MS,
        )),
        api_base_url: resolve_value(
            "api_base_url",
            args.api_base_url.clone(),
            toml_config.api_base_url,
            DEFAULT_API_BASE_URL.to_string(),
        ),
        show_progress: !args.no_progress,
    }
}
