//! Run orchestration
//!
//! One run walks every discovered input file in path order:
//!
//! 1. Skip the file if its output directory already exists
//! 2. Load the joined identifier set
//! 3. Load credentials and build a fresh client
//! 4. Claim the output directory and resolve all batches into it
//! 5. Pause before the next file
//!
//! Steps 2 and 3 run before the claim, so a file whose setup fails is
//! retried on the next run.
//!
//! Files are handled strictly one after another, with at most one request
//! in flight.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tweetfetch_common::config::{
    Credentials, DEFAULT_API_BASE_URL, DEFAULT_CREDENTIALS_PATH, DEFAULT_PATTERN,
    DEFAULT_PAUSE_MS,
};
use tweetfetch_common::TweetId;

use crate::error::FetchResult;
use crate::services::batch_resolver::{BatchReport, BatchResolver};
use crate::services::id_extractor::load_ids;
use crate::services::input_scanner::InputScanner;
use crate::services::output_layout::{Claim, OutputLayout};
use crate::services::record_writer::RecordWriter;
use crate::services::twitter_client::{TweetLookup, TwitterClient, TwitterError};

/// Settings of one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Folder whose subfolders hold the input CSV files
    pub root_folder: PathBuf,
    /// JSON credential file
    pub credentials_path: PathBuf,
    /// File name fragment of input files
    pub pattern: String,
    /// Sleep through HTTP 429 instead of failing the batch
    pub wait_on_rate_limit: bool,
    /// Pause after each processed file
    pub pause_between_files: Duration,
    /// Lookup API host
    pub api_base_url: String,
    /// Draw a progress bar per file
    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root_folder: PathBuf::from("."),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            pattern: DEFAULT_PATTERN.to_string(),
            wait_on_rate_limit: true,
            pause_between_files: Duration::from_millis(DEFAULT_PAUSE_MS),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            show_progress: true,
        }
    }
}

/// Counters of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub files_discovered: usize,
    pub files_skipped: usize,
    pub files_processed: usize,
    pub totals: BatchReport,
}

impl RunSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: None,
            files_discovered: 0,
            files_skipped: 0,
            files_processed: 0,
            totals: BatchReport::default(),
        }
    }
}

/// Builds one lookup client per processed file
#[async_trait]
pub trait ClientFactory: Send + Sync {
    type Client: TweetLookup;

    async fn create(
        &self,
        credentials: &Credentials,
        wait_on_rate_limit: bool,
    ) -> Result<Self::Client, TwitterError>;
}

/// Factory for the real API client
#[derive(Debug, Clone)]
pub struct TwitterClientFactory {
    base_url: String,
}

impl TwitterClientFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ClientFactory for TwitterClientFactory {
    type Client = TwitterClient;

    async fn create(
        &self,
        credentials: &Credentials,
        wait_on_rate_limit: bool,
    ) -> Result<TwitterClient, TwitterError> {
        TwitterClient::from_credentials(credentials, wait_on_rate_limit, &self.base_url).await
    }
}

/// Run against the real API
pub async fn run(config: &RunConfig) -> FetchResult<RunSummary> {
    let factory = TwitterClientFactory::new(config.api_base_url.clone());
    run_with(config, &factory).await
}

/// Run with an injected client factory
pub async fn run_with<F: ClientFactory>(config: &RunConfig, factory: &F) -> FetchResult<RunSummary> {
    let mut summary = RunSummary::new(Utc::now());

    let inputs = InputScanner::new(config.pattern.as_str()).scan(&config.root_folder)?;
    summary.files_discovered = inputs.len();

    info!(
        root = %config.root_folder.display(),
        files = inputs.len(),
        "Discovered input files"
    );

    for (position, input) in inputs.iter().enumerate() {
        let layout = OutputLayout::for_input(input)?;

        if layout.is_processed() {
            info!(
                input = %input.display(),
                output = %layout.output_dir().display(),
                "Output directory exists, skipping"
            );
            summary.files_skipped += 1;
            continue;
        }

        let ids: Vec<TweetId> = load_ids(input)?.into_iter().collect();
        let credentials = Credentials::load(&config.credentials_path)?;
        let client = factory.create(&credentials, config.wait_on_rate_limit).await?;

        if layout.claim()? == Claim::AlreadyProcessed {
            warn!(input = %input.display(), "Output directory appeared concurrently, skipping");
            summary.files_skipped += 1;
            continue;
        }

        info!(
            input = %input.display(),
            ids = ids.len(),
            output = %layout.output_dir().display(),
            "Processing input file"
        );

        let writer = RecordWriter::new(layout.output_dir());
        let report = BatchResolver::new(config.show_progress)
            .resolve(&client, &ids, &writer)
            .await?;
        drop(client);

        info!(
            input = %input.display(),
            batches = report.batches_requested,
            failed = report.batches_failed,
            written = report.records_written,
            not_found = report.ids_not_found,
            "Input file complete"
        );

        summary.files_processed += 1;
        summary.totals.merge(&report);

        if position + 1 < inputs.len() && !config.pause_between_files.is_zero() {
            tokio::time::sleep(config.pause_between_files).await;
        }
    }

    summary.finished_at = Some(Utc::now());

    info!(
        discovered = summary.files_discovered,
        processed = summary.files_processed,
        skipped = summary.files_skipped,
        written = summary.totals.records_written,
        failed_batches = summary.totals.batches_failed,
        "Run complete"
    );

    Ok(summary)
}
