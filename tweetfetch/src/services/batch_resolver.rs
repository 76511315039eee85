//! Batch resolver
//!
//! Splits an identifier list into batches of 100, looks each batch up and
//! writes every returned tweet to its own file.
//!
//! A batch that fails (request error or a record without an id) is logged
//! and dropped; the loop moves on to the next batch. Only a rejected
//! credential stops the loop, since every later batch would fail the same way.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tweetfetch_common::TweetId;

use crate::services::record_writer::{record_id, RecordError, RecordWriter};
use crate::services::twitter_client::{
    LookupResponse, TweetLookup, TwitterError, MAX_IDS_PER_REQUEST,
};

/// Identifiers per lookup request
pub const BATCH_SIZE: usize = MAX_IDS_PER_REQUEST;

/// Counters for one input file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Lookup requests issued (one per non-empty batch)
    pub batches_requested: usize,
    /// Batches whose records were dropped
    pub batches_failed: usize,
    /// Files written
    pub records_written: usize,
    /// Ids the API reported as unavailable (deleted, protected, ...)
    pub ids_not_found: usize,
}

impl BatchReport {
    pub fn merge(&mut self, other: &BatchReport) {
        self.batches_requested += other.batches_requested;
        self.batches_failed += other.batches_failed;
        self.records_written += other.records_written;
        self.ids_not_found += other.ids_not_found;
    }
}

/// Number of lookup requests needed for `id_count` identifiers
pub fn batch_count(id_count: usize) -> usize {
    id_count.div_ceil(BATCH_SIZE)
}

/// Sequential batch lookup and write-out
#[derive(Debug, Clone, Default)]
pub struct BatchResolver {
    show_progress: bool,
}

impl BatchResolver {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    /// Resolve all ids into `writer`'s directory
    ///
    /// Returns `Err` only for [`TwitterError::Unauthorized`].
    pub async fn resolve<C>(
        &self,
        client: &C,
        ids: &[TweetId],
        writer: &RecordWriter,
    ) -> Result<BatchReport, TwitterError>
    where
        C: TweetLookup + ?Sized,
    {
        let total = batch_count(ids.len());
        let progress = self.progress_bar(total, writer);
        let mut report = BatchReport::default();

        for (index, batch) in ids.chunks(BATCH_SIZE).enumerate() {
            report.batches_requested += 1;

            let response = match client.get_tweets(batch).await {
                Ok(response) => response,
                Err(e @ TwitterError::Unauthorized(..)) => {
                    progress.abandon_with_message("unauthorized");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        batch = index + 1,
                        of = total,
                        error = %e,
                        "Lookup failed, batch dropped"
                    );
                    report.batches_failed += 1;
                    progress.inc(1);
                    continue;
                }
            };

            report.ids_not_found += response.errors.len();
            for problem in &response.errors {
                tracing::debug!(
                    id = problem.id().unwrap_or("?"),
                    title = problem.title.as_deref().unwrap_or(""),
                    detail = problem.detail.as_deref().unwrap_or(""),
                    kind = problem.problem_type.as_deref().unwrap_or(""),
                    "Tweet not returned"
                );
            }

            match write_batch(&response, writer) {
                Ok(written) => {
                    report.records_written += written;
                    tracing::debug!(
                        batch = index + 1,
                        of = total,
                        requested = batch.len(),
                        written = written,
                        "Batch written"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        batch = index + 1,
                        of = total,
                        error = %e,
                        "Batch post-processing failed, batch dropped"
                    );
                    report.batches_failed += 1;
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(report)
    }

    fn progress_bar(&self, total: usize, writer: &RecordWriter) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(writer.output_dir().display().to_string());
        bar
    }
}

/// Write every record of a response; nothing is written if any record lacks an id
fn write_batch(response: &LookupResponse, writer: &RecordWriter) -> Result<usize, RecordError> {
    let records = match &response.data {
        Some(records) => records,
        None => {
            tracing::info!(
                problems = response.errors.len(),
                "Lookup returned no tweets for batch"
            );
            return Ok(0);
        }
    };

    let ids = records
        .iter()
        .map(record_id)
        .collect::<Result<Vec<_>, _>>()?;

    for (id, record) in ids.iter().zip(records) {
        writer.write(id, record)?;
    }

    Ok(ids.len())
}
