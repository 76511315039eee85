//! Error types for tweetfetch
//!
//! Everything here is an unrecoverable setup error that ends the run.
//! Per-batch failures never surface as errors; see
//! [`crate::services::batch_resolver`].

use thiserror::Error;

use crate::services::input_scanner::ScanError;
use crate::services::twitter_client::TwitterError;

/// Run-level error type
#[derive(Debug, Error)]
pub enum FetchError {
    /// Credential file, CSV input or output directory error
    #[error(transparent)]
    Common(#[from] tweetfetch_common::Error),

    /// Input discovery error
    #[error("Input scan failed: {0}")]
    Scan(#[from] ScanError),

    /// Client construction failed or the API rejected the credentials
    #[error("API client error: {0}")]
    Client(#[from] TwitterError),
}

/// Result type for run-level operations
pub type FetchResult<T> = Result<T, FetchError>;
