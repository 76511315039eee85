//! Common error types for tweetfetch

use thiserror::Error;

/// Common result type for tweetfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Setup and input errors shared across the workspace
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential file could not be loaded
    #[error("Credential error: {0}")]
    Credentials(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
