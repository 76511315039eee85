//! tweetfetch library interface
//!
//! Resolves tweet ids listed in CSV files into one JSON file per tweet.
//! Exposes the services for the binary and for integration testing.

pub mod error;
pub mod services;

pub use crate::error::{FetchError, FetchResult};
pub use crate::services::orchestrator::{run, run_with, RunConfig, RunSummary};
