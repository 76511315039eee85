//! # tweetfetch common library
//!
//! Shared code for the tweetfetch workspace:
//! - Error type and result alias
//! - Credential file and TOML run configuration loading
//! - Tweet identifier type

pub mod config;
pub mod error;
pub mod tweet_id;

pub use error::{Error, Result};
pub use tweet_id::TweetId;
