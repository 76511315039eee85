//! tweetfetch services
//!
//! Input discovery, identifier extraction, API lookup and output writing,
//! tied together by the orchestrator.

pub mod batch_resolver;
pub mod id_extractor;
pub mod input_scanner;
pub mod orchestrator;
pub mod output_layout;
pub mod record_writer;
pub mod twitter_client;

pub use batch_resolver::{BatchReport, BatchResolver, BATCH_SIZE};
pub use id_extractor::{extract_ids, load_ids, ColumnIds, ColumnSelection, ExtractedIds};
pub use input_scanner::{InputScanner, ScanError};
pub use orchestrator::{run, run_with, ClientFactory, RunConfig, RunSummary, TwitterClientFactory};
pub use output_layout::{Claim, OutputLayout};
pub use record_writer::{RecordError, RecordWriter};
pub use twitter_client::{LookupResponse, TweetLookup, TweetRecord, TwitterClient, TwitterError};
