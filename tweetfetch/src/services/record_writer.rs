//! One-JSON-file-per-tweet writer

use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::services::twitter_client::TweetRecord;

/// Record post-processing errors
#[derive(Debug, Error)]
pub enum RecordError {
    /// Record has no usable `id` field
    #[error("Record has no id field: {0}")]
    MissingId(String),

    /// Output file could not be written
    #[error("Failed to write {0}: {1}")]
    Write(PathBuf, String),
}

/// Identifier of a returned record, as used for its file name
///
/// The API returns ids as strings; numeric ids are accepted too. Anything
/// that could escape the output directory is rejected.
pub fn record_id(record: &TweetRecord) -> Result<String, RecordError> {
    let id = match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(RecordError::MissingId(summarize(record))),
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RecordError::MissingId(summarize(record)));
    }

    Ok(id)
}

fn summarize(record: &TweetRecord) -> String {
    let keys: Vec<&str> = record.keys().map(|k| k.as_str()).collect();
    format!("keys [{}]", keys.join(", "))
}

/// Writes records into one output directory
#[derive(Debug, Clone)]
pub struct RecordWriter {
    output_dir: PathBuf,
}

impl RecordWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the file a record with this id is written to
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.json", id))
    }

    /// Write `<id>.json` with the record's JSON serialization
    pub fn write(&self, id: &str, record: &TweetRecord) -> Result<PathBuf, RecordError> {
        let path = self.path_for(id);
        let to_error = |e: &dyn std::fmt::Display| RecordError::Write(path.clone(), e.to_string());

        let file = File::create(&path).map_err(|e| to_error(&e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, record).map_err(|e| to_error(&e))?;
        writer.flush().map_err(|e| to_error(&e))?;

        Ok(path)
    }
}
