//! Input CSV discovery
//!
//! Finds `<root>/*/<name>.csv` files whose name contains a fragment
//! (default `tweet`). Only files exactly one directory below the root are
//! considered.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Input scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Scanner for identifier CSV files
#[derive(Debug, Clone)]
pub struct InputScanner {
    name_fragment: String,
    extension: String,
}

impl InputScanner {
    /// Scanner matching `*<name_fragment>*.csv`
    pub fn new(name_fragment: impl Into<String>) -> Self {
        Self {
            name_fragment: name_fragment.into(),
            extension: "csv".to_string(),
        }
    }

    /// List matching files, sorted by path
    pub fn scan(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        let mut files = Vec::new();

        let walker = WalkDir::new(root_path)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.matches(&entry) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    // Unreadable subdirectory; keep scanning the rest
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        files.sort();

        tracing::debug!(
            root = %root_path.display(),
            fragment = %self.name_fragment,
            found = files.len(),
            "Input scan complete"
        );

        Ok(files)
    }

    fn matches(&self, entry: &DirEntry) -> bool {
        let path = entry.path();

        let extension_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false);

        let name_matches = entry
            .file_name()
            .to_str()
            .map(|name| name.contains(self.name_fragment.as_str()))
            .unwrap_or(false);

        extension_matches && name_matches
    }
}

impl Default for InputScanner {
    fn default() -> Self {
        Self::new(tweetfetch_common::config::DEFAULT_PATTERN)
    }
}
