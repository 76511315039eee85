//! Shared test helpers
//!
//! - `mock_api`: in-process stand-in for the tweet lookup API
//! - workspace builders for input CSV files and credential files

#![allow(dead_code)]

pub mod mock_api;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tweetfetch::RunConfig;

pub use mock_api::{mock_tweet, MockApi, TEST_APP_KEY, TEST_APP_SECRET, TEST_BEARER_TOKEN};

/// Scratch root folder with credential file
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let workspace = Self {
            dir: TempDir::new().unwrap(),
        };
        workspace.write_credentials(TEST_BEARER_TOKEN, TEST_APP_KEY, TEST_APP_SECRET);
        workspace
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.root().join("tweet_keys_file.json")
    }

    pub fn write_credentials(&self, oauth_token: &str, app_key: &str, app_secret: &str) {
        let content = serde_json::json!({
            "oauth_token": oauth_token,
            "app_key": app_key,
            "app_secret": app_secret,
        });
        fs::write(self.credentials_path(), content.to_string()).unwrap();
    }

    /// Write `<root>/<set>/<name>` with an index column and one id column
    pub fn write_ids_csv(&self, set: &str, name: &str, ids: &[u64]) -> PathBuf {
        let mut content = String::from("idx,tweet_id\n");
        for (index, id) in ids.iter().enumerate() {
            content.push_str(&format!("{},{}\n", index, id));
        }
        self.write_csv(set, name, &content)
    }

    pub fn write_csv(&self, set: &str, name: &str, content: &str) -> PathBuf {
        let dir = self.root().join(set);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Output directory of an input file
    pub fn output_dir(&self, set: &str, stem: &str) -> PathBuf {
        self.root().join(set).join("data").join(stem)
    }

    /// Sorted file names in an output directory
    pub fn output_files(&self, set: &str, stem: &str) -> Vec<String> {
        let dir = self.output_dir(set, stem);
        if !dir.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn run_config(&self, api: &MockApi) -> RunConfig {
        RunConfig {
            root_folder: self.root().to_path_buf(),
            credentials_path: self.credentials_path(),
            pause_between_files: Duration::ZERO,
            api_base_url: api.base_url.clone(),
            show_progress: false,
            ..Default::default()
        }
    }
}
