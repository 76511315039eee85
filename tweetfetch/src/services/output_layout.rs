//! Output directory layout and the idempotency gate
//!
//! Records of `<dir>/<name>.csv` are written to `<dir>/data/<name>/`.
//! The existence of that directory marks the input as processed: a second
//! run skips the input entirely, even if the first run stopped midway.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tweetfetch_common::{Error, Result};

/// Name of the directory, next to each input file, holding all outputs
pub const DATA_DIR_NAME: &str = "data";

/// Outcome of claiming an output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Directory was created by this call; the input must be processed
    Fresh,
    /// Directory already existed; the input must be skipped
    AlreadyProcessed,
}

/// Output location of one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    input: PathBuf,
    output_dir: PathBuf,
}

impl OutputLayout {
    pub fn for_input(input: &Path) -> Result<Self> {
        let name = input
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::InvalidInput(format!("Input path has no file name: {}", input.display()))
            })?;

        let parent = input.parent().unwrap_or_else(|| Path::new(""));
        let output_dir = parent.join(DATA_DIR_NAME).join(name);

        Ok(Self {
            input: input.to_path_buf(),
            output_dir,
        })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Whether a previous run already claimed this input
    pub fn is_processed(&self) -> bool {
        self.output_dir.exists()
    }

    /// Create the output directory, or report that it already exists
    ///
    /// The final directory is created with a single `create_dir` so that
    /// exactly one caller ever sees [`Claim::Fresh`].
    pub fn claim(&self) -> Result<Claim> {
        if let Some(data_dir) = self.output_dir.parent() {
            std::fs::create_dir_all(data_dir)?;
        }

        match std::fs::create_dir(&self.output_dir) {
            Ok(()) => {
                tracing::debug!(dir = %self.output_dir.display(), "Created output directory");
                Ok(Claim::Fresh)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(Claim::AlreadyProcessed),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_dir_derived_from_input() {
        let layout = OutputLayout::for_input(Path::new("./dataset/tweets_2021.csv")).unwrap();
        assert_eq!(layout.output_dir(), Path::new("./dataset/data/tweets_2021"));
        assert_eq!(layout.input(), Path::new("./dataset/tweets_2021.csv"));
    }

    #[test]
    fn test_input_without_name_is_error() {
        assert!(OutputLayout::for_input(Path::new("/")).is_err());
    }

    #[test]
    fn test_claim_once() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("set").join("tweets.csv");
        let layout = OutputLayout::for_input(&input).unwrap();

        assert!(!layout.is_processed());
        assert_eq!(layout.claim().unwrap(), Claim::Fresh);
        assert!(layout.is_processed());
        assert!(dir.path().join("set/data/tweets").is_dir());

        assert_eq!(layout.claim().unwrap(), Claim::AlreadyProcessed);
    }

    #[test]
    fn test_existing_directory_counts_as_processed() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("data/tweets")).unwrap();

        let layout = OutputLayout::for_input(&dir.path().join("tweets.csv")).unwrap();
        assert_eq!(layout.claim().unwrap(), Claim::AlreadyProcessed);
    }
}
