//! Configuration loading: credential file and optional TOML run config
//!
//! Run settings resolve in priority order:
//! 1. Command-line argument or environment variable (handled by clap)
//! 2. TOML config file
//! 3. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Credential file read when nothing else is configured
pub const DEFAULT_CREDENTIALS_PATH: &str = "./tweet_keys_file.json";
/// File name fragment identifying input CSV files
pub const DEFAULT_PATTERN: &str = "tweet";
/// Pause after each processed input file
pub const DEFAULT_PAUSE_MS: u64 = 1000;
/// Lookup API host
pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";
/// Default log level when neither RUST_LOG nor TOML set one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// API credentials as stored in the local JSON key file
///
/// `oauth_token` is the app-only bearer token. `app_key` and `app_secret`
/// are the consumer key pair, used to obtain a bearer token when
/// `oauth_token` is blank.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Credentials {
    pub oauth_token: String,
    pub app_key: String,
    pub app_secret: String,
}

impl Credentials {
    /// Read credentials from a JSON file
    ///
    /// Fails if the file is missing, unreadable or not a JSON object with
    /// the three expected string fields.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Credentials(format!("Cannot read {}: {}", path.display(), e))
        })?;

        let credentials: Credentials = serde_json::from_str(&content).map_err(|e| {
            Error::Credentials(format!("Malformed credential file {}: {}", path.display(), e))
        })?;

        debug!(
            path = %path.display(),
            has_bearer = credentials.has_bearer_token(),
            has_app_keys = credentials.has_app_keys(),
            "Loaded API credentials"
        );

        Ok(credentials)
    }

    pub fn has_bearer_token(&self) -> bool {
        is_valid_key(&self.oauth_token)
    }

    pub fn has_app_keys(&self) -> bool {
        is_valid_key(&self.app_key) && is_valid_key(&self.app_secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("oauth_token", &redact(&self.oauth_token))
            .field("app_key", &redact(&self.app_key))
            .field("app_secret", &redact(&self.app_secret))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

/// Validate key material (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Logging section of the TOML config
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Optional TOML run configuration
///
/// Every field is optional; absent fields fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
    pub pattern: Option<String>,
    pub wait_on_rate_limit: Option<bool>,
    pub pause_ms: Option<u64>,
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Load TOML config, degrading to defaults when the file is absent
    ///
    /// With `path == None` the platform config location
    /// (`<config_dir>/tweetfetch/config.toml`) is tried. A missing file is
    /// not an error; a file that fails to parse is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => {
                    debug!("No platform config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Platform config file location, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tweetfetch").join("config.toml"))
}

/// Pick a setting from the first tier that provides it
pub fn resolve_value<T: fmt::Debug>(
    name: &str,
    cli: Option<T>,
    toml: Option<T>,
    default: T,
) -> T {
    if let Some(value) = cli {
        debug!(setting = name, value = ?value, "Using command-line/environment value");
        return value;
    }
    if let Some(value) = toml {
        debug!(setting = name, value = ?value, "Using TOML value");
        return value;
    }
    debug!(setting = name, value = ?default, "Using compiled default");
    default
}
