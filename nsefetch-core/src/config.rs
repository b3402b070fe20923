//! Fetcher configuration, loadable from TOML.
//!
//! ```toml
//! unknown_code = "reject"
//! default_start = "2010-01-01"
//!
//! [yahoo]
//! timeout_secs = 20
//! ```
//!
//! Every key is optional; missing keys take the values from `Default`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// What to do with a code that is not in the supported-instrument table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCodePolicy {
    /// Log a warning and fetch the default instrument instead.
    #[default]
    Substitute,
    /// Fail with `FetchError::UnsupportedInstrument`.
    Reject,
}

/// Settings for the Yahoo Finance provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YahooConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Request timeout. `None` leaves the HTTP client's own default in place.
    pub timeout_secs: Option<u64>,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            timeout_secs: None,
        }
    }
}

/// Top-level fetcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub unknown_code: UnknownCodePolicy,
    /// Start of the range used by `fetch_configured`.
    pub default_start: NaiveDate,
    /// End of the range used by `fetch_configured`.
    pub default_end: NaiveDate,
    pub yahoo: YahooConfig,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            unknown_code: UnknownCodePolicy::Substitute,
            default_start: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap_or_default(),
            default_end: NaiveDate::from_ymd_opt(2022, 3, 31).unwrap_or_default(),
            yahoo: YahooConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl FetcherConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
