//! Application configuration types.
//!
//! Loaded from `~/.wechat-txt-export/config.toml`; every field has a default
//! so a missing or partial file is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default number of messages requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Configuration for transcript export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Messages requested per store query.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Directory transcripts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            output_dir: default_output_dir(),
        }
    }
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Configuration for the message store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Decrypted data directory or database file.
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Maximum number of sessions shown by `--list`.
    #[serde(default = "default_session_limit")]
    pub session_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            session_limit: default_session_limit(),
        }
    }
}

const fn default_session_limit() -> usize {
    100
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Export configuration.
    #[serde(default)]
    pub export: ExportConfig,

    /// Store configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wechat-txt-export")
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }
}
