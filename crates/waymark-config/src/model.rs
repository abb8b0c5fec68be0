//! Configuration schema for Waymark.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use waymark_history::HistoryOptions;
use waymark_history::policy::{DEFAULT_AUTO_CLEAR_DAYS, DEFAULT_MAX_ITEMS};

/// Directory under the home directory holding Waymark state and config.
pub const WAYMARK_DIR: &str = ".waymark";
/// Default history document filename.
pub const HISTORY_FILE: &str = "history.json";

/// Root config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WaymarkConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// History store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Document location; defaults to `~/.waymark/history.json`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_auto_clear_days")]
    pub auto_clear_days: u32,
    /// Candidate records scanned per requested location.
    #[serde(default = "default_location_overfetch")]
    pub location_overfetch: usize,
    /// Run retention cleanup whenever the CLI opens the store.
    #[serde(default)]
    pub cleanup_on_open: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_items: default_max_items(),
            auto_clear_days: default_auto_clear_days(),
            location_overfetch: default_location_overfetch(),
            cleanup_on_open: false,
        }
    }
}

impl HistoryConfig {
    /// Explicit path, or the default document under the home directory.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return PathBuf::from(path);
        }
        let base = BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        base.join(WAYMARK_DIR).join(HISTORY_FILE)
    }

    /// Store options derived from this config.
    pub fn options(&self) -> HistoryOptions {
        let mut options = HistoryOptions::new(self.max_items, self.auto_clear_days);
        options.locations.overfetch_factor = self.location_overfetch;
        options
    }
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_auto_clear_days() -> u32 {
    DEFAULT_AUTO_CLEAR_DAYS
}

fn default_location_overfetch() -> usize {
    2
}
