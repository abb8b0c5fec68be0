//! Public SDK surface for Waymark.
//!
//! This crate re-exports the history store and config crates, and hosts the
//! command-line front end used by the `waymark` binary.

pub mod cli;

/// Re-export for convenience.
pub use waymark_config as config;
/// Re-export for convenience.
pub use waymark_history as history;

use waymark_config::HistoryConfig;
use waymark_history::HistoryStore;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}

/// Build a file-backed store from history config.
pub fn open_store(config: &HistoryConfig) -> HistoryStore {
    HistoryStore::open(config.resolved_path(), config.options())
}
