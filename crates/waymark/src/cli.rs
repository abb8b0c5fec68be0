//! Command-line front end over the history store.

use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::io::Write;
use std::path::PathBuf;
use waymark_config::WaymarkConfig;
use waymark_history::{HistoryQuery, HistoryStore};

/// Command-line options for the history CLI.
#[derive(Debug, Parser)]
#[command(name = "waymark", version, about = "Inspect and edit the action history")]
pub struct Cli {
    /// Optional path to a waymark.json5 config file (skips layered discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// History document path, overriding the config
    #[arg(long, global = true)]
    pub history: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

/// Store operations exposed on the command line.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a new action
    Add {
        /// Record type, e.g. route_planning
        #[arg(long = "type")]
        kind: String,
        /// JSON object payload
        #[arg(long)]
        data: Option<String>,
    },
    /// List records, newest first
    List {
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print one record
    Show { id: String },
    /// Delete a record by id
    Delete { id: String },
    /// Remove all records, or all records of one type
    Clear {
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Remove records older than the retention age
    Cleanup {
        /// Override the configured auto_clear_days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Recently used distinct locations from route planning
    Locations {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Counts by type and date
    Stats,
}

/// Resolve config, open the store, and execute one command, writing JSON to `out`.
pub fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;
    if let Some(path) = &cli.history {
        config.history.path = Some(path.to_string_lossy().to_string());
    }
    let path = config.history.resolved_path();
    info!("opening history (path={})", path.display());
    let store = crate::open_store(&config.history);

    if config.history.cleanup_on_open {
        match store.auto_cleanup() {
            Ok(removed) => debug!("cleanup on open removed {removed} records"),
            Err(err) => warn!("cleanup on open failed: {err}"),
        }
    }

    execute(&store, cli.command, out)
}

fn load_config(cli: &Cli) -> anyhow::Result<WaymarkConfig> {
    if let Some(path) = cli.config.as_ref() {
        return WaymarkConfig::load_from_path(path).context("failed to load config");
    }
    let cwd = std::env::current_dir().context("cwd")?;
    let layered = WaymarkConfig::load_layered(&cwd).context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

fn execute(store: &HistoryStore, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Add { kind, data } => {
            let data = parse_payload(data.as_deref())?;
            let record = store
                .add_record(&kind, data)
                .context("failed to add record")?;
            print_json(out, &record)
        }
        Command::List { kind, limit } => {
            let query = HistoryQuery { kind, limit };
            print_json(out, &store.history(&query))
        }
        Command::Show { id } => match store.record(&id) {
            Some(record) => print_json(out, &record),
            None => bail!("no record with id {id}"),
        },
        Command::Delete { id } => {
            let removed = store
                .delete_record(&id)
                .context("failed to delete record")?;
            print_json(out, &json!({ "removed": removed }))
        }
        Command::Clear { kind } => {
            let removed = store
                .clear_history(kind.as_deref())
                .context("failed to clear history")?;
            print_json(out, &json!({ "removed": removed }))
        }
        Command::Cleanup { days } => {
            let days = days.unwrap_or(store.options().retention.max_age_days);
            let removed = store
                .auto_cleanup_at(&Local::now(), days)
                .context("failed to clean up history")?;
            print_json(out, &json!({ "removed": removed, "max_age_days": days }))
        }
        Command::Locations { limit } => print_json(out, &store.recent_locations(limit)),
        Command::Stats => print_json(out, &store.statistics()),
    }
}

/// Parse the `--data` argument; it must be a JSON object when present.
fn parse_payload(raw: Option<&str>) -> anyhow::Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw).context("--data is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--data must be a JSON object, got {other}"),
    }
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_payload;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn payload_must_be_an_object() {
        assert!(parse_payload(None).expect("none").is_empty());
        let map = parse_payload(Some(r#"{"origin":"1,2"}"#)).expect("object");
        assert_eq!(map.get("origin"), Some(&json!("1,2")));
        assert!(parse_payload(Some("[1,2]")).is_err());
        assert!(parse_payload(Some("{oops")).is_err());
    }
}
