//! CLI integration tests running commands against a temporary history file.

use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::{TempDir, tempdir};
use waymark::cli::{Cli, run};

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new(config: &str) -> Self {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join("waymark.json5"), config).expect("config");
        Self { temp }
    }

    fn history_path(&self) -> std::path::PathBuf {
        self.temp.path().join("state").join("history.json")
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<Value> {
        let config = self.temp.path().join("waymark.json5");
        let history = self.history_path();
        let mut argv = vec![
            "waymark".to_string(),
            "--config".to_string(),
            path_arg(&config),
            "--history".to_string(),
            path_arg(&history),
        ];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(serde_json::from_slice(&out)?)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn add_then_inspect_route() {
    let ws = Workspace::new("{}");
    let added = ws
        .run(&[
            "add",
            "--type",
            "route_planning",
            "--data",
            r#"{"origin":"116.3,39.9","destination":"121.4,31.2"}"#,
        ])
        .expect("add");
    assert_eq!(added["type"], json!("route_planning"));
    assert!(ws.history_path().exists());

    let stats = ws.run(&["stats"]).expect("stats");
    assert_eq!(stats["total_records"], json!(1));
    assert_eq!(stats["by_type"], json!({ "route_planning": 1 }));

    let locations = ws.run(&["locations", "--limit", "5"]).expect("locations");
    let coordinates: Vec<_> = locations
        .as_array()
        .expect("array")
        .iter()
        .map(|location| location["coordinates"].clone())
        .collect();
    assert_eq!(coordinates, vec![json!("116.3,39.9"), json!("121.4,31.2")]);

    let id = added["id"].as_str().expect("id");
    let shown = ws.run(&["show", id]).expect("show");
    assert_eq!(shown, added);
}

#[test]
fn list_delete_and_clear() {
    let ws = Workspace::new("{}");
    let first = ws.run(&["add", "--type", "a"]).expect("add");
    ws.run(&["add", "--type", "b"]).expect("add");
    ws.run(&["add", "--type", "a"]).expect("add");

    let only_a = ws.run(&["list", "--type", "a"]).expect("list");
    assert_eq!(only_a.as_array().expect("array").len(), 2);
    let newest = ws.run(&["list", "--limit", "1"]).expect("list");
    assert_eq!(newest[0]["type"], json!("a"));

    let id = first["id"].as_str().expect("id");
    assert_eq!(ws.run(&["delete", id]).expect("delete"), json!({ "removed": 1 }));
    assert_eq!(ws.run(&["delete", id]).expect("delete"), json!({ "removed": 0 }));
    assert!(ws.run(&["show", id]).is_err());

    assert_eq!(
        ws.run(&["clear", "--type", "b"]).expect("clear"),
        json!({ "removed": 1 })
    );
    assert_eq!(ws.run(&["clear"]).expect("clear"), json!({ "removed": 1 }));
    assert_eq!(ws.run(&["list"]).expect("list"), json!([]));
}

#[test]
fn config_caps_history_length() {
    let ws = Workspace::new("{ history: { max_items: 2 } }");
    for _ in 0..3 {
        ws.run(&["add", "--type", "note"]).expect("add");
    }
    let all = ws.run(&["list"]).expect("list");
    assert_eq!(all.as_array().expect("array").len(), 2);
}

#[test]
fn cleanup_reports_removed_records() {
    let ws = Workspace::new("{ history: { auto_clear_days: 30 } }");
    ws.run(&["add", "--type", "note"]).expect("add");
    let result = ws.run(&["cleanup"]).expect("cleanup");
    assert_eq!(result, json!({ "removed": 0, "max_age_days": 30 }));
}

#[test]
fn rejects_non_object_payload() {
    let ws = Workspace::new("{}");
    assert!(ws.run(&["add", "--type", "note", "--data", "[1]"]).is_err());
    assert!(!ws.history_path().exists());
}

#[test]
fn invalid_config_is_reported() {
    let ws = Workspace::new("{ history: { max_items: 0 } }");
    let err = ws.run(&["stats"]).expect_err("invalid config");
    assert!(format!("{err:#}").contains("max_items"));
}
