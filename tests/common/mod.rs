#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;

use gridstate::config::FilterFieldSpec;
use gridstate::{
    ColumnSpec, GridConfig, GridNotification, GridOrchestrator, MemoryBackend, MemoryHistory,
    ModuleRegistry, Row, RowId,
};

pub type TestGrid = GridOrchestrator<MemoryBackend, MemoryHistory>;

pub const VIEW: &str = "orders";
pub const LIST_PATH: &str = "/admin/orders/";

/// Rows `1..=count` with a name and a status cycling through open/closed.
pub fn rows(count: i64) -> Vec<Row> {
    (1..=count)
        .map(|id| {
            let status = if id % 2 == 0 { "closed" } else { "open" };
            json!({"id": id, "name": format!("customer {id}"), "status": status})
                .as_object()
                .cloned()
                .unwrap()
        })
        .collect()
}

pub fn config(page_size: u32) -> GridConfig {
    let mut config = GridConfig::new(VIEW, "/admin/orders/action_list_json/");
    config.base_view_url = LIST_PATH.into();
    config.table_columns = vec![
        ColumnSpec::new("id").with_title("ID"),
        ColumnSpec::new("name").with_title("Name"),
        ColumnSpec::new("status").with_title("Status"),
    ];
    config.filter_fields = vec![FilterFieldSpec::new("name"), FilterFieldSpec::new("status")];
    config.table_initial_page_size = page_size;
    config
}

pub fn with_modules(mut config: GridConfig, extra: &[&str]) -> GridConfig {
    config.modules.extend(extra.iter().map(|m| m.to_string()));
    config
}

pub fn grid_with(config: GridConfig, registry: &ModuleRegistry, data: Vec<Row>, url: &str) -> TestGrid {
    GridOrchestrator::new(
        config,
        registry,
        MemoryBackend::new(data, "id"),
        MemoryHistory::new(url),
    )
    .expect("orchestrator should build")
}

pub async fn ready_grid(config: GridConfig, data: Vec<Row>, url: &str) -> TestGrid {
    let mut grid = grid_with(config, &ModuleRegistry::with_builtin(), data, url);
    grid.init().await.expect("init should succeed");
    grid
}

pub fn page_ids(grid: &TestGrid) -> Vec<i64> {
    grid.grid()
        .rows()
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect()
}

pub fn server_ids(grid: &TestGrid) -> Vec<i64> {
    grid.backend()
        .row_ids()
        .into_iter()
        .filter_map(|id| match id {
            RowId::Int(i) => Some(i),
            RowId::Str(_) => None,
        })
        .collect()
}

pub fn current_url(grid: &TestGrid) -> String {
    use gridstate::UrlHistory;
    grid.history().location().href()
}

pub fn last_view_buttons(notifications: &[GridNotification]) -> Option<&GridNotification> {
    notifications
        .iter()
        .rev()
        .find(|n| matches!(n, GridNotification::ViewButtons { .. }))
}

/// Runs the `gridstate` binary inside an isolated temp directory
pub struct GridStateCli {
    pub temp_dir: TempDir,
}

impl GridStateCli {
    pub fn new() -> Self {
        GridStateCli {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_gridstate"))
            .args(args)
            .current_dir(self.temp_dir.path())
            .output()
            .expect("Failed to execute gridstate command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content).expect("Failed to write file");
        path
    }
}
