//! CLI command implementations.

mod action;
mod decode;
mod encode;
mod fetch;
mod move_row;
mod views;

pub use action::cmd_action;
pub use decode::cmd_decode;
pub use encode::cmd_encode;
pub use fetch::cmd_fetch;
pub use move_row::cmd_move;
pub use views::cmd_views;

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::backend::HttpBackend;
use crate::cli::GridArgs;
use crate::config::GridConfig;
use crate::error::{GridError, Result};
use crate::events::GridNotification;
use crate::history::MemoryHistory;
use crate::modules::ModuleRegistry;
use crate::orchestrator::GridOrchestrator;
use crate::types::RowId;

pub type CliGrid = GridOrchestrator<HttpBackend, MemoryHistory>;

/// Print a JSON value to stdout with pretty formatting
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a row id the way the server would send it: integers stay integers.
pub fn parse_row_id(raw: &str) -> RowId {
    raw.parse::<i64>()
        .map(RowId::Int)
        .unwrap_or_else(|_| RowId::from(raw))
}

/// Load the table definition, start the grid at `args.url` and fetch its page.
pub async fn open_grid(args: &GridArgs) -> Result<CliGrid> {
    let config = GridConfig::load(&args.config)?;
    let backend = HttpBackend::new(&args.server, &config)?;
    let path = if config.base_view_url.is_empty() {
        "/".to_string()
    } else {
        config.base_view_url.clone()
    };
    let search = match args.url.as_str() {
        "" => String::new(),
        url if url.starts_with('?') => url.to_string(),
        url => format!("?{url}"),
    };
    let history = MemoryHistory::new(&format!("{path}{search}"));

    let mut grid = GridOrchestrator::new(config, &ModuleRegistry::with_builtin(), backend, history)?;
    grid.init().await?;
    Ok(grid)
}

/// Turn the first failed request among `notifications` into an error.
pub fn first_failure(notifications: &[GridNotification]) -> Result<()> {
    for notification in notifications {
        if let GridNotification::RequestFailed { action, message } = notification {
            return Err(GridError::Other(format!("{action} failed: {message}")));
        }
    }
    Ok(())
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Render the loaded page with the grid's visible data columns.
pub fn render_page(grid: &CliGrid) -> String {
    let columns: Vec<_> = grid
        .grid()
        .columns()
        .iter()
        .filter(|c| c.visible && !c.field().starts_with("__"))
        .collect();

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| {
        c.spec
            .title
            .clone()
            .unwrap_or_else(|| c.field().to_string())
    }));
    for row in grid.grid().rows() {
        builder.push_record(columns.iter().map(|c| cell_text(row.get(c.field()))));
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    format!(
        "{table}\n{}",
        format!(
            "page {} of {} ({} rows)",
            grid.grid().page(),
            grid.grid().page_max(),
            grid.grid().remote_row_count()
        )
        .dimmed()
    )
}
