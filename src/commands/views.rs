use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{open_grid, print_json};
use crate::cli::GridArgs;
use crate::error::{GridError, Result};
use crate::events::GridNotification;

#[derive(Tabled)]
struct ViewRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Print the status of every saved view against the loaded state.
pub async fn cmd_views(args: &GridArgs, output_json: bool) -> Result<()> {
    let mut grid = open_grid(args).await?;
    let buttons = grid
        .drain_notifications()
        .into_iter()
        .rev()
        .find_map(|n| match n {
            GridNotification::ViewButtons {
                views,
                save_enabled,
                ..
            } => Some((views, save_enabled)),
            _ => None,
        });
    let Some((views, save_enabled)) = buttons else {
        return Err(GridError::Config(
            "saved views need the views module in the table definition".to_string(),
        ));
    };

    if output_json {
        return print_json(&json!({"views": views, "saveEnabled": save_enabled}));
    }

    if views.is_empty() {
        println!("No saved views.");
        return Ok(());
    }
    let rows: Vec<ViewRow> = views
        .iter()
        .map(|v| ViewRow {
            id: v.id.clone(),
            label: v.label.clone(),
            status: if v.active {
                "active".green().to_string()
            } else if v.changed {
                "changed".yellow().to_string()
            } else {
                String::new()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    if save_enabled {
        println!("{}", "Current state can be saved as a new view.".dimmed());
    }
    Ok(())
}
