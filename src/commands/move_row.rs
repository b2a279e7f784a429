use owo_colors::OwoColorize;

use super::{first_failure, open_grid, parse_row_id, render_page};
use crate::cli::GridArgs;
use crate::error::{GridError, Result};
use crate::events::GridEvent;
use crate::modules::{ROW_MOVE_MODULE, ROW_MOVE_MODULE_ALIAS};

/// Move a row to an absolute position and notify the server.
pub async fn cmd_move(args: &GridArgs, row_id: &str, position: i64) -> Result<()> {
    let mut grid = open_grid(args).await?;
    if !grid
        .module_names()
        .iter()
        .any(|name| *name == ROW_MOVE_MODULE || *name == ROW_MOVE_MODULE_ALIAS)
    {
        return Err(GridError::Config(
            "row moves need the row-move module in the table definition".to_string(),
        ));
    }
    grid.drain_notifications();

    let row_id = parse_row_id(row_id);
    grid.dispatch(GridEvent::RowPositionEdited {
        row_id: row_id.clone(),
        position,
    })
    .await?;
    first_failure(&grid.drain_notifications())?;

    println!("{} row {row_id} to position {position}", "Moved".green());
    println!("{}", render_page(&grid));
    Ok(())
}
