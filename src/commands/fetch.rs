use serde_json::json;

use super::{open_grid, print_json, render_page};
use crate::cli::GridArgs;
use crate::error::Result;

/// Load the grid at `args.url` and print the fetched page.
pub async fn cmd_fetch(args: &GridArgs, output_json: bool) -> Result<()> {
    let mut grid = open_grid(args).await?;

    if output_json {
        let search = grid.url_params_string();
        let model = grid.grid();
        print_json(&json!({
            "page": model.page(),
            "lastPage": model.page_max(),
            "total": model.remote_row_count(),
            "url": search,
            "data": model.rows(),
        }))?;
    } else {
        println!("{}", render_page(&grid));
    }
    Ok(())
}
