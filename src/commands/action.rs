use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;

use super::open_grid;
use crate::backend::ListActionResponse;
use crate::cli::GridArgs;
use crate::error::{GridError, Result};
use crate::events::GridNotification;

/// Keep only the final path component of a server-supplied filename.
fn download_path(out: &Path, filename: &str) -> Result<PathBuf> {
    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| GridError::Other(format!("invalid download filename '{filename}'")))?;
    Ok(out.join(name))
}

/// Run a bulk list action; POST downloads are written under `out`.
pub async fn cmd_action(
    args: &GridArgs,
    action_url: &str,
    no_params: bool,
    new_tab: bool,
    out: &Path,
) -> Result<()> {
    let mut grid = open_grid(args).await?;
    grid.drain_notifications();

    let response = grid.execute_list_action(action_url, no_params, new_tab).await?;
    if let Some(ListActionResponse::Download { filename, bytes }) = response {
        let path = download_path(out, &filename)?;
        tokio::fs::write(&path, &bytes).await?;
        println!("{} {}", "Saved".green(), path.display());
        return Ok(());
    }

    for notification in grid.drain_notifications() {
        match notification {
            GridNotification::Navigate { url, new_tab } => {
                let target = if new_tab { "new tab" } else { "navigate" };
                println!("{} {url}", format!("[{target}]").cyan());
            }
            GridNotification::Notification { html } => println!("{html}"),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_path_strips_directories() {
        let out = Path::new("/tmp/out");
        assert_eq!(
            download_path(out, "../../etc/orders.csv").unwrap(),
            PathBuf::from("/tmp/out/orders.csv")
        );
        assert!(download_path(out, "..").is_err());
    }
}
