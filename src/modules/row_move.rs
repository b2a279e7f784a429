//! Manual row ordering.
//!
//! Rows are moved to an absolute 1-based position in the full server-side
//! ordering. A target on the loaded page is a plain in-page move. A target on
//! another page switches the grid to that page and, once its data arrives,
//! splices a copy of the moved row into it and drops the row that logically
//! shifted to the neighbouring page. Either way the server is told only the
//! moved row and the row it now precedes.

use serde_json::json;
use tracing::debug;

use super::{FeatureModule, ModuleContext, ROW_MOVE_MODULE};
use crate::config::GridConfig;
use crate::error::{GridError, Result};
use crate::events::{GridEvent, GridRequest, ReplacedRow};
use crate::grid::{GridModel, GridOptions};
use crate::types::{ColumnSpec, Row, RowId};

pub const ROW_HANDLE_COLUMN: &str = "__row_handle";
pub const MOVE_FIRST_COLUMN: &str = "__move_first";
pub const MOVE_UP_COLUMN: &str = "__move_up";
pub const MOVE_DOWN_COLUMN: &str = "__move_down";
pub const MOVE_LAST_COLUMN: &str = "__move_last";
pub const ROW_POSITION_COLUMN: &str = "__row_position";

/// Runs ahead of every other built-in module.
const ROW_MOVE_PRIORITY: i32 = 100;

/// What moving a row from `current` to `target` (both absolute, 1-based) takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    Stay,
    /// Move within the loaded page next to the row at `index`.
    InPage { index: usize, up: bool },
    /// Load `page` first, then splice the row in at `index` on that page.
    CrossPage { page: u32, index: usize, up: bool },
}

/// Decide how to move a row. `target` is clamped to `[1, total]`.
pub fn plan_move(current: u64, target: i64, page: u32, page_size: u32, total: u64) -> MovePlan {
    if total == 0 {
        return MovePlan::Stay;
    }
    let target = (target.max(1) as u64).min(total);
    if target == current {
        return MovePlan::Stay;
    }
    let up = target < current;
    let size = u64::from(page_size.max(1));
    let start = u64::from(page.max(1) - 1) * size;
    let zero_based = target - 1;

    if (start..start + size).contains(&zero_based) {
        MovePlan::InPage {
            index: (zero_based - start) as usize,
            up,
        }
    } else {
        let page = u32::try_from(zero_based / size + 1).unwrap_or(u32::MAX);
        let index = (zero_based % size) as usize;
        MovePlan::CrossPage { page, index, up }
    }
}

/// The row that now follows the row at `index` in the full ordering.
pub fn follower(grid: &GridModel, index: usize) -> ReplacedRow {
    match grid.row_id_at(index + 1) {
        Some(id) => ReplacedRow::Row(id),
        None if grid.page() >= grid.page_max() => ReplacedRow::End,
        None => ReplacedRow::FirstOfPage(grid.page() + 1),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PendingMove {
    row: Row,
    row_id: RowId,
    index: usize,
    up: bool,
}

#[derive(Debug, Default)]
pub struct RowMoveModule {
    pending: Option<PendingMove>,
}

impl RowMoveModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending_move(&self) -> bool {
        self.pending.is_some()
    }

    fn leading_column(field: &str) -> ColumnSpec {
        ColumnSpec::new(field)
            .with_extra("headerSort", json!(false))
            .with_extra("width", json!(40))
            .with_extra("minWidth", json!(40))
    }

    fn absolute_position(grid: &GridModel, index: usize) -> u64 {
        grid.page_start() + index as u64 + 1
    }

    fn row_index(grid: &GridModel, id: &RowId) -> Result<usize> {
        grid.row_index(id)
            .ok_or_else(|| GridError::RowNotFound(id.to_string()))
    }

    fn notify_moved(ctx: &mut ModuleContext<'_>, index: usize) -> Result<()> {
        let replaced = follower(ctx.grid, index);
        Self::notify_moved_before(ctx, index, replaced)
    }

    fn notify_moved_before(
        ctx: &mut ModuleContext<'_>,
        index: usize,
        replaced: ReplacedRow,
    ) -> Result<()> {
        let current = ctx
            .grid
            .row_id_at(index)
            .ok_or_else(|| GridError::RowNotFound(format!("index {index}")))?;
        let page = ctx.grid.page();
        ctx.request(GridRequest::NotifyRowMoved {
            current,
            replaced,
            page,
        });
        Ok(())
    }

    /// Move the row with `id` to absolute position `target`.
    fn move_to(&mut self, id: &RowId, target: i64, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let from = Self::row_index(ctx.grid, id)?;
        let current = Self::absolute_position(ctx.grid, from);
        let plan = plan_move(
            current,
            target,
            ctx.grid.page(),
            ctx.grid.page_size(),
            ctx.grid.remote_row_count(),
        );
        debug!(row = %id, current, target, ?plan, "row move");

        match plan {
            MovePlan::Stay => Ok(()),
            MovePlan::InPage { index, up } => {
                let landed = ctx.grid.move_row(from, index, up)?;
                Self::notify_moved(ctx, landed)
            }
            MovePlan::CrossPage { page, index, up } => {
                let row = ctx.grid.rows()[from].clone();
                self.pending = Some(PendingMove {
                    row,
                    row_id: id.clone(),
                    index,
                    up,
                });
                ctx.grid.set_page(page);
                Ok(())
            }
        }
    }

    /// Second half of a cross-page move, on the freshly loaded target page.
    fn complete_pending(&mut self, pending: PendingMove, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let PendingMove {
            row,
            row_id,
            index,
            up,
        } = pending;
        // the target page may already show the row if it was fetched after the server moved it
        if ctx.grid.row_index(&row_id).is_some() {
            return Ok(());
        }
        if index >= ctx.grid.data_count() {
            return Err(GridError::RowNotFound(format!(
                "position {} on page {}",
                index + 1,
                ctx.grid.page()
            )));
        }
        let placeholder = ctx.grid.add_row(row);
        let mut landed = ctx.grid.move_row(placeholder, index, up)?;
        let shifted = if up {
            let tail = ctx.grid.data_count() - 1;
            let removed = ctx.grid.delete_row(tail);
            removed.and_then(|r| RowId::of_row(&r, ctx.grid.id_column()))
        } else {
            ctx.grid.delete_row(0);
            landed -= 1;
            None
        };
        match shifted {
            // the row pushed off the tail still precedes the next page, so it follows the moved row
            Some(id) if landed + 1 == ctx.grid.data_count() => {
                Self::notify_moved_before(ctx, landed, ReplacedRow::Row(id))
            }
            _ => Self::notify_moved(ctx, landed),
        }
    }
}

impl FeatureModule for RowMoveModule {
    fn name(&self) -> &str {
        ROW_MOVE_MODULE
    }

    fn priority(&self) -> i32 {
        ROW_MOVE_PRIORITY
    }

    fn before_default_columns(&self, _config: &GridConfig) -> Result<Vec<ColumnSpec>> {
        Ok(vec![
            Self::leading_column(ROW_HANDLE_COLUMN).with_extra("rowHandle", json!(true)),
            Self::leading_column(MOVE_FIRST_COLUMN),
            Self::leading_column(MOVE_UP_COLUMN),
            Self::leading_column(MOVE_DOWN_COLUMN),
            Self::leading_column(MOVE_LAST_COLUMN),
            ColumnSpec::new(ROW_POSITION_COLUMN)
                .with_extra("headerSort", json!(false))
                .with_extra("editor", json!("input")),
        ])
    }

    fn modify_grid_options(&self, mut options: GridOptions) -> Result<GridOptions> {
        options.movable_rows = true;
        Ok(options)
    }

    fn on_data_processed(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        match self.pending.take() {
            Some(pending) => self.complete_pending(pending, ctx),
            None => Ok(()),
        }
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        match event {
            GridEvent::RowMoveFirst(id) => self.move_to(id, 1, ctx),
            GridEvent::RowMoveUp(id) | GridEvent::RowMoveDown(id) => {
                let index = Self::row_index(ctx.grid, id)?;
                let current = Self::absolute_position(ctx.grid, index) as i64;
                let target = if matches!(event, GridEvent::RowMoveUp(_)) {
                    current - 1
                } else {
                    current + 1
                };
                self.move_to(id, target, ctx)
            }
            GridEvent::RowMoveLast(id) => {
                let total = i64::try_from(ctx.grid.remote_row_count()).unwrap_or(i64::MAX);
                self.move_to(id, total, ctx)
            }
            GridEvent::RowPositionEdited { row_id, position } => {
                self.move_to(row_id, *position, ctx)
            }
            GridEvent::RowDropped { from, to } => {
                if from == to {
                    return Ok(());
                }
                let landed = ctx.grid.move_row(*from, *to, to < from)?;
                Self::notify_moved(ctx, landed)
            }
            _ => Ok(()),
        }
    }
}
