//! In-process backend holding the full ordered dataset.
//!
//! Applies substring filters from `filterData`, sorting and paging the way a
//! server would, and applies reorder and edit notifications to its rows. Every
//! request is recorded so callers can inspect what the engine sent.

use std::cmp::Ordering;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::warn;

use super::{
    CellEditNotice, GridBackend, ListActionResponse, PageRequest, PageResponse, RowMoveNotice,
};
use crate::error::{GridError, Result};
use crate::types::{Row, RowId, SortDir, SortSpec};

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Row>,
    page_requests: Vec<PageRequest>,
    move_notices: Vec<RowMoveNotice>,
    edit_notices: Vec<CellEditNotice>,
    list_actions: Vec<(String, Value)>,
    fail_notifications: bool,
}

pub struct MemoryBackend {
    id_column: String,
    filter_data_name: String,
    state: Mutex<MemoryState>,
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => cell_text(a).cmp(&cell_text(b)),
    }
}

fn sort_rows(rows: &mut [Row], sort: &[SortSpec]) {
    if sort.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for spec in sort {
            let ordering = compare_cells(a.get(&spec.column), b.get(&spec.column));
            let ordering = match spec.dir {
                SortDir::Asc => ordering,
                SortDir::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

impl MemoryBackend {
    pub fn new(rows: Vec<Row>, id_column: impl Into<String>) -> Self {
        Self {
            id_column: id_column.into(),
            filter_data_name: "filterData".to_string(),
            state: Mutex::new(MemoryState {
                rows,
                ..Default::default()
            }),
        }
    }

    /// Read filters from a renamed `filterData` key.
    pub fn with_filter_data_name(mut self, name: impl Into<String>) -> Self {
        self.filter_data_name = name.into();
        self
    }

    /// Make every edit, move and list-action request fail with a server error.
    pub fn set_fail_notifications(&self, fail: bool) {
        self.state.lock().fail_notifications = fail;
    }

    pub fn rows(&self) -> Vec<Row> {
        self.state.lock().rows.clone()
    }

    /// Row ids in server order.
    pub fn row_ids(&self) -> Vec<RowId> {
        self.state
            .lock()
            .rows
            .iter()
            .filter_map(|r| RowId::of_row(r, &self.id_column))
            .collect()
    }

    pub fn page_requests(&self) -> Vec<PageRequest> {
        self.state.lock().page_requests.clone()
    }

    pub fn move_notices(&self) -> Vec<RowMoveNotice> {
        self.state.lock().move_notices.clone()
    }

    pub fn edit_notices(&self) -> Vec<CellEditNotice> {
        self.state.lock().edit_notices.clone()
    }

    pub fn list_actions(&self) -> Vec<(String, Value)> {
        self.state.lock().list_actions.clone()
    }

    fn matches_filters(&self, row: &Row, request: &PageRequest) -> bool {
        let Some(Value::Object(filters)) = request.view_params.get(&self.filter_data_name) else {
            return true;
        };
        filters.iter().all(|(field, wanted)| {
            let wanted = cell_text(Some(wanted)).to_lowercase();
            // keys that are not row fields (such as the active filter tab) do not filter
            if wanted.is_empty() || !row.contains_key(field) {
                return true;
            }
            cell_text(row.get(field)).to_lowercase().contains(&wanted)
        })
    }

    fn position_of(rows: &[Row], id_column: &str, id: &RowId) -> Option<usize> {
        rows.iter()
            .position(|r| RowId::of_row(r, id_column).as_ref() == Some(id))
    }

    fn rejected() -> GridError {
        GridError::Api {
            status: 500,
            message: "rejected by server".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl GridBackend for MemoryBackend {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse> {
        let mut state = self.state.lock();
        state.page_requests.push(request.clone());

        let mut rows: Vec<Row> = state
            .rows
            .iter()
            .filter(|row| self.matches_filters(row, request))
            .cloned()
            .collect();
        sort_rows(&mut rows, &request.table.sort);

        let size = request.table.size.max(1) as usize;
        let total = rows.len();
        let last_page = total.div_ceil(size).max(1);
        let start = (request.table.page.max(1) as usize - 1) * size;
        let data = rows.into_iter().skip(start).take(size).collect();

        Ok(PageResponse {
            data,
            last_page: last_page as u32,
            last_row: Some(total as u64),
        })
    }

    async fn notify_row_moved(&self, notice: &RowMoveNotice) -> Result<Value> {
        let mut state = self.state.lock();
        state.move_notices.push(notice.clone());
        if state.fail_notifications {
            return Err(Self::rejected());
        }

        let from = Self::position_of(&state.rows, &self.id_column, &notice.current)
            .ok_or_else(|| GridError::RowNotFound(notice.current.to_string()))?;
        if let Some(replaced) = &notice.replaced {
            // rows are only touched once the follower is known to be another stored row
            if *replaced == notice.current
                || Self::position_of(&state.rows, &self.id_column, replaced).is_none()
            {
                warn!(current = %notice.current, replaced = %replaced, "invalid row move follower");
                return Err(GridError::Api {
                    status: 400,
                    message: format!("cannot move row {} before row {}", notice.current, replaced),
                });
            }
        }

        let row = state.rows.remove(from);
        let target = notice
            .replaced
            .as_ref()
            .and_then(|id| Self::position_of(&state.rows, &self.id_column, id));
        match target {
            Some(index) => state.rows.insert(index, row),
            None => state.rows.push(row),
        }
        Ok(serde_json::json!({"status": "ok"}))
    }

    async fn notify_cell_edited(&self, notice: &CellEditNotice) -> Result<Value> {
        let mut state = self.state.lock();
        state.edit_notices.push(notice.clone());
        if state.fail_notifications {
            return Err(Self::rejected());
        }

        let index = Self::position_of(&state.rows, &self.id_column, &notice.row_id)
            .ok_or_else(|| GridError::RowNotFound(notice.row_id.to_string()))?;
        state.rows[index].insert(notice.field.clone(), notice.value.clone());
        Ok(serde_json::json!({"status": "ok"}))
    }

    async fn list_action(&self, url: &str, body: &Value) -> Result<ListActionResponse> {
        let mut state = self.state.lock();
        state.list_actions.push((url.to_string(), body.clone()));
        if state.fail_notifications {
            return Err(Self::rejected());
        }
        Ok(ListActionResponse::Notification {
            html: format!("<p>{} rows processed</p>", state.rows.len()),
        })
    }
}
