//! Server endpoints the engine talks to.
//!
//! A grid uses up to four endpoints: the paged data endpoint, the cell-edit
//! endpoint, the row-move endpoint and bulk list actions. [`GridBackend`]
//! abstracts them so the orchestrator can run against a real server
//! ([`HttpBackend`]) or an in-process dataset ([`MemoryBackend`]).

pub mod http;
pub mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Transport;
use crate::error::Result;
use crate::types::{ParamSlice, Row, RowId, TableState};

pub use http::HttpBackend;
pub use memory::MemoryBackend;

/// Header marking requests issued by the grid rather than by page navigation.
pub const GRID_REQUEST_HEADER: &str = "X-TabulatorRequest";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// One page fetch, fully resolved by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Endpoint URL; carries the encoded parameter tree for GET transport.
    pub url: String,
    pub transport: Transport,
    /// The parameter tree sent as the JSON body for POST transport.
    pub body: Option<Value>,
    /// This grid's slice of the tree, for backends that filter in-process.
    pub view_params: ParamSlice,
    /// Paging and sorting the fetch was issued for.
    pub table: TableState,
}

/// A page of rows plus the server's paging metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default = "default_last_page")]
    pub last_page: u32,
    /// Total row count estimate across all pages.
    #[serde(default)]
    pub last_row: Option<u64>,
}

fn default_last_page() -> u32 {
    1
}

impl PageResponse {
    pub fn row_count(&self) -> u64 {
        self.last_row.unwrap_or(self.data.len() as u64)
    }
}

/// A reorder notification: `current` now precedes `replaced`, or sits last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMoveNotice {
    pub current: RowId,
    pub replaced: Option<RowId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellEditNotice {
    pub row_id: RowId,
    pub field: String,
    pub value: Value,
}

/// What a POST bulk list action answered with.
#[derive(Debug, Clone, PartialEq)]
pub enum ListActionResponse {
    Download { filename: String, bytes: Vec<u8> },
    Redirect { url: String },
    /// Markup to show in place.
    Notification { html: String },
}

/// Render a value the way a browser form field stringifies it.
pub fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
pub trait GridBackend: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse>;

    /// Fire-and-forget reorder notification. Returns the server's reply.
    async fn notify_row_moved(&self, notice: &RowMoveNotice) -> Result<Value>;

    /// Fire-and-forget cell edit notification. Returns the server's reply.
    async fn notify_cell_edited(&self, notice: &CellEditNotice) -> Result<Value>;

    /// POST a bulk action with the parameter tree as its JSON body.
    async fn list_action(&self, url: &str, body: &Value) -> Result<ListActionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_response_defaults() {
        let response: PageResponse = serde_json::from_value(json!({
            "data": [{"id": 1}, {"id": 2}]
        }))
        .unwrap();
        assert_eq!(response.last_page, 1);
        assert_eq!(response.row_count(), 2);

        let response: PageResponse = serde_json::from_value(json!({
            "data": [], "last_page": 7, "last_row": 140
        }))
        .unwrap();
        assert_eq!(response.row_count(), 140);
    }

    #[test]
    fn test_form_value() {
        assert_eq!(form_value(&json!("abc")), "abc");
        assert_eq!(form_value(&json!(5)), "5");
        assert_eq!(form_value(&json!(null)), "null");
        assert_eq!(form_value(&json!(true)), "true");
    }
}
