//! Messages crossing the engine boundary.
//!
//! - [`GridEvent`]: user interaction and external signals fed in by the host.
//! - [`GridNotification`]: what the host should render or do in response.
//! - [`GridRequest`]: what a feature module asks the orchestrator to do.
//!   Modules never call each other; every cross-module effect goes through
//!   a request.

use serde::Serialize;
use serde_json::Value;

use crate::config::WidgetKind;
use crate::modules::column_display::ColumnWidgetEntry;
use crate::modules::saved_views::ViewButtonState;
use crate::modules::table_params::PaginationView;
use crate::types::{Row, RowId, SortSpec};

/// Where inside a row a click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Cell,
    SelectionCheckbox,
    /// An element marked as not opening the detail view.
    PreventClick,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    FilterChanged { field: String, value: String },
    ShowFilter { field: String, focus: bool },
    HideFilter { field: String },
    ClearFilter { field: String },

    AdvancedFilterChanged { rules: Value },
    AdvancedFilterExecuted,
    AdvancedRuleRendered {
        rule_id: String,
        field: String,
        operator: Option<String>,
    },
    AdvancedOperatorChanged { rule_id: String, operator: String },

    ColumnVisibilityChanged {
        field: String,
        visible: bool,
        collapsed: bool,
    },
    /// A column dragged in the column chooser, by index among grid columns.
    ColumnMoved { from: usize, to: usize },

    RowSelected(RowId),
    RowDeselected(RowId),
    SelectAll,
    SelectNone,

    PageChanged(u32),
    PageSizeChanged(u32),
    SortChanged(Vec<SortSpec>),

    RowMoveFirst(RowId),
    RowMoveUp(RowId),
    RowMoveDown(RowId),
    RowMoveLast(RowId),
    /// Absolute 1-based position typed into the row-number cell.
    RowPositionEdited { row_id: RowId, position: i64 },
    /// Drag-and-drop inside the loaded page, by row index.
    RowDropped { from: usize, to: usize },

    CellEdited {
        row_id: RowId,
        field: String,
        value: Value,
    },
    RowClicked { row_id: RowId, target: ClickTarget },

    TabShown { tab_id: String },
    /// Open a saved view; `None` returns to the default state.
    OpenView { view_id: Option<String> },

    /// Browser back/forward navigation.
    PopState,
    /// Some collaborator changed server data; refetch.
    ExternalInvalidate,
    /// Replace loaded rows by id with fresh server data.
    UpdateRowData { rows: Vec<Row> },
}

/// Single-value or range mode of a rule's bound widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleWidgetMode {
    Single,
    Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridNotification {
    HeaderVisibility { visible: bool },
    /// The URL state changed outside a URL-driven load.
    StateChanged { search: String },
    DataProcessed { rows: usize, is_filtered: bool },
    DataLoadFailed { message: String },
    HeightFrozen,
    HeightRestored,

    /// An input widget should resynchronize its display from the raw value.
    WidgetReload { field: String, value: String },
    WidgetClear { field: String, refresh: bool },
    FilterVisibility {
        field: String,
        visible: bool,
        focus: bool,
    },
    FilterLabel {
        field: String,
        label: String,
        empty: bool,
    },
    FullTextSearchValue { value: String },

    QueryBuilderRules { rules: Value },
    RuleWidgetInit {
        rule_id: String,
        widget: WidgetKind,
        mode: RuleWidgetMode,
    },
    RuleWidgetMode { rule_id: String, mode: RuleWidgetMode },

    ColumnWidget { columns: Vec<ColumnWidgetEntry> },
    SelectionChanged {
        count: u64,
        all: bool,
        bar_visible: bool,
    },
    Pagination(PaginationView),
    PageSize { current: u32, options: Vec<u32> },
    ViewButtons {
        views: Vec<ViewButtonState>,
        save_enabled: bool,
        url_params: String,
    },
    TabActivated { tab_id: String },

    Navigate { url: String, new_tab: bool },
    /// HTML fragment returned by a list action, to show in place.
    Notification { html: String },
    RequestFailed { action: &'static str, message: String },
}

/// The row a moved row now precedes, as sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacedRow {
    Row(RowId),
    /// Moved to the very end of the ordering.
    End,
    /// Landed last on its page; the follower is the first row of this page.
    FirstOfPage(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridRequest {
    /// Refetch unless a URL-driven load is in progress.
    RefreshData,
    UpdateUrlState,
    /// Push `search` onto history under the current path.
    PushHistory { search: String },
    LoadFromUrl,
    NotifyRowMoved {
        current: RowId,
        replaced: ReplacedRow,
        /// Page to reload if the server rejects the move.
        page: u32,
    },
    NotifyCellEdited {
        row_id: RowId,
        field: String,
        value: Value,
        previous: Option<Value>,
    },
    ClearFilterFields { fields: Vec<String> },
    ResetAdvancedFilter,
    SetFilterValue { field: String, value: String },
    OpenDetail { row_id: RowId },
}
