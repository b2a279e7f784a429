//! Grid configuration.
//!
//! A grid is described by one JSON document rendered by the server into the
//! page (the "table definition"): endpoints, columns, wire-level key names,
//! filter fields, saved views and translation strings. It is read once when
//! the orchestrator is constructed. The same document can be loaded from a
//! `.json` or `.yaml` file for the command line.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::keyword_enum;
use crate::error::{GridError, Result};
use crate::types::{ColumnSpec, SavedView, SortSpec, string_or_number};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How grid state travels to the data endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transport {
    /// State is appended to the endpoint URL as the encoded parameter tree.
    #[default]
    Get,
    /// State is sent as a JSON request body. Disables history integration.
    Post,
}

keyword_enum!(Transport, GridError::InvalidTransport, {
    Get => "get",
    Post => "post",
});

/// Wire-level key names shared with the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Constants {
    pub base_params_name: String,
    pub filter_data_name: String,
    pub advanced_filter_data_name: String,
    pub columns_data_name: String,
    pub columns_data_order_name: String,
    pub columns_data_columns_name: String,
    pub columns_data_visible_name: String,
    pub columns_data_collapsed_name: String,
    pub selection_data_name: String,
    pub selected_rows_kwarg_name: String,
    pub deselected_rows_kwarg_name: String,
    pub select_all_keyword: String,
    pub table_params_name: String,
    pub table_params_size_name: String,
    pub table_params_page_name: String,
    pub table_params_sort_name: String,
    pub table_params_selected_filter_type: String,
    pub table_params_full_text_search: String,
    pub selected_view_name: String,
    pub url_params_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub object_id_placeholder: String,
    pub pagination_active_range: u32,
    pub page_size_options: Vec<u32>,
    pub multiselect_filter_max_choices_shown: usize,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            base_params_name: "params".to_string(),
            filter_data_name: "filterData".to_string(),
            advanced_filter_data_name: "advancedFilterData".to_string(),
            columns_data_name: "columnsData".to_string(),
            columns_data_order_name: "order".to_string(),
            columns_data_columns_name: "columns".to_string(),
            columns_data_visible_name: "visible".to_string(),
            columns_data_collapsed_name: "collapsed".to_string(),
            selection_data_name: "selectionData".to_string(),
            selected_rows_kwarg_name: "selected".to_string(),
            deselected_rows_kwarg_name: "deselected".to_string(),
            select_all_keyword: "__ALL__".to_string(),
            table_params_name: "tableParams".to_string(),
            table_params_size_name: "size".to_string(),
            table_params_page_name: "page".to_string(),
            table_params_sort_name: "sort".to_string(),
            table_params_selected_filter_type: "selected_filter_type".to_string(),
            table_params_full_text_search: "search".to_string(),
            selected_view_name: "selectedView".to_string(),
            url_params_name: "url_params".to_string(),
            object_id_placeholder: "-1".to_string(),
            pagination_active_range: 5,
            page_size_options: vec![10, 20, 50, 100],
            multiselect_filter_max_choices_shown: 3,
        }
    }
}

/// Kind of input widget bound to a filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    #[default]
    Text,
    Select,
    Multiselect,
    Autocomplete,
    Date,
    Range,
    Tree,
    Hidden,
}

/// One selectable option of a select-style filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    pub label: String,
}

/// A simple filter input owned by the filter form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFieldSpec {
    pub name: String,
    #[serde(default)]
    pub widget: WidgetKind,
    /// Shown even when the URL carries no value for it.
    #[serde(default)]
    pub always_visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// Header tab whose pane contains this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
}

impl FilterFieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            widget: WidgetKind::Text,
            always_visible: false,
            empty_label: None,
            choices: Vec::new(),
            tab: None,
        }
    }

    pub fn always_visible(mut self) -> Self {
        self.always_visible = true;
        self
    }

    pub fn with_widget(mut self, widget: WidgetKind) -> Self {
        self.widget = widget;
        self
    }

    pub fn in_tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = Some(tab.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderTabSpec {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Translations {
    /// Pagination summary with `${from}`, `${to}` and `${total}` placeholders.
    pub page: String,
    pub page_empty: String,
}

impl Default for Translations {
    fn default() -> Self {
        Self {
            page: "${from}-${to} of ${total}".to_string(),
            page_empty: "No results".to_string(),
        }
    }
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_initial_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_modules() -> Vec<String> {
    [
        "filterModule",
        "columnDisplayModule",
        "selectionModule",
        "tableParamsModule",
        "viewsModule",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SecretString::from))
}

/// Static configuration of one grid instance.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub view_id: String,

    #[serde(default)]
    pub base_view_url: String,

    pub table_ajax_url: String,

    #[serde(default)]
    pub table_data_edit_url: Option<String>,

    #[serde(default)]
    pub table_action_move_url: Option<String>,

    #[serde(default)]
    pub table_detail_url: Option<String>,

    #[serde(default)]
    pub table_columns: Vec<ColumnSpec>,

    #[serde(default)]
    pub default_column_data: Map<String, Value>,

    #[serde(default = "default_id_column")]
    pub table_id_column_name: String,

    #[serde(default)]
    pub table_initial_sort: Vec<SortSpec>,

    #[serde(default = "default_initial_page")]
    pub table_initial_page: u32,

    #[serde(default = "default_page_size")]
    pub table_initial_page_size: u32,

    #[serde(default = "default_true")]
    pub table_history_enabled: bool,

    #[serde(default)]
    pub transport: Transport,

    #[serde(default = "default_modules")]
    pub modules: Vec<String>,

    #[serde(default)]
    pub constants: Constants,

    #[serde(default)]
    pub filter_fields: Vec<FilterFieldSpec>,

    #[serde(default)]
    pub header_tabs: Vec<HeaderTabSpec>,

    #[serde(default)]
    pub saved_views: Vec<SavedView>,

    #[serde(default)]
    pub translations: Translations,

    /// Request timeout in seconds for every endpoint.
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,

    #[serde(default, deserialize_with = "deserialize_secret")]
    pub csrf_token: Option<SecretString>,

    /// Undo optimistic cell edits and row moves the server rejects.
    #[serde(default)]
    pub revert_on_failure: bool,

    /// Options passed through to the grid component untouched.
    #[serde(default)]
    pub grid_options: Map<String, Value>,
}

impl GridConfig {
    /// Minimal configuration for a grid; everything else takes defaults.
    pub fn new(view_id: impl Into<String>, table_ajax_url: impl Into<String>) -> Self {
        Self {
            view_id: view_id.into(),
            base_view_url: String::new(),
            table_ajax_url: table_ajax_url.into(),
            table_data_edit_url: None,
            table_action_move_url: None,
            table_detail_url: None,
            table_columns: Vec::new(),
            default_column_data: Map::new(),
            table_id_column_name: default_id_column(),
            table_initial_sort: Vec::new(),
            table_initial_page: default_initial_page(),
            table_initial_page_size: default_page_size(),
            table_history_enabled: true,
            transport: Transport::Get,
            modules: default_modules(),
            constants: Constants::default(),
            filter_fields: Vec::new(),
            header_tabs: Vec::new(),
            saved_views: Vec::new(),
            translations: Translations::default(),
            request_timeout: default_timeout(),
            csrf_token: None,
            revert_on_failure: false,
            grid_options: Map::new(),
        }
    }

    /// Parse a JSON table definition.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: GridConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML table definition.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: GridConfig = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, picking the parser by extension (`.yaml`/`.yml` or JSON).
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Reject definitions the engine cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.view_id.trim().is_empty() {
            return Err(GridError::Config("viewId must not be empty".to_string()));
        }
        if self.table_ajax_url.trim().is_empty() {
            return Err(GridError::Config(
                "tableAjaxUrl must not be empty".to_string(),
            ));
        }
        if self.table_initial_page_size == 0 {
            return Err(GridError::Config(
                "tableInitialPageSize must be positive".to_string(),
            ));
        }
        if self.table_initial_page == 0 {
            return Err(GridError::Config(
                "tableInitialPage must be at least 1".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for column in &self.table_columns {
            if !seen.insert(column.field.as_str()) {
                return Err(GridError::Config(format!(
                    "duplicate column field '{}'",
                    column.field
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for field in &self.filter_fields {
            if !seen.insert(field.name.as_str()) {
                return Err(GridError::Config(format!(
                    "duplicate filter field '{}'",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// History integration is only possible when state lives in the URL.
    pub fn history_enabled(&self) -> bool {
        self.table_history_enabled && self.transport == Transport::Get
    }

    pub fn filter_field(&self, name: &str) -> Option<&FilterFieldSpec> {
        self.filter_fields.iter().find(|f| f.name == name)
    }

    pub fn saved_view(&self, id: &str) -> Option<&SavedView> {
        self.saved_views.iter().find(|v| v.id == id)
    }

    /// `tableDetailUrl` with the object id placeholder replaced.
    pub fn detail_url_for(&self, id: &str) -> Option<String> {
        self.table_detail_url
            .as_ref()
            .map(|url| url.replace(&self.constants.object_id_placeholder, id))
    }
}
