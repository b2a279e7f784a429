use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::keyword_enum;
use crate::error::{GridError, Result};

pub use gridstate_params::{ParamSlice, ParameterTree};

/// One row of server data, keyed by column field.
pub type Row = Map<String, Value>;

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Static definition of one grid column.
///
/// Render configuration the engine does not interpret (formatter, width,
/// header sort flags) is carried through `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default = "default_true")]
    pub visible: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub editable: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ColumnSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            title: None,
            visible: true,
            collapsed: false,
            editable: false,
            extra: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn collapsed(mut self) -> Self {
        self.collapsed = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Overlay this column on top of shared default column data.
    pub fn with_defaults(&self, defaults: &Map<String, Value>) -> Result<ColumnSpec> {
        if defaults.is_empty() {
            return Ok(self.clone());
        }
        let mut merged = defaults.clone();
        if let Value::Object(own) = serde_json::to_value(self)? {
            merged.extend(own);
        }
        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}

/// Sort direction of one sorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

keyword_enum!(SortDir, GridError::InvalidSortDir, {
    Asc => "asc",
    Desc => "desc",
});

/// One entry of the grid's sort spec. Accepts `field` as an alias of `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(alias = "field")]
    pub column: String,
    #[serde(default)]
    pub dir: SortDir,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, dir: SortDir) -> Self {
        Self {
            column: column.into(),
            dir,
        }
    }

    /// Parse a sort list from a persisted value, dropping malformed entries.
    pub fn list_from_value(value: &Value) -> Vec<SortSpec> {
        value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn list_to_value(list: &[SortSpec]) -> Value {
        Value::Array(
            list.iter()
                .map(|s| serde_json::json!({"column": s.column, "dir": s.dir.to_string()}))
                .collect(),
        )
    }
}

/// Server-supplied row identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Str(String),
}

impl RowId {
    pub fn from_value(value: &Value) -> Option<RowId> {
        match value {
            Value::Number(n) => n.as_i64().map(RowId::Int),
            Value::String(s) => Some(RowId::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RowId::Int(i) => Value::from(*i),
            RowId::Str(s) => Value::String(s.clone()),
        }
    }

    /// The row's identifier under `id_column`, if present.
    pub fn of_row(row: &Row, id_column: &str) -> Option<RowId> {
        row.get(id_column).and_then(RowId::from_value)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(i) => write!(f, "{}", i),
            RowId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        RowId::Int(value)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId::Str(value.to_string())
    }
}

/// A named, server-persisted snapshot of one view's parameter slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedView {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub params: ParamSlice,
}

/// Paging and sorting actually applied to a grid request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableState {
    pub page: u32,
    pub size: u32,
    pub sort: Vec<SortSpec>,
}

/// Accept either a JSON string or number where a string identifier is expected.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_spec_keeps_render_config() {
        let col: ColumnSpec = serde_json::from_value(json!({
            "field": "name",
            "title": "Name",
            "width": 120,
            "formatter": "detail_link"
        }))
        .unwrap();
        assert!(col.visible);
        assert!(!col.collapsed);
        assert_eq!(col.extra.get("width"), Some(&json!(120)));
        assert_eq!(col.extra.get("formatter"), Some(&json!("detail_link")));
    }

    #[test]
    fn test_column_defaults_do_not_override_column() {
        let defaults: Map<String, Value> =
            serde_json::from_value(json!({"headerSort": false, "width": 80})).unwrap();
        let col = ColumnSpec::new("qty").with_extra("width", json!(40));
        let merged = col.with_defaults(&defaults).unwrap();
        assert_eq!(merged.extra.get("width"), Some(&json!(40)));
        assert_eq!(merged.extra.get("headerSort"), Some(&json!(false)));
        assert_eq!(merged.field, "qty");
    }

    #[test]
    fn test_sort_spec_field_alias() {
        let list = SortSpec::list_from_value(&json!([
            {"field": "name", "dir": "desc"},
            {"column": "id", "dir": "asc"},
            {"bogus": true}
        ]));
        assert_eq!(
            list,
            vec![
                SortSpec::new("name", SortDir::Desc),
                SortSpec::new("id", SortDir::Asc)
            ]
        );
    }

    #[test]
    fn test_sort_dir_parse() {
        assert_eq!("DESC".parse::<SortDir>().unwrap(), SortDir::Desc);
        assert!("sideways".parse::<SortDir>().is_err());
    }

    #[test]
    fn test_row_id_from_value() {
        assert_eq!(RowId::from_value(&json!(42)), Some(RowId::Int(42)));
        assert_eq!(RowId::from_value(&json!("42")), Some(RowId::Str("42".into())));
        assert_eq!(RowId::from_value(&json!(null)), None);
        assert_eq!(RowId::from_value(&json!(1.5)), None);
    }

    #[test]
    fn test_saved_view_numeric_id() {
        let view: SavedView = serde_json::from_value(json!({
            "id": 3,
            "label": "Open orders",
            "params": {"filterData": {"status": "open"}}
        }))
        .unwrap();
        assert_eq!(view.id, "3");
    }
}
