use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One grid's slice of the parameter tree (`filterData`, `columnsData`, ...).
pub type ParamSlice = Map<String, Value>;

/// The full persisted state of every grid on a page, keyed by view id.
///
/// Absent keys mean "use defaults". The tree never stores `null` for a view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTree(Map<String, Value>);

impl ParameterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-parsed JSON value. Anything but an object yields an empty tree.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The slice stored for `view_id`, if it is an object.
    pub fn view(&self, view_id: &str) -> Option<&ParamSlice> {
        self.0.get(view_id).and_then(Value::as_object)
    }

    /// The slice stored for `view_id`, or an empty slice.
    pub fn view_or_default(&self, view_id: &str) -> ParamSlice {
        self.view(view_id).cloned().unwrap_or_default()
    }

    /// Replace the slice for `view_id`, keeping every other view untouched.
    pub fn set_view(&mut self, view_id: impl Into<String>, slice: ParamSlice) {
        self.0.insert(view_id.into(), Value::Object(slice));
    }

    pub fn remove_view(&mut self, view_id: &str) -> Option<Value> {
        self.0.remove(view_id)
    }

    pub fn view_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ParameterTree {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
