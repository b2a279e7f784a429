use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::tree::{ParamSlice, ParameterTree};

/// Query parameter holding the JSON-encoded tree.
pub const DEFAULT_PARAM_NAME: &str = "params";

/// Query parameter naming a saved view whose stored params replace the tree.
pub const DEFAULT_VIEW_PARAM_NAME: &str = "selectedView";

/// Characters `encodeURIComponent` leaves untouched.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escape a string exactly like the browser's `encodeURIComponent`.
pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Returns the query part of `input`, which may be a bare search string
/// (`?a=b`), a query without the leading `?`, or a full URL.
fn query_part(input: &str) -> &str {
    let without_fragment = input.split('#').next().unwrap_or_default();
    match without_fragment.find('?') {
        Some(idx) => &without_fragment[idx + 1..],
        None if without_fragment.contains('=') => without_fragment,
        None => "",
    }
}

/// First value of `key` in a URL search string, percent-decoded.
pub fn query_value(search: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query_part(search).as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn parse_object(raw: &str) -> Option<ParamSlice> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Serializes a [`ParameterTree`] into a single URL query parameter and back.
///
/// Decoding never fails: absent, malformed, or non-object payloads all decode
/// to an empty tree so a broken link degrades to default grid state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamCodec {
    param_name: String,
    view_param_name: String,
}

impl Default for ParamCodec {
    fn default() -> Self {
        Self::new(DEFAULT_PARAM_NAME)
    }
}

impl ParamCodec {
    pub fn new(param_name: impl Into<String>) -> Self {
        Self {
            param_name: param_name.into(),
            view_param_name: DEFAULT_VIEW_PARAM_NAME.to_string(),
        }
    }

    pub fn with_view_param(mut self, view_param_name: impl Into<String>) -> Self {
        self.view_param_name = view_param_name.into();
        self
    }

    pub fn param_name(&self) -> &str {
        &self.param_name
    }

    pub fn view_param_name(&self) -> &str {
        &self.view_param_name
    }

    /// The compact JSON text of `tree`.
    pub fn to_json(tree: &ParameterTree) -> String {
        serde_json::to_string(tree.as_map()).unwrap_or_else(|_| "{}".to_string())
    }

    /// `?<param>=<encodeURIComponent(json)>`
    pub fn encode(&self, tree: &ParameterTree) -> String {
        format!("?{}", self.encode_pair(tree))
    }

    /// `<param>=<encodeURIComponent(json)>`, without the leading `?`.
    pub fn encode_pair(&self, tree: &ParameterTree) -> String {
        format!(
            "{}={}",
            self.param_name,
            encode_uri_component(&Self::to_json(tree))
        )
    }

    /// Parse the tree out of a search string (or full URL).
    pub fn decode(&self, search: &str) -> ParameterTree {
        query_value(search, &self.param_name)
            .and_then(|raw| parse_object(&raw))
            .map(ParameterTree::from)
            .unwrap_or_default()
    }

    /// The saved-view id named by the view-select parameter, if any.
    pub fn selected_view(&self, search: &str) -> Option<String> {
        query_value(search, &self.view_param_name).filter(|id| !id.is_empty())
    }

    /// Decode with the saved-view path taking precedence.
    ///
    /// When the search names a view that `lookup` knows, its stored blob
    /// becomes the slice for `view_id`. Otherwise this is [`Self::decode`].
    pub fn decode_with_views<F>(&self, search: &str, view_id: &str, lookup: F) -> ParameterTree
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(selected) = self.selected_view(search)
            && let Some(blob) = lookup(&selected)
        {
            let mut tree = ParameterTree::new();
            tree.set_view(view_id, parse_object(&blob).unwrap_or_default());
            return tree;
        }
        self.decode(search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn tree(value: Value) -> ParameterTree {
        ParameterTree::from_value(value)
    }

    #[test]
    fn test_encode_matches_encode_uri_component() {
        let codec = ParamCodec::default();
        let t = tree(json!({"grid": {"filterData": {"name": "smith"}}}));
        assert_eq!(
            codec.encode(&t),
            "?params=%7B%22grid%22%3A%7B%22filterData%22%3A%7B%22name%22%3A%22smith%22%7D%7D%7D"
        );
    }

    #[test]
    fn test_encode_uri_component_reserved_set() {
        assert_eq!(encode_uri_component("a-b_c.d!e~f*g'h(i)j"), "a-b_c.d!e~f*g'h(i)j");
        assert_eq!(encode_uri_component("a b+c/d?e&f=g"), "a%20b%2Bc%2Fd%3Fe%26f%3Dg");
        assert_eq!(encode_uri_component("ž"), "%C5%BE");
    }

    #[test]
    fn test_decode_absent_is_empty() {
        let codec = ParamCodec::default();
        assert!(codec.decode("").is_empty());
        assert!(codec.decode("?other=1").is_empty());
    }

    #[test]
    fn test_decode_malformed_is_empty() {
        let codec = ParamCodec::default();
        assert!(codec.decode("?params=%7Bnot-json").is_empty());
        assert!(codec.decode("?params=null").is_empty());
        assert!(codec.decode("?params=%5B1%2C2%5D").is_empty());
    }

    #[test]
    fn test_decode_full_url_and_fragment() {
        let codec = ParamCodec::default();
        let t = tree(json!({"g": {"tableParams": {"page": 3}}}));
        let url = format!("https://admin.example.com/orders/{}#top", codec.encode(&t));
        assert_eq!(codec.decode(&url), t);
    }

    #[test]
    fn test_custom_param_name() {
        let codec = ParamCodec::new("state");
        let t = tree(json!({"g": {}}));
        let encoded = codec.encode(&t);
        assert!(encoded.starts_with("?state="));
        assert_eq!(codec.decode(&encoded), t);
        assert!(ParamCodec::default().decode(&encoded).is_empty());
    }

    #[test]
    fn test_selected_view_path() {
        let codec = ParamCodec::default();
        let lookup = |id: &str| match id {
            "7" => Some(r#"{"filterData":{"status":"open"}}"#.to_string()),
            _ => None,
        };
        let decoded = codec.decode_with_views("?selectedView=7", "orders", lookup);
        assert_eq!(decoded, tree(json!({"orders": {"filterData": {"status": "open"}}})));
    }

    #[test]
    fn test_selected_view_unknown_falls_back_to_params() {
        let codec = ParamCodec::default();
        let base = tree(json!({"orders": {"tableParams": {"size": 50}}}));
        let search = format!("{}&selectedView=99", codec.encode(&base));
        let decoded = codec.decode_with_views(&search, "orders", |_| None);
        assert_eq!(decoded, base);
    }

    #[test]
    fn test_selected_view_malformed_blob_is_empty_slice() {
        let codec = ParamCodec::default();
        let decoded = codec.decode_with_views("?selectedView=1", "orders", |_| {
            Some("{broken".to_string())
        });
        assert_eq!(decoded, tree(json!({"orders": {}})));
    }

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            ".*".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map(".*", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn parameter_tree() -> impl Strategy<Value = ParameterTree> {
        prop::collection::btree_map(
            "[a-z_]{1,12}",
            prop::collection::btree_map("[A-Za-z]{1,12}", json_value(), 0..5),
            0..4,
        )
        .prop_map(|views| {
            let mut tree = ParameterTree::new();
            for (view, slice) in views {
                tree.set_view(view, slice.into_iter().collect());
            }
            tree
        })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(t in parameter_tree()) {
            let codec = ParamCodec::default();
            prop_assert_eq!(codec.decode(&codec.encode(&t)), t);
        }

        #[test]
        fn prop_decode_never_panics(s in ".*") {
            let codec = ParamCodec::default();
            let _ = codec.decode(&format!("?params={s}"));
        }
    }
}
