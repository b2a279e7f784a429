mod common;

use serde_json::{Value, json};

use common::GridStateCli;

#[test]
fn test_encode_then_decode() {
    let cli = GridStateCli::new();
    let encoded = cli.run_success(&["encode", r#"{"orders":{"filterData":{"name":"smith"}}}"#]);
    let search = encoded.trim();
    assert!(search.starts_with("?params=%7B"));

    let url = format!("/admin/orders/{search}");
    let decoded: Value = serde_json::from_str(&cli.run_success(&["decode", &url])).unwrap();
    assert_eq!(decoded, json!({"orders": {"filterData": {"name": "smith"}}}));

    let slice: Value =
        serde_json::from_str(&cli.run_success(&["decode", &url, "--view", "orders"])).unwrap();
    assert_eq!(slice, json!({"filterData": {"name": "smith"}}));
}

#[test]
fn test_decode_with_custom_param_name() {
    let cli = GridStateCli::new();
    let encoded = cli.run_success(&["encode", r#"{"g":{"tableParams":{"page":3}}}"#, "--param", "state"]);
    assert!(encoded.starts_with("?state="));

    let decoded: Value =
        serde_json::from_str(&cli.run_success(&["decode", encoded.trim(), "--param", "state"])).unwrap();
    assert_eq!(decoded["g"]["tableParams"]["page"], json!(3));
}

#[test]
fn test_malformed_url_decodes_to_empty_tree() {
    let cli = GridStateCli::new();
    let decoded: Value =
        serde_json::from_str(&cli.run_success(&["decode", "/list/?params=%7Bbroken"])).unwrap();
    assert_eq!(decoded, json!({}));
}

#[test]
fn test_decode_unknown_view_fails() {
    let cli = GridStateCli::new();
    let stderr = cli.run_failure(&["decode", "/list/?params=%7B%7D", "--view", "orders"]);
    assert!(stderr.contains("no parameters for view 'orders'"));
}

#[test]
fn test_encode_rejects_non_object() {
    let cli = GridStateCli::new();
    let stderr = cli.run_failure(&["encode", "[1, 2]"]);
    assert!(stderr.contains("must be a JSON object"));
}

#[test]
fn test_fetch_rejects_invalid_config() {
    let cli = GridStateCli::new();
    let path = cli.write_file(
        "grid.yaml",
        "viewId: ''\ntableAjaxUrl: /admin/orders/action_list_json/\n",
    );
    let stderr = cli.run_failure(&["fetch", "-c", path.to_str().unwrap()]);
    assert!(stderr.contains("configuration error"));
}

#[test]
fn test_fetch_reports_missing_config_file() {
    let cli = GridStateCli::new();
    let stderr = cli.run_failure(&["fetch", "-c", "missing.json"]);
    assert!(stderr.contains("IO error"));
}
