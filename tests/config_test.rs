mod common;

use std::io::Write;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{page_ids, rows};
use gridstate::{
    GridConfig, GridError, GridEvent, GridOrchestrator, MemoryBackend, MemoryHistory,
    ModuleRegistry, ParamCodec, ParameterTree, SortDir, Transport,
};

const TABLE_YAML: &str = r#"
viewId: orders
baseViewUrl: /admin/orders/
tableAjaxUrl: /admin/orders/action_list_json/
tableInitialPageSize: 10
tableInitialSort:
  - field: id
    dir: desc
tableColumns:
  - field: id
    title: ID
  - field: name
    title: Name
  - field: status
    title: Status
    visible: false
filterFields:
  - name: name
  - name: status
    widget: select
    alwaysVisible: true
savedViews:
  - id: 3
    label: Open orders
    params:
      filters:
        status: open
constants:
  BASE_PARAMS_NAME: state
  FILTER_DATA_NAME: filters
"#;

fn load(contents: &str, suffix: &str) -> gridstate::Result<GridConfig> {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    GridConfig::load(file.path())
}

#[test]
fn test_yaml_table_definition() {
    let config = load(TABLE_YAML, ".yml").unwrap();
    assert_eq!(config.view_id, "orders");
    assert_eq!(config.transport, Transport::Get);
    assert!(config.history_enabled());
    assert_eq!(config.table_initial_sort[0].dir, SortDir::Desc);
    assert!(!config.table_columns[2].visible);
    assert_eq!(config.saved_views[0].id, "3");
    assert_eq!(config.constants.base_params_name, "state");
    // unspecified constants keep their defaults
    assert_eq!(config.constants.table_params_name, "tableParams");
}

#[test]
fn test_json_table_definition() {
    let config = load(
        r#"{"viewId": "users", "tableAjaxUrl": "/users/data/", "transport": "POST"}"#,
        ".json",
    )
    .unwrap();
    assert_eq!(config.transport, Transport::Post);
    assert!(!config.history_enabled());
}

#[test]
fn test_invalid_definitions_rejected() {
    let result = load("viewId: orders\ntableAjaxUrl: ''\n", ".yaml");
    assert!(matches!(result, Err(GridError::Config(_))));

    let result = load("viewId: orders\ntableAjaxUrl: /data/\ntableInitialPageSize: 0\n", ".yaml");
    assert!(matches!(result, Err(GridError::Config(_))));

    let result = load("viewId: [orders\n", ".yaml");
    assert!(matches!(result, Err(GridError::YamlParse(_))));
}

#[tokio::test]
async fn test_renamed_keys_drive_the_grid() {
    let config = load(TABLE_YAML, ".yaml").unwrap();
    let tree = ParameterTree::from_value(json!({"orders": {"filters": {"status": "open"}}}));
    let url = format!("/admin/orders/{}", ParamCodec::new("state").encode(&tree));

    let mut grid = GridOrchestrator::new(
        config,
        &ModuleRegistry::with_builtin(),
        MemoryBackend::new(rows(30), "id").with_filter_data_name("filters"),
        MemoryHistory::new(&url),
    )
    .unwrap();
    grid.init().await.unwrap();

    assert_eq!(grid.grid().remote_row_count(), 15);
    assert_eq!(&page_ids(&grid)[..3], &[29, 27, 25]);
    assert!(grid.url_params_string().starts_with("?state="));

    grid.dispatch(GridEvent::PageChanged(2)).await.unwrap();
    let pushed = ParamCodec::new("state").decode(&common::current_url(&grid));
    assert_eq!(
        pushed.into_value(),
        json!({"orders": {"filters": {"status": "open"}, "tableParams": {"page": 2}}})
    );
}
