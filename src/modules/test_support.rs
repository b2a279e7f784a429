//! Owned backing state for building a [`ModuleContext`] in unit tests.

use serde_json::Value;

use super::{GridDefaults, ModuleContext};
use crate::config::GridConfig;
use crate::events::{GridNotification, GridRequest};
use crate::grid::{GridModel, GridOptions};
use crate::types::{ColumnSpec, ParamSlice, Row, TableState};

pub(crate) struct Harness<'c> {
    pub config: &'c GridConfig,
    pub defaults: GridDefaults,
    pub grid: GridModel,
    pub view_params: ParamSlice,
    pub search: String,
    pub last_table_params: Option<TableState>,
    pub state_for_save: ParamSlice,
    pub is_url_load: bool,
    pub requests: Vec<GridRequest>,
    pub notifications: Vec<GridNotification>,
}

impl<'c> Harness<'c> {
    pub fn new(config: &'c GridConfig) -> Self {
        Self::with_leading_columns(config, Vec::new())
    }

    pub fn with_leading_columns(config: &'c GridConfig, leading: Vec<ColumnSpec>) -> Self {
        let mut columns = leading;
        columns.extend(config.table_columns.iter().cloned());
        let table = TableState {
            page: config.table_initial_page,
            size: config.table_initial_page_size,
            sort: config.table_initial_sort.clone(),
        };
        let mut grid = GridModel::new(columns.clone(), &config.table_id_column_name, table.clone());
        grid.build(GridOptions::default());
        Self {
            config,
            defaults: GridDefaults { columns, table },
            grid,
            view_params: ParamSlice::new(),
            search: String::new(),
            last_table_params: None,
            state_for_save: ParamSlice::new(),
            is_url_load: false,
            requests: Vec::new(),
            notifications: Vec::new(),
        }
    }

    pub fn with_view_params(mut self, params: Value) -> Self {
        self.view_params = params.as_object().cloned().unwrap_or_default();
        self
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = search.to_string();
        self
    }

    pub fn with_rows(mut self, rows: Vec<Row>, last_page: u32, total: u64) -> Self {
        self.grid.replace_data(rows, last_page, total);
        self
    }

    pub fn run<T>(&mut self, f: impl FnOnce(&mut ModuleContext<'_>) -> T) -> T {
        let mut ctx = ModuleContext {
            config: self.config,
            defaults: &self.defaults,
            grid: &mut self.grid,
            view_params: &self.view_params,
            search: &self.search,
            last_table_params: self.last_table_params.as_ref(),
            state_for_save: &self.state_for_save,
            is_url_load: self.is_url_load,
            requests: &mut self.requests,
            notifications: &mut self.notifications,
        };
        f(&mut ctx)
    }

    pub fn apply(&mut self, f: impl FnOnce(&mut ModuleContext<'_>) -> crate::error::Result<()>) {
        if let Err(e) = self.run(f) {
            panic!("module action failed: {e}");
        }
    }
}
