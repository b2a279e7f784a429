//! Headless model of the remote-paginated grid component.
//!
//! The engine never renders; it drives this model the way a browser grid
//! widget would be driven (columns, the loaded page of rows, paging, sorting)
//! and the host mirrors it onto real widgets. Paging and sorting setters only
//! mark a fetch as pending; the orchestrator performs it.

use serde_json::{Map, Value};

use crate::error::{GridError, Result};
use crate::types::{ColumnSpec, Row, RowId, SortSpec, TableState};

/// Options the grid is constructed with, after modules have adjusted them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridOptions {
    pub movable_rows: bool,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub spec: ColumnSpec,
    pub visible: bool,
    pub collapsed: bool,
}

impl GridColumn {
    fn from_spec(spec: ColumnSpec) -> Self {
        Self {
            visible: spec.visible,
            collapsed: spec.collapsed,
            spec,
        }
    }

    pub fn field(&self) -> &str {
        &self.spec.field
    }
}

#[derive(Debug, Clone)]
pub struct GridModel {
    columns: Vec<GridColumn>,
    rows: Vec<Row>,
    id_column: String,
    page: u32,
    page_size: u32,
    sort: Vec<SortSpec>,
    last_page: u32,
    remote_row_count: u64,
    options: GridOptions,
    built: bool,
    fetch_pending: bool,
    height_frozen: bool,
}

impl GridModel {
    pub fn new(columns: Vec<ColumnSpec>, id_column: impl Into<String>, state: TableState) -> Self {
        Self {
            columns: columns.into_iter().map(GridColumn::from_spec).collect(),
            rows: Vec::new(),
            id_column: id_column.into(),
            page: state.page.max(1),
            page_size: state.size.max(1),
            sort: state.sort,
            last_page: 1,
            remote_row_count: 0,
            options: GridOptions::default(),
            built: false,
            fetch_pending: false,
            height_frozen: false,
        }
    }

    pub fn build(&mut self, options: GridOptions) {
        self.options = options;
        self.built = true;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    // Columns

    pub fn columns(&self) -> &[GridColumn] {
        &self.columns
    }

    pub fn column(&self, field: &str) -> Option<&GridColumn> {
        self.columns.iter().find(|c| c.field() == field)
    }

    pub fn column_order(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.field().to_string()).collect()
    }

    pub fn set_columns(&mut self, columns: Vec<ColumnSpec>) {
        self.columns = columns.into_iter().map(GridColumn::from_spec).collect();
    }

    pub fn set_column_state(&mut self, field: &str, visible: bool, collapsed: bool) -> Result<()> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.spec.field == field)
            .ok_or_else(|| GridError::ColumnNotFound(field.to_string()))?;
        column.visible = visible;
        column.collapsed = collapsed;
        Ok(())
    }

    /// Move the column at `from` so it ends up at index `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.columns.len() || to >= self.columns.len() {
            return Err(GridError::ColumnNotFound(format!("index {from}->{to}")));
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        Ok(())
    }

    // Rows

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn data_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_id_at(&self, index: usize) -> Option<RowId> {
        self.rows
            .get(index)
            .and_then(|r| RowId::of_row(r, &self.id_column))
    }

    pub fn row_index(&self, id: &RowId) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| RowId::of_row(r, &self.id_column).as_ref() == Some(id))
    }

    /// Move a row relative to the row currently at `target`.
    ///
    /// `target` indexes the page before the move. With `above` the row lands
    /// in front of that row, otherwise right after it.
    pub fn move_row(&mut self, from: usize, target: usize, above: bool) -> Result<usize> {
        if from >= self.rows.len() || target >= self.rows.len() {
            return Err(GridError::RowNotFound(format!("index {from}->{target}")));
        }
        let row = self.rows.remove(from);
        let target = if target > from { target - 1 } else { target };
        let index = if above { target } else { target + 1 };
        self.rows.insert(index, row);
        Ok(index)
    }

    /// Append a row at the bottom of the loaded page.
    pub fn add_row(&mut self, row: Row) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn delete_row(&mut self, index: usize) -> Option<Row> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Merge fresh data into loaded rows matched by id. Returns how many matched.
    pub fn update_rows(&mut self, updates: Vec<Row>) -> usize {
        let mut updated = 0;
        for update in updates {
            let Some(id) = RowId::of_row(&update, &self.id_column) else {
                continue;
            };
            if let Some(index) = self.row_index(&id) {
                self.rows[index].extend(update);
                updated += 1;
            }
        }
        updated
    }

    /// Set one cell, returning the previous value.
    pub fn update_cell(&mut self, id: &RowId, field: &str, value: Value) -> Result<Option<Value>> {
        let index = self
            .row_index(id)
            .ok_or_else(|| GridError::RowNotFound(id.to_string()))?;
        Ok(self.rows[index].insert(field.to_string(), value))
    }

    pub fn replace_data(&mut self, rows: Vec<Row>, last_page: u32, remote_row_count: u64) {
        self.rows = rows;
        self.last_page = last_page.max(1);
        self.remote_row_count = remote_row_count;
    }

    // Paging and sorting

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> &[SortSpec] {
        &self.sort
    }

    pub fn page_max(&self) -> u32 {
        self.last_page
    }

    pub fn remote_row_count(&self) -> u64 {
        self.remote_row_count
    }

    /// Absolute index (0-based) of the first row on the loaded page.
    pub fn page_start(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
        self.fetch_pending = true;
    }

    pub fn set_page_size(&mut self, size: u32) {
        self.page_size = size.max(1);
        self.page = 1;
        self.fetch_pending = true;
    }

    pub fn set_sort(&mut self, sort: Vec<SortSpec>) {
        self.sort = sort;
        self.fetch_pending = true;
    }

    /// Apply paging and sorting without scheduling a fetch.
    pub fn restore_state(&mut self, state: TableState) {
        self.page = state.page.max(1);
        self.page_size = state.size.max(1);
        self.sort = state.sort;
    }

    pub fn table_state(&self) -> TableState {
        TableState {
            page: self.page,
            size: self.page_size,
            sort: self.sort.clone(),
        }
    }

    pub fn request_fetch(&mut self) {
        self.fetch_pending = true;
    }

    pub fn take_fetch_pending(&mut self) -> bool {
        std::mem::take(&mut self.fetch_pending)
    }

    // Height

    pub fn freeze_height(&mut self) {
        self.height_frozen = true;
    }

    pub fn restore_height(&mut self) {
        self.height_frozen = false;
    }

    pub fn is_height_frozen(&self) -> bool {
        self.height_frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: i64) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), json!(id));
        row
    }

    fn grid_with_rows(ids: &[i64]) -> GridModel {
        let mut grid = GridModel::new(
            vec![ColumnSpec::new("id"), ColumnSpec::new("name")],
            "id",
            TableState {
                page: 1,
                size: 10,
                sort: vec![],
            },
        );
        grid.replace_data(ids.iter().map(|i| row(*i)).collect(), 1, ids.len() as u64);
        grid
    }

    fn ids(grid: &GridModel) -> Vec<i64> {
        grid.rows().iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn test_move_row_down_lands_on_target_index() {
        let mut grid = grid_with_rows(&[1, 2, 3, 4, 5]);
        let index = grid.move_row(1, 3, false).unwrap();
        assert_eq!(index, 3);
        assert_eq!(ids(&grid), vec![1, 3, 4, 2, 5]);
    }

    #[test]
    fn test_move_row_up_lands_on_target_index() {
        let mut grid = grid_with_rows(&[1, 2, 3, 4, 5]);
        let index = grid.move_row(4, 1, true).unwrap();
        assert_eq!(index, 1);
        assert_eq!(ids(&grid), vec![1, 5, 2, 3, 4]);
    }

    #[test]
    fn test_move_appended_row_below_target() {
        let mut grid = grid_with_rows(&[21, 22, 23, 24, 25]);
        grid.add_row(row(5));
        grid.move_row(5, 2, false).unwrap();
        assert_eq!(ids(&grid), vec![21, 22, 23, 5, 24, 25]);
    }

    #[test]
    fn test_set_page_size_resets_page() {
        let mut grid = grid_with_rows(&[1]);
        grid.set_page(4);
        assert!(grid.take_fetch_pending());
        grid.set_page_size(50);
        assert_eq!(grid.page(), 1);
        assert!(grid.take_fetch_pending());
        assert!(!grid.take_fetch_pending());
    }

    #[test]
    fn test_restore_state_does_not_schedule_fetch() {
        let mut grid = grid_with_rows(&[1]);
        grid.restore_state(TableState {
            page: 3,
            size: 50,
            sort: vec![],
        });
        assert_eq!(grid.page(), 3);
        assert_eq!(grid.page_start(), 100);
        assert!(!grid.take_fetch_pending());
    }

    #[test]
    fn test_update_rows_by_id() {
        let mut grid = grid_with_rows(&[1, 2]);
        let mut fresh = row(2);
        fresh.insert("name".into(), json!("Bob"));
        assert_eq!(grid.update_rows(vec![fresh, row(9)]), 1);
        assert_eq!(grid.rows()[1]["name"], json!("Bob"));
    }

    #[test]
    fn test_update_cell_returns_previous() {
        let mut grid = grid_with_rows(&[1]);
        let previous = grid.update_cell(&RowId::Int(1), "id", json!(100)).unwrap();
        assert_eq!(previous, Some(json!(1)));
        assert!(grid.update_cell(&RowId::Int(7), "name", json!("x")).is_err());
    }

    #[test]
    fn test_move_column() {
        let mut grid = grid_with_rows(&[]);
        grid.move_column(0, 1).unwrap();
        assert_eq!(grid.column_order(), vec!["name", "id"]);
        assert!(grid.move_column(0, 5).is_err());
    }
}
