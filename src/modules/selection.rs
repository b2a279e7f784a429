//! Row selection, including "all rows matching the current filter".
//!
//! Selecting all switches the model to inverted mode: every row counts as
//! selected except the explicitly deselected ones, so the selection spans
//! pages that were never loaded. Selection is transient: it is never saved
//! into a view and is reset whenever the data is refetched.

use std::collections::BTreeSet;

use serde_json::{Value, json};

use super::{FeatureModule, ModuleContext, SELECTION_MODULE};
use crate::config::{Constants, GridConfig};
use crate::error::Result;
use crate::events::{GridEvent, GridNotification};
use crate::types::{ColumnSpec, ParamSlice, RowId};

pub const SELECTION_COLUMN: &str = "__selection";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionModel {
    /// Exactly these rows are selected.
    Explicit { selected: BTreeSet<RowId> },
    /// Every row except these is selected.
    Inverted { deselected: BTreeSet<RowId> },
}

impl Default for SelectionModel {
    fn default() -> Self {
        SelectionModel::Explicit {
            selected: BTreeSet::new(),
        }
    }
}

impl SelectionModel {
    pub fn select(&mut self, id: RowId) {
        match self {
            SelectionModel::Explicit { selected } => {
                selected.insert(id);
            }
            SelectionModel::Inverted { deselected } => {
                deselected.remove(&id);
            }
        }
    }

    pub fn deselect(&mut self, id: RowId) {
        match self {
            SelectionModel::Explicit { selected } => {
                selected.remove(&id);
            }
            SelectionModel::Inverted { deselected } => {
                deselected.insert(id);
            }
        }
    }

    pub fn select_all(&mut self) {
        *self = SelectionModel::Inverted {
            deselected: BTreeSet::new(),
        };
    }

    pub fn select_none(&mut self) {
        *self = SelectionModel::default();
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SelectionModel::Inverted { .. })
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        match self {
            SelectionModel::Explicit { selected } => selected.contains(id),
            SelectionModel::Inverted { deselected } => !deselected.contains(id),
        }
    }

    /// Number of selected rows given the total row count matching the filter.
    pub fn count(&self, total: u64) -> u64 {
        match self {
            SelectionModel::Explicit { selected } => selected.len() as u64,
            SelectionModel::Inverted { deselected } => {
                total.saturating_sub(deselected.len() as u64)
            }
        }
    }

    /// Persisted form, or `None` for an empty explicit selection.
    pub fn to_params(&self, c: &Constants) -> Option<Value> {
        let ids = |set: &BTreeSet<RowId>| -> Value {
            Value::Array(set.iter().map(RowId::to_value).collect())
        };
        let mut data = ParamSlice::new();
        match self {
            SelectionModel::Explicit { selected } => {
                if !selected.is_empty() {
                    data.insert(c.selected_rows_kwarg_name.clone(), ids(selected));
                }
            }
            SelectionModel::Inverted { deselected } => {
                data.insert(c.selected_rows_kwarg_name.clone(), json!(c.select_all_keyword));
                if !deselected.is_empty() {
                    data.insert(c.deselected_rows_kwarg_name.clone(), ids(deselected));
                }
            }
        }
        (!data.is_empty()).then_some(Value::Object(data))
    }

    /// Parse a persisted selection; malformed input yields an empty selection.
    pub fn from_params(data: Option<&ParamSlice>, c: &Constants) -> Self {
        let Some(data) = data else {
            return Self::default();
        };
        let ids = |key: &str| -> BTreeSet<RowId> {
            data.get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(RowId::from_value).collect())
                .unwrap_or_default()
        };
        match data.get(&c.selected_rows_kwarg_name) {
            Some(Value::String(keyword)) if *keyword == c.select_all_keyword => {
                SelectionModel::Inverted {
                    deselected: ids(&c.deselected_rows_kwarg_name),
                }
            }
            _ => SelectionModel::Explicit {
                selected: ids(&c.selected_rows_kwarg_name),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct SelectionModule {
    model: SelectionModel,
}

impl SelectionModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &SelectionModel {
        &self.model
    }

    fn publish(&self, ctx: &mut ModuleContext<'_>) {
        let count = self.model.count(ctx.grid.remote_row_count());
        ctx.notify(GridNotification::SelectionChanged {
            count,
            all: self.model.is_all(),
            bar_visible: count > 0,
        });
    }
}

impl FeatureModule for SelectionModule {
    fn name(&self) -> &str {
        SELECTION_MODULE
    }

    fn before_default_columns(&self, _config: &GridConfig) -> Result<Vec<ColumnSpec>> {
        Ok(vec![
            ColumnSpec::new(SELECTION_COLUMN)
                .with_extra("headerSort", json!(false))
                .with_extra("width", json!(52)),
        ])
    }

    fn load_from_url(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let c = ctx.constants();
        self.model = SelectionModel::from_params(ctx.url_object(&c.selection_data_name), c);
        Ok(())
    }

    fn load_from_url_after_init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.publish(ctx);
        Ok(())
    }

    fn get_url_params(&self, ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        let c = ctx.constants();
        let mut params = ParamSlice::new();
        if let Some(data) = self.model.to_params(c) {
            params.insert(c.selection_data_name.clone(), data);
        }
        Ok(params)
    }

    fn get_url_params_for_save(&self, _ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        Ok(ParamSlice::new())
    }

    fn before_refresh_table_data_if_not_url_load(
        &mut self,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<()> {
        if self.model != SelectionModel::default() {
            self.model.select_none();
            self.publish(ctx);
        }
        Ok(())
    }

    fn on_data_processed(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        if self.model.is_all() {
            self.publish(ctx);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        match event {
            GridEvent::RowSelected(id) => self.model.select(id.clone()),
            GridEvent::RowDeselected(id) => self.model.deselect(id.clone()),
            GridEvent::SelectAll => self.model.select_all(),
            GridEvent::SelectNone => self.model.select_none(),
            _ => return Ok(()),
        }
        self.publish(ctx);
        Ok(())
    }
}
