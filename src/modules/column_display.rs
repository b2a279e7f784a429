//! Column order, visibility and collapse state.
//!
//! Only the difference from the configured layout is persisted: the order when
//! it differs from the default order, and the columns whose visible or
//! collapsed flag differs from their default. Collapsed columns stay logically
//! visible but may be folded away by a responsive layout; hidden columns are
//! never shown.

use serde::Serialize;
use serde_json::{Value, json};

use super::{COLUMN_DISPLAY_MODULE, FeatureModule, ModuleContext};
use crate::error::Result;
use crate::events::{GridEvent, GridNotification, GridRequest};
use crate::types::{ColumnSpec, ParamSlice};

/// One row of the column chooser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnWidgetEntry {
    pub field: String,
    pub title: Option<String>,
    pub visible: bool,
    pub collapsed: bool,
    /// Untitled columns (checkboxes, handles) are not offered in the chooser.
    pub listed: bool,
}

#[derive(Debug, Default)]
pub struct ColumnDisplayModule;

impl ColumnDisplayModule {
    pub fn new() -> Self {
        Self
    }

    fn publish_widget(ctx: &mut ModuleContext<'_>) {
        let columns = ctx
            .grid
            .columns()
            .iter()
            .map(|c| ColumnWidgetEntry {
                field: c.field().to_string(),
                title: c.spec.title.clone(),
                visible: c.visible,
                collapsed: c.collapsed,
                listed: c.spec.title.is_some(),
            })
            .collect();
        ctx.notify(GridNotification::ColumnWidget { columns });
    }

    /// Default columns rearranged and re-flagged by a persisted `columnsData` object.
    fn apply_columns_data(defaults: &[ColumnSpec], data: Option<&ParamSlice>, keys: (&str, &str, &str, &str)) -> Vec<ColumnSpec> {
        let (order_key, columns_key, visible_key, collapsed_key) = keys;
        let url_columns = data
            .and_then(|d| d.get(columns_key))
            .and_then(Value::as_object);
        let url_order: Vec<&str> = data
            .and_then(|d| d.get(order_key))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut ordered: Vec<&ColumnSpec> = Vec::with_capacity(defaults.len());
        for field in url_order {
            if let Some(spec) = defaults.iter().find(|c| c.field == field)
                && !ordered.iter().any(|c| c.field == field)
            {
                ordered.push(spec);
            }
        }
        for spec in defaults {
            if !ordered.iter().any(|c| c.field == spec.field) {
                ordered.push(spec);
            }
        }

        ordered
            .into_iter()
            .map(|spec| {
                let mut spec = spec.clone();
                if let Some(entry) = url_columns
                    .and_then(|cols| cols.get(&spec.field))
                    .and_then(Value::as_object)
                {
                    if let Some(visible) = entry.get(visible_key).and_then(Value::as_bool) {
                        spec.visible = visible;
                    }
                    if let Some(collapsed) = entry.get(collapsed_key).and_then(Value::as_bool) {
                        spec.collapsed = collapsed;
                    }
                }
                spec
            })
            .collect()
    }
}

impl FeatureModule for ColumnDisplayModule {
    fn name(&self) -> &str {
        COLUMN_DISPLAY_MODULE
    }

    fn requires_header(&self) -> Result<bool> {
        Ok(true)
    }

    fn load_from_url(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let c = ctx.constants();
        let data = ctx.url_object(&c.columns_data_name);
        let columns = Self::apply_columns_data(
            &ctx.defaults.columns,
            data,
            (
                &c.columns_data_order_name,
                &c.columns_data_columns_name,
                &c.columns_data_visible_name,
                &c.columns_data_collapsed_name,
            ),
        );
        ctx.grid.set_columns(columns);
        Ok(())
    }

    fn load_from_url_after_init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        Self::publish_widget(ctx);
        Ok(())
    }

    fn get_url_params(&self, ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        let mut params = ParamSlice::new();
        if !ctx.grid.is_built() {
            return Ok(params);
        }
        let c = ctx.constants();
        let mut data = ParamSlice::new();

        let order = ctx.grid.column_order();
        if order != ctx.defaults.column_order() {
            data.insert(c.columns_data_order_name.clone(), json!(order));
        }

        let mut changed = ParamSlice::new();
        for column in ctx.grid.columns() {
            let (initial_visible, initial_collapsed) = ctx
                .defaults
                .column(column.field())
                .map(|d| (d.visible, d.collapsed))
                .unwrap_or((true, false));
            if column.visible != initial_visible || column.collapsed != initial_collapsed {
                let mut entry = ParamSlice::new();
                entry.insert(c.columns_data_visible_name.clone(), Value::Bool(column.visible));
                entry.insert(c.columns_data_collapsed_name.clone(), Value::Bool(column.collapsed));
                changed.insert(column.field().to_string(), Value::Object(entry));
            }
        }
        if !changed.is_empty() {
            data.insert(c.columns_data_columns_name.clone(), Value::Object(changed));
        }

        if !data.is_empty() {
            params.insert(c.columns_data_name.clone(), Value::Object(data));
        }
        Ok(params)
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        match event {
            GridEvent::ColumnVisibilityChanged {
                field,
                visible,
                collapsed,
            } => {
                ctx.grid.set_column_state(field, *visible, *collapsed)?;
                Self::publish_widget(ctx);
                ctx.request(GridRequest::RefreshData);
            }
            GridEvent::ColumnMoved { from, to } => {
                ctx.grid.move_column(*from, *to)?;
                Self::publish_widget(ctx);
                ctx.request(GridRequest::UpdateUrlState);
            }
            _ => {}
        }
        Ok(())
    }
}
