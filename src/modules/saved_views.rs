//! Saved-view buttons.
//!
//! A saved view is a named snapshot of this grid's save-parameters. The module
//! holds no state of its own beyond which view the user last opened; every
//! button's status is recomputed from the current save-parameters each time
//! the URL state changes.

use serde::Serialize;
use serde_json::Value;

use gridstate_params::{ParamCodec, encode_uri_component};

use super::{FeatureModule, ModuleContext, SAVED_VIEWS_MODULE};
use crate::config::{Constants, GridConfig, Transport};
use crate::error::{GridError, Result};
use crate::events::{GridEvent, GridNotification, GridRequest};
use crate::types::{ParamSlice, SavedView};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewButtonState {
    pub id: String,
    pub label: String,
    /// The view's params equal the current state.
    pub active: bool,
    /// The user opened this view and has since changed the state.
    pub changed: bool,
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty() || s == "[]",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn strip_blank(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, strip_blank(v)))
                .filter(|(_, v)| !is_blank(v))
                .collect(),
        ),
        other => other,
    }
}

/// Canonical form for comparing save-parameters: blank values and the active
/// filter tab are dropped. Object comparison is key-order independent.
pub fn normalize_params(params: &ParamSlice, c: &Constants) -> Value {
    let mut params = params.clone();
    if let Some(Value::Object(filters)) = params.get_mut(&c.filter_data_name) {
        filters.remove(&c.table_params_selected_filter_type);
    }
    strip_blank(Value::Object(params))
}

pub struct SavedViewsModule {
    views: Vec<SavedView>,
    selected: Option<String>,
}

impl SavedViewsModule {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            views: config.saved_views.clone(),
            selected: None,
        }
    }

    pub fn views(&self) -> &[SavedView] {
        &self.views
    }

    pub fn selected_view(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Button states for the given save-parameters.
    pub fn button_states(&self, current: &ParamSlice, c: &Constants) -> Vec<ViewButtonState> {
        let current = normalize_params(current, c);
        self.views
            .iter()
            .map(|view| {
                let same = normalize_params(&view.params, c) == current;
                let selected = self.selected.as_deref() == Some(view.id.as_str());
                ViewButtonState {
                    id: view.id.clone(),
                    label: view.label.clone(),
                    active: same,
                    changed: selected && !same,
                }
            })
            .collect()
    }

    fn refresh_buttons(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let c = ctx.constants();
        let mut views = self.button_states(ctx.state_for_save, c);
        if self.selected.is_none()
            && let Some(active) = views.iter().find(|v| v.active)
        {
            self.selected = Some(active.id.clone());
            views = self.button_states(ctx.state_for_save, c);
        }
        let save_enabled = views.iter().all(|v| !v.active) || views.iter().any(|v| v.changed);
        let url_params = serde_json::to_string(ctx.state_for_save)?;
        ctx.notify(GridNotification::ViewButtons {
            views,
            save_enabled,
            url_params,
        });
        Ok(())
    }

    fn open_view(&mut self, view_id: Option<&str>, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let view = match view_id {
            Some(id) => Some(
                self.views
                    .iter()
                    .find(|v| v.id == id)
                    .ok_or_else(|| GridError::ViewNotFound(id.to_string()))?,
            ),
            None => None,
        };
        let c = ctx.constants();
        let search = match ctx.config.transport {
            Transport::Post => view
                .map(|v| {
                    format!(
                        "?{}={}",
                        encode_uri_component(&c.selected_view_name),
                        encode_uri_component(&v.id)
                    )
                })
                .unwrap_or_default(),
            Transport::Get => {
                let codec = ParamCodec::new(c.base_params_name.as_str())
                    .with_view_param(c.selected_view_name.as_str());
                let mut tree = codec.decode(ctx.search);
                tree.set_view(
                    ctx.config.view_id.clone(),
                    view.map(|v| v.params.clone()).unwrap_or_default(),
                );
                codec.encode(&tree)
            }
        };
        self.selected = view.map(|v| v.id.clone());
        ctx.request(GridRequest::PushHistory { search });
        ctx.request(GridRequest::LoadFromUrl);
        Ok(())
    }
}

impl FeatureModule for SavedViewsModule {
    fn name(&self) -> &str {
        SAVED_VIEWS_MODULE
    }

    fn requires_header(&self) -> Result<bool> {
        Ok(true)
    }

    fn load_from_url_after_init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.refresh_buttons(ctx)
    }

    fn after_url_state_update(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.refresh_buttons(ctx)
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        match event {
            GridEvent::OpenView { view_id } => self.open_view(view_id.as_deref(), ctx),
            _ => Ok(()),
        }
    }
}
