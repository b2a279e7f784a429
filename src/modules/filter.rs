//! Simple per-field filters.
//!
//! Each configured filter field holds one opaque string value. Hidden fields
//! are disabled and never persisted; a value the user enters shows its field.
//! Empty values (`""` and `"[]"`) mean the filter is cleared.

use std::collections::BTreeMap;

use serde_json::Value;

use super::{FILTER_MODULE, FeatureModule, ModuleContext};
use crate::config::{FilterFieldSpec, GridConfig, WidgetKind};
use crate::error::{GridError, Result};
use crate::events::{GridEvent, GridNotification, GridRequest};
use crate::types::ParamSlice;

/// Whether a raw filter value means "no filter".
pub fn is_empty_value(value: &str) -> bool {
    value.is_empty() || value == "[]"
}

/// Display label for a filter's dropdown button.
///
/// Multi-choice values arrive as JSON arrays or objects of `{value, label}`
/// entries; more than `max_shown` entries collapse into a `... +N` suffix.
pub fn filter_label(spec: &FilterFieldSpec, value: &str, max_shown: usize) -> String {
    if is_empty_value(value) {
        return spec.empty_label.clone().unwrap_or_default();
    }

    let entries: Option<Vec<Value>> = match serde_json::from_str::<Value>(value) {
        Ok(Value::Array(items)) => Some(items),
        Ok(Value::Object(map)) => Some(map.into_iter().map(|(_, v)| v).collect()),
        _ => None,
    };

    match entries {
        Some(entries) => {
            let label_of = |item: &Value| match item.get("label") {
                Some(Value::String(label)) => label.clone(),
                Some(other) => other.to_string(),
                None => item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()),
            };
            if max_shown > 1 && entries.len() > max_shown {
                let shown = max_shown - 1;
                let labels: Vec<String> = entries.iter().take(shown).map(label_of).collect();
                format!("{}... +{}", labels.join(", "), entries.len() - shown)
            } else {
                entries.iter().map(label_of).collect::<Vec<_>>().join(", ")
            }
        }
        None => spec
            .choices
            .iter()
            .find(|c| c.value == value)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| value.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FilterInput {
    spec: FilterFieldSpec,
    value: String,
    /// Disabled inputs are hidden and excluded from the URL.
    enabled: bool,
}

pub struct FilterModule {
    inputs: BTreeMap<String, FilterInput>,
    max_choices_shown: usize,
}

impl FilterModule {
    pub fn new(config: &GridConfig) -> Self {
        let mut fields = config.filter_fields.clone();
        // header tabs persist the active tab through a hidden form input
        let tab_field = &config.constants.table_params_selected_filter_type;
        if !config.header_tabs.is_empty() && !fields.iter().any(|f| &f.name == tab_field) {
            fields.push(
                FilterFieldSpec::new(tab_field.clone())
                    .with_widget(WidgetKind::Hidden)
                    .always_visible(),
            );
        }

        let inputs = fields
            .into_iter()
            .map(|spec| {
                let enabled = spec.always_visible;
                (
                    spec.name.clone(),
                    FilterInput {
                        spec,
                        value: String::new(),
                        enabled,
                    },
                )
            })
            .collect();

        Self {
            inputs,
            max_choices_shown: config.constants.multiselect_filter_max_choices_shown,
        }
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.inputs.get(field).map(|i| i.value.as_str())
    }

    pub fn is_visible(&self, field: &str) -> bool {
        self.inputs.get(field).is_some_and(|i| i.enabled)
    }

    /// Values that would be submitted: enabled and not empty.
    pub fn active_values(&self) -> BTreeMap<String, String> {
        self.inputs
            .iter()
            .filter(|(_, i)| i.enabled && !is_empty_value(&i.value))
            .map(|(name, i)| (name.clone(), i.value.clone()))
            .collect()
    }

    fn input_mut(&mut self, field: &str) -> Result<&mut FilterInput> {
        self.inputs
            .get_mut(field)
            .ok_or_else(|| GridError::FilterFieldNotFound(field.to_string()))
    }

    fn publish_label(&self, field: &str, ctx: &mut ModuleContext<'_>) {
        if let Some(input) = self.inputs.get(field) {
            ctx.notify(GridNotification::FilterLabel {
                field: field.to_string(),
                label: filter_label(&input.spec, &input.value, self.max_choices_shown),
                empty: is_empty_value(&input.value),
            });
        }
    }

    /// Set a value without triggering a refetch.
    pub fn set_value(&mut self, field: &str, value: &str, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.input_mut(field)?.value = value.to_string();
        self.publish_label(field, ctx);
        Ok(())
    }

    /// Empty the given fields and tell their widgets to clear, without refetching.
    pub fn clear_fields(&mut self, fields: &[String], ctx: &mut ModuleContext<'_>) {
        for field in fields {
            let Some(input) = self.inputs.get_mut(field) else {
                continue;
            };
            input.value.clear();
            ctx.notify(GridNotification::WidgetClear {
                field: field.clone(),
                refresh: false,
            });
            self.publish_label(field, ctx);
        }
    }

    fn show(&mut self, field: &str, focus: bool, ctx: &mut ModuleContext<'_>) -> Result<bool> {
        let input = self.input_mut(field)?;
        let was_visible = input.enabled;
        input.enabled = true;
        ctx.notify(GridNotification::FilterVisibility {
            field: field.to_string(),
            visible: true,
            focus,
        });
        Ok(!was_visible || !focus)
    }

    fn hide(&mut self, field: &str, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let input = self.input_mut(field)?;
        input.value.clear();
        input.enabled = false;
        ctx.notify(GridNotification::FilterVisibility {
            field: field.to_string(),
            visible: false,
            focus: false,
        });
        ctx.notify(GridNotification::WidgetClear {
            field: field.to_string(),
            refresh: false,
        });
        Ok(())
    }
}

impl FeatureModule for FilterModule {
    fn name(&self) -> &str {
        FILTER_MODULE
    }

    fn requires_header(&self) -> Result<bool> {
        Ok(true)
    }

    fn load_from_url(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let hidden: Vec<String> = self
            .inputs
            .iter()
            .filter(|(_, i)| !i.spec.always_visible)
            .map(|(name, _)| name.clone())
            .collect();
        for input in self.inputs.values_mut() {
            input.value.clear();
        }
        for field in &hidden {
            self.hide(field, ctx)?;
        }

        let filter_data_name = ctx.constants().filter_data_name.clone();
        if let Some(filter_data) = ctx.url_object(&filter_data_name).cloned() {
            for (field, value) in filter_data {
                if !self.inputs.contains_key(&field) {
                    tracing::debug!(field = %field, "ignoring unknown filter field from url");
                    continue;
                }
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                self.show(&field, false, ctx)?;
                self.input_mut(&field)?.value = value.clone();
                ctx.notify(GridNotification::WidgetReload {
                    field: field.clone(),
                    value,
                });
            }
        }

        let fields: Vec<String> = self.inputs.keys().cloned().collect();
        for field in &fields {
            self.publish_label(field, ctx);
        }
        Ok(())
    }

    fn get_url_params(&self, ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        let mut params = ParamSlice::new();
        let values = self.active_values();
        if !values.is_empty() {
            let data: ParamSlice = values
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            params.insert(ctx.constants().filter_data_name.clone(), Value::Object(data));
        }
        Ok(params)
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        match event {
            GridEvent::FilterChanged { field, value } => {
                let input = self.input_mut(field)?;
                input.value = value.clone();
                // typing into a field reveals it
                if !input.enabled && !is_empty_value(value) {
                    self.show(field, false, ctx)?;
                }
                self.publish_label(field, ctx);
                ctx.request(GridRequest::RefreshData);
            }
            GridEvent::ShowFilter { field, focus } => {
                if self.show(field, *focus, ctx)? {
                    ctx.request(GridRequest::RefreshData);
                }
            }
            GridEvent::HideFilter { field } => {
                self.hide(field, ctx)?;
                self.publish_label(field, ctx);
                ctx.request(GridRequest::RefreshData);
            }
            GridEvent::ClearFilter { field } => {
                self.input_mut(field)?.value.clear();
                ctx.notify(GridNotification::WidgetClear {
                    field: field.clone(),
                    refresh: true,
                });
                self.publish_label(field, ctx);
                ctx.request(GridRequest::RefreshData);
            }
            _ => {}
        }
        Ok(())
    }
}
