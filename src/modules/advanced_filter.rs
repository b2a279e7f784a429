//! Advanced filter backed by an external query builder.
//!
//! The rule tree (`{condition, rules: [...]}`, nested) is opaque apart from
//! empty-rule stripping: a tree without any real rule is the same as no
//! advanced filter and is never persisted.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use super::{ADVANCED_FILTER_MODULE, FeatureModule, ModuleContext};
use crate::config::{GridConfig, WidgetKind};
use crate::error::{GridError, Result};
use crate::events::{GridEvent, GridNotification, GridRequest, RuleWidgetMode};
use crate::types::ParamSlice;

/// The rule set a cleared query builder shows.
pub fn empty_rules() -> Value {
    json!({"condition": "AND", "rules": [{"empty": true}]})
}

/// Operators whose value is a `[from, to]` pair.
pub fn widget_mode(operator: Option<&str>) -> RuleWidgetMode {
    match operator {
        Some("between") | Some("not_between") => RuleWidgetMode::Range,
        _ => RuleWidgetMode::Single,
    }
}

/// Drop placeholder rules and empty groups. Returns `None` if nothing is left.
pub fn strip_empty_rules(tree: &Value) -> Option<Value> {
    let group = tree.as_object()?;
    let rules = group.get("rules")?.as_array()?;

    let kept: Vec<Value> = rules
        .iter()
        .filter_map(|rule| {
            if rule.get("rules").is_some() {
                strip_empty_rules(rule)
            } else if rule.get("empty").and_then(Value::as_bool) == Some(true)
                || rule.get("field").is_none()
            {
                None
            } else {
                Some(rule.clone())
            }
        })
        .collect();

    if kept.is_empty() {
        return None;
    }
    let mut group = group.clone();
    group.insert("rules".to_string(), Value::Array(kept));
    Some(Value::Object(group))
}

#[derive(Debug, Clone, PartialEq)]
struct RenderedRule {
    field: String,
    mode: RuleWidgetMode,
}

pub struct AdvancedFilterModule {
    rules: Option<Value>,
    widgets: BTreeMap<String, WidgetKind>,
    rendered: BTreeMap<String, RenderedRule>,
}

impl AdvancedFilterModule {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            rules: None,
            widgets: config
                .filter_fields
                .iter()
                .map(|f| (f.name.clone(), f.widget))
                .collect(),
            rendered: BTreeMap::new(),
        }
    }

    pub fn rules(&self) -> Option<&Value> {
        self.rules.as_ref()
    }

    fn publish_rules(&self, ctx: &mut ModuleContext<'_>) {
        ctx.notify(GridNotification::QueryBuilderRules {
            rules: self.rules.clone().unwrap_or_else(empty_rules),
        });
    }

    /// Return the query builder to its empty state.
    pub fn reset(&mut self, ctx: &mut ModuleContext<'_>) {
        self.rules = None;
        self.rendered.clear();
        self.publish_rules(ctx);
    }
}

impl FeatureModule for AdvancedFilterModule {
    fn name(&self) -> &str {
        ADVANCED_FILTER_MODULE
    }

    fn load_from_url(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let key = ctx.constants().advanced_filter_data_name.clone();
        self.rules = ctx.view_params.get(&key).and_then(strip_empty_rules);
        self.rendered.clear();
        self.publish_rules(ctx);
        Ok(())
    }

    fn get_url_params(&self, ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        let mut params = ParamSlice::new();
        if let Some(rules) = &self.rules {
            params.insert(ctx.constants().advanced_filter_data_name.clone(), rules.clone());
        }
        Ok(params)
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        match event {
            GridEvent::AdvancedFilterChanged { rules } => {
                self.rules = strip_empty_rules(rules);
            }
            GridEvent::AdvancedFilterExecuted => {
                ctx.request(GridRequest::RefreshData);
            }
            GridEvent::AdvancedRuleRendered {
                rule_id,
                field,
                operator,
            } => {
                let widget = self.widgets.get(field).copied().unwrap_or_default();
                let mode = widget_mode(operator.as_deref());
                self.rendered.insert(
                    rule_id.clone(),
                    RenderedRule {
                        field: field.clone(),
                        mode,
                    },
                );
                ctx.notify(GridNotification::RuleWidgetInit {
                    rule_id: rule_id.clone(),
                    widget,
                    mode,
                });
            }
            GridEvent::AdvancedOperatorChanged { rule_id, operator } => {
                let rule = self.rendered.get_mut(rule_id).ok_or_else(|| {
                    GridError::Other(format!("advanced filter rule '{rule_id}' is not rendered"))
                })?;
                let mode = widget_mode(Some(operator));
                if rule.mode != mode {
                    rule.mode = mode;
                    tracing::debug!(rule = %rule_id, field = %rule.field, ?mode, "rule widget mode changed");
                    ctx.notify(GridNotification::RuleWidgetMode {
                        rule_id: rule_id.clone(),
                        mode,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterFieldSpec;
    use crate::modules::test_support::Harness;

    fn config() -> GridConfig {
        let mut config = GridConfig::new("orders", "/data/");
        config.filter_fields =
            vec![FilterFieldSpec::new("created").with_widget(WidgetKind::Date)];
        config
    }

    #[test]
    fn test_strip_empty_rules() {
        assert_eq!(strip_empty_rules(&empty_rules()), None);
        assert_eq!(strip_empty_rules(&json!({})), None);

        let nested = json!({
            "condition": "OR",
            "rules": [
                {"condition": "AND", "rules": [{"empty": true}]},
                {"field": "status", "operator": "equal", "value": "open"}
            ]
        });
        assert_eq!(
            strip_empty_rules(&nested),
            Some(json!({
                "condition": "OR",
                "rules": [{"field": "status", "operator": "equal", "value": "open"}]
            }))
        );
    }

    #[test]
    fn test_empty_tree_not_persisted() {
        let config = config();
        let mut module = AdvancedFilterModule::new(&config);
        let mut harness = Harness::new(&config)
            .with_view_params(json!({"advancedFilterData": empty_rules()}));
        harness.apply(|ctx| module.load_from_url(ctx));
        assert!(module.rules().is_none());
        let params = harness.run(|ctx| module.get_url_params(ctx)).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_execute_requests_refresh() {
        let config = config();
        let mut module = AdvancedFilterModule::new(&config);
        let mut harness = Harness::new(&config);
        let rules = json!({"condition": "AND", "rules": [{"field": "created", "operator": "less", "value": "2024-01-01"}]});
        harness.apply(|ctx| {
            module.handle_event(&GridEvent::AdvancedFilterChanged { rules: rules.clone() }, ctx)
        });
        assert!(harness.requests.is_empty());
        harness.apply(|ctx| module.handle_event(&GridEvent::AdvancedFilterExecuted, ctx));
        assert_eq!(harness.requests, vec![GridRequest::RefreshData]);
        let params = harness.run(|ctx| module.get_url_params(ctx)).unwrap();
        assert_eq!(params["advancedFilterData"], rules);
    }

    #[test]
    fn test_rule_widget_follows_operator() {
        let config = config();
        let mut module = AdvancedFilterModule::new(&config);
        let mut harness = Harness::new(&config);
        harness.apply(|ctx| {
            module.handle_event(
                &GridEvent::AdvancedRuleRendered {
                    rule_id: "r1".into(),
                    field: "created".into(),
                    operator: Some("equal".into()),
                },
                ctx,
            )
        });
        harness.apply(|ctx| {
            module.handle_event(
                &GridEvent::AdvancedOperatorChanged {
                    rule_id: "r1".into(),
                    operator: "between".into(),
                },
                ctx,
            )
        });
        assert_eq!(
            harness.notifications,
            vec![
                GridNotification::RuleWidgetInit {
                    rule_id: "r1".into(),
                    widget: WidgetKind::Date,
                    mode: RuleWidgetMode::Single
                },
                GridNotification::RuleWidgetMode {
                    rule_id: "r1".into(),
                    mode: RuleWidgetMode::Range
                },
            ]
        );
    }

    #[test]
    fn test_reset_publishes_empty_rules() {
        let config = config();
        let mut module = AdvancedFilterModule::new(&config);
        let mut harness = Harness::new(&config);
        harness.run(|ctx| module.reset(ctx));
        assert_eq!(
            harness.notifications,
            vec![GridNotification::QueryBuilderRules { rules: empty_rules() }]
        );
    }
}
