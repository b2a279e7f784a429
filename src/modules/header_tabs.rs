//! Filter-type tabs in the grid header.
//!
//! The active tab is stored as an ordinary filter value under the
//! selected-filter-type key, so it round-trips through the URL with the rest
//! of the filter form. Only the active tab's inputs take part in a refresh.

use serde_json::Value;

use super::{FeatureModule, HEADER_TABS_MODULE, ModuleContext};
use crate::error::Result;
use crate::events::{GridEvent, GridNotification, GridRequest};

pub const SAVED_VIEWS_TAB: &str = "tab_saved_views";
pub const ADVANCED_FILTERS_TAB: &str = "tab_advanced_filters";

/// Query-string marker set after a view was saved; shows the saved-views tab.
const TAB_CREATED_MARKER: &str = "tabCreated";

#[derive(Debug, Default)]
pub struct HeaderTabsModule {
    active: Option<String>,
}

impl HeaderTabsModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn store_active(&mut self, tab_id: &str, ctx: &mut ModuleContext<'_>) {
        self.active = Some(tab_id.to_string());
        ctx.request(GridRequest::SetFilterValue {
            field: ctx.constants().table_params_selected_filter_type.clone(),
            value: tab_id.to_string(),
        });
    }
}

impl FeatureModule for HeaderTabsModule {
    fn name(&self) -> &str {
        HEADER_TABS_MODULE
    }

    fn load_from_url(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let c = ctx.constants();
        self.active = ctx
            .url_object(&c.filter_data_name)
            .and_then(|filters| filters.get(&c.table_params_selected_filter_type))
            .and_then(Value::as_str)
            .filter(|tab| !tab.is_empty())
            .map(str::to_string);
        Ok(())
    }

    fn load_from_url_after_init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let Some(first) = ctx.config.header_tabs.first() else {
            return Ok(());
        };
        let tab_id = match &self.active {
            Some(active) => active.clone(),
            None => {
                let first = first.id.clone();
                self.store_active(&first, ctx);
                first
            }
        };
        ctx.notify(GridNotification::TabActivated { tab_id });

        if ctx.search.contains(TAB_CREATED_MARKER) {
            ctx.notify(GridNotification::TabActivated {
                tab_id: SAVED_VIEWS_TAB.to_string(),
            });
        }
        Ok(())
    }

    fn before_refresh_table_data_if_not_url_load(
        &mut self,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<()> {
        let active = self.active.as_deref();
        let inactive: Vec<String> = ctx
            .config
            .filter_fields
            .iter()
            .filter(|f| f.tab.is_some() && f.tab.as_deref() != active)
            .map(|f| f.name.clone())
            .collect();
        if !inactive.is_empty() {
            ctx.request(GridRequest::ClearFilterFields { fields: inactive });
        }
        if active != Some(ADVANCED_FILTERS_TAB) {
            ctx.request(GridRequest::ResetAdvancedFilter);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        if let GridEvent::TabShown { tab_id } = event
            && tab_id != SAVED_VIEWS_TAB
        {
            self.store_active(tab_id, ctx);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilterFieldSpec, GridConfig, HeaderTabSpec};
    use crate::modules::test_support::Harness;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> GridConfig {
        let mut config = GridConfig::new("orders", "/data/");
        config.header_tabs = vec![
            HeaderTabSpec {
                id: "tab_simple".into(),
                label: "Filters".into(),
            },
            HeaderTabSpec {
                id: ADVANCED_FILTERS_TAB.into(),
                label: "Advanced".into(),
            },
            HeaderTabSpec {
                id: SAVED_VIEWS_TAB.into(),
                label: "Views".into(),
            },
        ];
        config.filter_fields = vec![
            FilterFieldSpec::new("name").in_tab("tab_simple"),
            FilterFieldSpec::new("status").in_tab("tab_other"),
            FilterFieldSpec::new("global"),
        ];
        config
    }

    #[test]
    fn test_first_tab_activated_by_default() {
        let config = config();
        let mut module = HeaderTabsModule::new();
        let mut harness = Harness::new(&config);
        harness.apply(|ctx| module.load_from_url(ctx));
        harness.apply(|ctx| module.load_from_url_after_init(ctx));
        assert_eq!(module.active_tab(), Some("tab_simple"));
        assert_eq!(
            harness.requests,
            vec![GridRequest::SetFilterValue {
                field: "selected_filter_type".into(),
                value: "tab_simple".into()
            }]
        );
        assert_eq!(
            harness.notifications,
            vec![GridNotification::TabActivated {
                tab_id: "tab_simple".into()
            }]
        );
    }

    #[test]
    fn test_stored_tab_restored_and_tab_created_marker() {
        let config = config();
        let mut module = HeaderTabsModule::new();
        let mut harness = Harness::new(&config)
            .with_view_params(json!({"filterData": {"selected_filter_type": ADVANCED_FILTERS_TAB}}))
            .with_search("?tabCreated=1");
        harness.apply(|ctx| module.load_from_url(ctx));
        harness.apply(|ctx| module.load_from_url_after_init(ctx));
        assert!(harness.requests.is_empty());
        assert_eq!(
            harness.notifications,
            vec![
                GridNotification::TabActivated {
                    tab_id: ADVANCED_FILTERS_TAB.into()
                },
                GridNotification::TabActivated {
                    tab_id: SAVED_VIEWS_TAB.into()
                },
            ]
        );
    }

    #[test]
    fn test_saved_views_tab_is_not_stored() {
        let config = config();
        let mut module = HeaderTabsModule::new();
        let mut harness = Harness::new(&config);
        harness.apply(|ctx| {
            module.handle_event(
                &GridEvent::TabShown {
                    tab_id: SAVED_VIEWS_TAB.into(),
                },
                ctx,
            )
        });
        assert!(harness.requests.is_empty());
        assert_eq!(module.active_tab(), None);
    }

    #[test]
    fn test_refresh_clears_inactive_tabs() {
        let config = config();
        let mut module = HeaderTabsModule::new();
        let mut harness = Harness::new(&config);
        harness.apply(|ctx| {
            module.handle_event(
                &GridEvent::TabShown {
                    tab_id: "tab_simple".into(),
                },
                ctx,
            )
        });
        harness.requests.clear();
        harness.apply(|ctx| module.before_refresh_table_data_if_not_url_load(ctx));
        assert_eq!(
            harness.requests,
            vec![
                GridRequest::ClearFilterFields {
                    fields: vec!["status".into()]
                },
                GridRequest::ResetAdvancedFilter,
            ]
        );
    }

    #[test]
    fn test_advanced_tab_keeps_rules() {
        let config = config();
        let mut module = HeaderTabsModule::new();
        let mut harness = Harness::new(&config);
        harness.apply(|ctx| {
            module.handle_event(
                &GridEvent::TabShown {
                    tab_id: ADVANCED_FILTERS_TAB.into(),
                },
                ctx,
            )
        });
        harness.requests.clear();
        harness.apply(|ctx| module.before_refresh_table_data_if_not_url_load(ctx));
        assert!(!harness.requests.contains(&GridRequest::ResetAdvancedFilter));
    }
}
