//! Row click opens the object's detail page.

use super::{DETAIL_VIEW_MODULE, FeatureModule, ModuleContext};
use crate::error::Result;
use crate::events::{ClickTarget, GridEvent, GridRequest};

#[derive(Debug, Default)]
pub struct DetailViewModule;

impl DetailViewModule {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureModule for DetailViewModule {
    fn name(&self) -> &str {
        DETAIL_VIEW_MODULE
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        // the orchestrator builds the url, it owns the full parameter tree
        if let GridEvent::RowClicked {
            row_id,
            target: ClickTarget::Cell,
        } = event
            && ctx.config.table_detail_url.is_some()
        {
            ctx.request(GridRequest::OpenDetail {
                row_id: row_id.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::modules::test_support::Harness;
    use crate::types::RowId;

    fn click(target: ClickTarget) -> GridEvent {
        GridEvent::RowClicked {
            row_id: RowId::Int(7),
            target,
        }
    }

    #[test]
    fn test_cell_click_opens_detail() {
        let mut config = GridConfig::new("orders", "/data/");
        config.table_detail_url = Some("/orders/-1/change/".into());
        let mut module = DetailViewModule::new();
        let mut harness = Harness::new(&config);
        harness.apply(|ctx| module.handle_event(&click(ClickTarget::Cell), ctx));
        assert_eq!(
            harness.requests,
            vec![GridRequest::OpenDetail {
                row_id: RowId::Int(7)
            }]
        );
    }

    #[test]
    fn test_checkbox_and_prevented_clicks_ignored() {
        let mut config = GridConfig::new("orders", "/data/");
        config.table_detail_url = Some("/orders/-1/change/".into());
        let mut module = DetailViewModule::new();
        let mut harness = Harness::new(&config);
        harness.apply(|ctx| module.handle_event(&click(ClickTarget::SelectionCheckbox), ctx));
        harness.apply(|ctx| module.handle_event(&click(ClickTarget::PreventClick), ctx));
        assert!(harness.requests.is_empty());
    }

    #[test]
    fn test_no_detail_url_no_navigation() {
        let config = GridConfig::new("orders", "/data/");
        let mut module = DetailViewModule::new();
        let mut harness = Harness::new(&config);
        harness.apply(|ctx| module.handle_event(&click(ClickTarget::Cell), ctx));
        assert!(harness.requests.is_empty());
    }
}
