//! Mirrors the full-text search term into the standalone search box.
//!
//! The term itself is an ordinary filter value and is persisted by the filter
//! module; this module only keeps the search input in sync on URL loads.

use serde_json::Value;

use super::{FULL_TEXT_SEARCH_MODULE, FeatureModule, ModuleContext};
use crate::error::Result;
use crate::events::GridNotification;

#[derive(Debug, Default)]
pub struct FullTextSearchModule;

impl FullTextSearchModule {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureModule for FullTextSearchModule {
    fn name(&self) -> &str {
        FULL_TEXT_SEARCH_MODULE
    }

    fn load_from_url(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let c = ctx.constants();
        let value = ctx
            .url_object(&c.filter_data_name)
            .and_then(|filters| filters.get(&c.table_params_full_text_search))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        ctx.notify(GridNotification::FullTextSearchValue { value });
        Ok(())
    }
}
