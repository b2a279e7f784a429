//! Feature modules and the lifecycle protocol they share.
//!
//! Every piece of grid behaviour (filters, column display, selection, paging,
//! row moves, saved views, ...) is a module implementing [`FeatureModule`].
//! Modules own one slice of the parameter tree and never talk to each other;
//! they read the grid through a [`ModuleContext`] and ask the orchestrator for
//! cross-cutting effects with [`GridRequest`]s.

pub mod advanced_filter;
pub mod broadcast;
pub mod column_display;
pub mod data_edit;
pub mod detail_view;
pub mod filter;
pub mod full_text_search;
pub mod header_tabs;
pub mod row_move;
pub mod saved_views;
pub mod selection;
pub mod table_params;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::BTreeMap;

use enum_dispatch::enum_dispatch;

use crate::config::{Constants, GridConfig};
use crate::error::{GridError, Result};
use crate::events::{GridEvent, GridNotification, GridRequest};
use crate::grid::{GridModel, GridOptions};
use crate::types::{ColumnSpec, ParamSlice, TableState};

pub use advanced_filter::AdvancedFilterModule;
pub use broadcast::{Merge, ModuleSet};
pub use column_display::ColumnDisplayModule;
pub use data_edit::DataEditModule;
pub use detail_view::DetailViewModule;
pub use filter::FilterModule;
pub use full_text_search::FullTextSearchModule;
pub use header_tabs::HeaderTabsModule;
pub use row_move::RowMoveModule;
pub use saved_views::SavedViewsModule;
pub use selection::{SelectionModel, SelectionModule};
pub use table_params::TableParamsModule;

/// Registry names of the built-in modules.
pub const FILTER_MODULE: &str = "filterModule";
pub const ADVANCED_FILTER_MODULE: &str = "advancedFilterModule";
pub const COLUMN_DISPLAY_MODULE: &str = "columnDisplayModule";
pub const SELECTION_MODULE: &str = "selectionModule";
pub const TABLE_PARAMS_MODULE: &str = "tableParamsModule";
pub const ROW_MOVE_MODULE: &str = "movableColumnsModule";
pub const ROW_MOVE_MODULE_ALIAS: &str = "rowMoveModule";
pub const SAVED_VIEWS_MODULE: &str = "viewsModule";
pub const HEADER_TABS_MODULE: &str = "headerTabsModule";
pub const DATA_EDIT_MODULE: &str = "dataEditModule";
pub const DETAIL_VIEW_MODULE: &str = "detailViewModule";
pub const FULL_TEXT_SEARCH_MODULE: &str = "fullTextSearchModule";

/// Column layout and table state the grid starts from, before the URL applies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridDefaults {
    /// Every column including module-contributed leading columns.
    pub columns: Vec<ColumnSpec>,
    pub table: TableState,
}

impl GridDefaults {
    pub fn column_order(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.field.clone()).collect()
    }

    pub fn column(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }
}

/// Everything a module may see or touch during one lifecycle call.
pub struct ModuleContext<'a> {
    pub config: &'a GridConfig,
    pub defaults: &'a GridDefaults,
    pub grid: &'a mut GridModel,
    /// This grid's slice of the parameter tree in the current URL.
    pub view_params: &'a ParamSlice,
    /// Raw query string of the current location, including `?`.
    pub search: &'a str,
    /// Paging and sorting of the most recent data request.
    pub last_table_params: Option<&'a TableState>,
    /// Aggregate save-parameters; filled for `load_from_url_after_init` and
    /// `after_url_state_update`, empty otherwise.
    pub state_for_save: &'a ParamSlice,
    pub is_url_load: bool,
    pub requests: &'a mut Vec<GridRequest>,
    pub notifications: &'a mut Vec<GridNotification>,
}

impl ModuleContext<'_> {
    pub fn constants(&self) -> &Constants {
        &self.config.constants
    }

    pub fn request(&mut self, request: GridRequest) {
        self.requests.push(request);
    }

    pub fn notify(&mut self, notification: GridNotification) {
        self.notifications.push(notification);
    }

    /// The sub-object stored under `key` in this grid's URL slice, if any.
    pub fn url_object(&self, key: &str) -> Option<&ParamSlice> {
        self.view_params.get(key).and_then(|v| v.as_object())
    }
}

/// Lifecycle contract of a grid feature module. Every hook is a no-op by default.
#[enum_dispatch]
pub trait FeatureModule {
    /// Registry name, used in logs.
    fn name(&self) -> &str;

    /// Modules run in descending priority; earlier modules win key conflicts.
    fn priority(&self) -> i32 {
        0
    }

    /// Apply this module's URL slice. The grid may not be built yet.
    fn load_from_url(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Apply URL state that needs the built grid.
    fn load_from_url_after_init(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called exactly once, after the first URL load on the built grid.
    fn after_init(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Columns to put in front of the configured columns.
    fn before_default_columns(&self, _config: &GridConfig) -> Result<Vec<ColumnSpec>> {
        Ok(Vec::new())
    }

    fn requires_header(&self) -> Result<bool> {
        Ok(false)
    }

    /// Contribution to the outgoing parameter slice. Omitted keys mean defaults.
    fn get_url_params(&self, _ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        Ok(ParamSlice::new())
    }

    /// Like [`FeatureModule::get_url_params`], minus non-reproducible state.
    fn get_url_params_for_save(&self, ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        self.get_url_params(ctx)
    }

    fn modify_grid_options(&self, options: GridOptions) -> Result<GridOptions> {
        Ok(options)
    }

    fn after_url_state_update(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<()> {
        Ok(())
    }

    fn before_refresh_table_data_if_not_url_load(
        &mut self,
        _ctx: &mut ModuleContext<'_>,
    ) -> Result<()> {
        Ok(())
    }

    /// A page of data has been loaded into the grid.
    fn on_data_processed(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<()> {
        Ok(())
    }

    fn handle_event(&mut self, _event: &GridEvent, _ctx: &mut ModuleContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// A host-provided module outside the built-in set.
pub struct CustomModule(Box<dyn FeatureModule + Send>);

impl CustomModule {
    pub fn new(module: impl FeatureModule + Send + 'static) -> Self {
        Self(Box::new(module))
    }
}

impl FeatureModule for CustomModule {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn priority(&self) -> i32 {
        self.0.priority()
    }

    fn load_from_url(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.0.load_from_url(ctx)
    }

    fn load_from_url_after_init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.0.load_from_url_after_init(ctx)
    }

    fn after_init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.0.after_init(ctx)
    }

    fn before_default_columns(&self, config: &GridConfig) -> Result<Vec<ColumnSpec>> {
        self.0.before_default_columns(config)
    }

    fn requires_header(&self) -> Result<bool> {
        self.0.requires_header()
    }

    fn get_url_params(&self, ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        self.0.get_url_params(ctx)
    }

    fn get_url_params_for_save(&self, ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        self.0.get_url_params_for_save(ctx)
    }

    fn modify_grid_options(&self, options: GridOptions) -> Result<GridOptions> {
        self.0.modify_grid_options(options)
    }

    fn after_url_state_update(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.0.after_url_state_update(ctx)
    }

    fn before_refresh_table_data_if_not_url_load(
        &mut self,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<()> {
        self.0.before_refresh_table_data_if_not_url_load(ctx)
    }

    fn on_data_processed(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.0.on_data_processed(ctx)
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self.0.handle_event(event, ctx)
    }
}

#[enum_dispatch(FeatureModule)]
pub enum GridModule {
    Filter(FilterModule),
    AdvancedFilter(AdvancedFilterModule),
    ColumnDisplay(ColumnDisplayModule),
    Selection(SelectionModule),
    TableParams(TableParamsModule),
    RowMove(RowMoveModule),
    SavedViews(SavedViewsModule),
    HeaderTabs(HeaderTabsModule),
    DataEdit(DataEditModule),
    DetailView(DetailViewModule),
    FullTextSearch(FullTextSearchModule),
    Custom(CustomModule),
}

pub type ModuleFactory = Box<dyn Fn(&GridConfig) -> GridModule + Send + Sync>;

/// Module names mapped to factories, scoped to the orchestrators built from it.
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl ModuleRegistry {
    /// A registry with no modules at all.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding every built-in module under its standard name.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(FILTER_MODULE, |c| FilterModule::new(c).into());
        registry.register(ADVANCED_FILTER_MODULE, |c| AdvancedFilterModule::new(c).into());
        registry.register(COLUMN_DISPLAY_MODULE, |_| ColumnDisplayModule::new().into());
        registry.register(SELECTION_MODULE, |_| SelectionModule::new().into());
        registry.register(TABLE_PARAMS_MODULE, |_| TableParamsModule::new().into());
        registry.register(ROW_MOVE_MODULE, |_| RowMoveModule::new().into());
        registry.register(ROW_MOVE_MODULE_ALIAS, |_| RowMoveModule::new().into());
        registry.register(SAVED_VIEWS_MODULE, |c| SavedViewsModule::new(c).into());
        registry.register(HEADER_TABS_MODULE, |_| HeaderTabsModule::new().into());
        registry.register(DATA_EDIT_MODULE, |_| DataEditModule::new().into());
        registry.register(DETAIL_VIEW_MODULE, |_| DetailViewModule::new().into());
        registry.register(FULL_TEXT_SEARCH_MODULE, |_| FullTextSearchModule::new().into());
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&GridConfig) -> GridModule + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the configured modules, in configuration order.
    pub fn instantiate(&self, config: &GridConfig) -> Result<ModuleSet> {
        let modules = config
            .modules
            .iter()
            .map(|name| {
                self.factories
                    .get(name)
                    .map(|factory| factory(config))
                    .ok_or_else(|| GridError::UnknownModule(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ModuleSet::new(modules))
    }
}
