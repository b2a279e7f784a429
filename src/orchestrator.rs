//! The grid orchestrator.
//!
//! Owns the grid model, the module set and the URL history, and drives the
//! lifecycle: load state from the URL, build the grid, fetch pages, write the
//! state back to the URL after every interaction. Modules only ever see the
//! grid through a [`ModuleContext`] built here; their requests are executed
//! here once the broadcast that produced them has finished.
//!
//! The `is_url_load` guard is set while state is being reconciled from the
//! URL and cleared by [`GridOrchestrator::update_url_state`]. While it is set
//! no history entry is pushed and non-URL refreshes are skipped.

use std::mem;

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use gridstate_params::{ParamCodec, ParameterTree, encode_uri_component};

use crate::backend::{
    CellEditNotice, GridBackend, ListActionResponse, PageRequest, PageResponse, RowMoveNotice,
};
use crate::config::{GridConfig, Transport};
use crate::error::{GridError, Result};
use crate::events::{GridEvent, GridNotification, GridRequest, ReplacedRow};
use crate::grid::{GridModel, GridOptions};
use crate::history::UrlHistory;
use crate::modules::{
    FeatureModule, GridDefaults, GridModule, ModuleContext, ModuleRegistry, ModuleSet,
    SavedViewsModule, SelectionModel,
};
use crate::types::{ParamSlice, RowId, TableState};

/// Query parameter carrying the list state into a detail page.
const CHANGELIST_FILTERS_PARAM: &str = "_changelist_filters";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPhase {
    Uninitialized,
    LoadingFromUrl,
    Built,
    Ready,
}

/// JavaScript truthiness of a filter value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub struct GridOrchestrator<B: GridBackend, H: UrlHistory> {
    config: GridConfig,
    codec: ParamCodec,
    modules: ModuleSet,
    defaults: GridDefaults,
    grid: GridModel,
    backend: B,
    history: H,
    phase: GridPhase,
    is_url_load: bool,
    after_init_done: bool,
    last_table_params: Option<TableState>,
    generation: u64,
    requests: Vec<GridRequest>,
    notifications: Vec<GridNotification>,
}

impl<B: GridBackend, H: UrlHistory> GridOrchestrator<B, H> {
    /// Instantiate the configured modules and lay out the grid's columns.
    /// Nothing is loaded or fetched until [`GridOrchestrator::init`].
    pub fn new(config: GridConfig, registry: &ModuleRegistry, backend: B, history: H) -> Result<Self> {
        config.validate()?;
        let modules = registry.instantiate(&config)?;

        let mut columns = modules.leading_columns(&config);
        columns.extend(config.table_columns.iter().cloned());
        let columns = columns
            .iter()
            .map(|c| c.with_defaults(&config.default_column_data))
            .collect::<Result<Vec<_>>>()?;

        let table = TableState {
            page: config.table_initial_page,
            size: config.table_initial_page_size,
            sort: config.table_initial_sort.clone(),
        };
        let grid = GridModel::new(columns.clone(), &config.table_id_column_name, table.clone());
        let codec = ParamCodec::new(config.constants.base_params_name.as_str())
            .with_view_param(config.constants.selected_view_name.as_str());

        debug!(view = %config.view_id, modules = ?modules.names(), "grid orchestrator created");

        Ok(Self {
            codec,
            modules,
            defaults: GridDefaults { columns, table },
            grid,
            backend,
            history,
            phase: GridPhase::Uninitialized,
            is_url_load: false,
            after_init_done: false,
            last_table_params: None,
            generation: 0,
            requests: Vec::new(),
            notifications: Vec::new(),
            config,
        })
    }

    // Accessors

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn phase(&self) -> GridPhase {
        self.phase
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Mutable history, for hosts driving back/forward navigation.
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.names()
    }

    pub fn selection(&self) -> Option<&SelectionModel> {
        self.modules.selection().map(|s| s.model())
    }

    pub fn saved_views(&self) -> Option<&SavedViewsModule> {
        self.modules.saved_views()
    }

    pub fn is_url_load(&self) -> bool {
        self.is_url_load
    }

    /// Take every notification emitted since the last drain.
    pub fn drain_notifications(&mut self) -> Vec<GridNotification> {
        mem::take(&mut self.notifications)
    }

    // Lifecycle

    /// Load state from the current URL, build the grid and fetch the first page.
    pub async fn init(&mut self) -> Result<()> {
        if self.phase != GridPhase::Uninitialized {
            return Err(GridError::Other("grid is already initialized".to_string()));
        }
        self.phase = GridPhase::LoadingFromUrl;
        self.is_url_load = true;
        self.broadcast("load_from_url", &ParamSlice::new(), |m, ctx| m.load_from_url(ctx));
        self.apply_local_requests();

        let visible = self.modules.query("requires_header", |m| m.requires_header());
        self.notifications
            .push(GridNotification::HeaderVisibility { visible });

        let options = self.modules.fold_options(GridOptions {
            movable_rows: false,
            extra: self.config.grid_options.clone(),
        });
        self.grid.build(options);
        self.phase = GridPhase::Built;
        debug!(view = %self.config.view_id, "grid built");

        self.load_from_url_after_init();
        if !self.after_init_done {
            self.after_init_done = true;
            self.broadcast("after_init", &ParamSlice::new(), |m, ctx| m.after_init(ctx));
        }
        self.apply_local_requests();

        self.grid.take_fetch_pending();
        self.fetch_once().await?;
        self.phase = GridPhase::Ready;
        self.settle().await
    }

    /// Re-apply the current URL to every module and replace the grid's data.
    pub async fn load_from_url(&mut self) -> Result<()> {
        self.reload_from_url().await?;
        self.settle().await
    }

    /// Feed one user interaction or external signal into the engine.
    pub async fn dispatch(&mut self, event: GridEvent) -> Result<()> {
        if self.phase == GridPhase::Uninitialized {
            return Err(GridError::NotBuilt);
        }
        match event {
            GridEvent::PopState => self.reload_from_url().await?,
            GridEvent::ExternalInvalidate => self.requests.push(GridRequest::RefreshData),
            GridEvent::UpdateRowData { rows } => {
                let updated = self.grid.update_rows(rows);
                debug!(updated, "row data updated");
            }
            event => {
                self.broadcast("handle_event", &ParamSlice::new(), |m, ctx| {
                    m.handle_event(&event, ctx)
                });
            }
        }
        self.settle().await
    }

    /// Refetch after a non-URL state change; a no-op during a URL-driven load.
    pub async fn refresh_table_data_if_not_url_load(&mut self) -> Result<()> {
        self.refresh().await?;
        self.settle().await
    }

    /// Write the current state to the URL and tell modules about it.
    ///
    /// Pushes a history entry only outside URL-driven loads and only when
    /// history integration is enabled. Always clears the URL-load guard.
    pub fn update_url_state(&mut self) {
        if !self.is_url_load {
            let search = self.url_params_string();
            if self.config.history_enabled() {
                let url = format!("{}{}", self.config.base_view_url, search);
                debug!(url = %url, "pushing history entry");
                self.history.push_state(&url);
            }
            self.notifications
                .push(GridNotification::StateChanged { search });
        }
        let state_for_save = self.url_params_for_save();
        self.broadcast("after_url_state_update", &state_for_save, |m, ctx| {
            m.after_url_state_update(ctx)
        });
        self.is_url_load = false;
    }

    // Parameters

    /// This grid's aggregate URL parameters.
    pub fn url_params(&mut self) -> ParamSlice {
        self.collect_params(false)
    }

    /// Aggregate parameters minus state that should not be saved in a view.
    pub fn url_params_for_save(&mut self) -> ParamSlice {
        self.collect_params(true)
    }

    /// The full URL tree with this grid's slice replaced by its current state.
    /// Other grids' slices on the same page are kept as they are.
    pub fn url_tree(&mut self) -> ParameterTree {
        let params = self.url_params();
        let mut tree = self.decode_tree(&self.history.location().search);
        tree.set_view(self.config.view_id.clone(), params);
        tree
    }

    /// `?<params>=<encoded tree>` for the current state.
    pub fn url_params_string(&mut self) -> String {
        let tree = self.url_tree();
        self.codec.encode(&tree)
    }

    /// Whether any simple filter holds a value.
    pub fn is_filtered(&mut self) -> bool {
        let params = self.url_params();
        let c = &self.config.constants;
        params
            .get(&c.filter_data_name)
            .and_then(Value::as_object)
            .is_some_and(|filters| {
                filters
                    .iter()
                    .any(|(field, value)| *field != c.table_params_selected_filter_type && is_truthy(value))
            })
    }

    // Fetching

    /// Start a data fetch: bump the generation, sync the URL and build the request.
    ///
    /// The returned generation must be handed back to
    /// [`GridOrchestrator::complete_fetch`] with the response.
    pub fn begin_fetch(&mut self) -> (u64, PageRequest) {
        self.generation += 1;
        self.last_table_params = Some(self.grid.table_state());
        self.update_url_state();
        let table = self.grid.table_state();
        let params = self.url_params();
        (self.generation, self.page_request(params, table))
    }

    /// Apply a fetched page. Responses to superseded fetches are discarded.
    pub fn complete_fetch(&mut self, generation: u64, result: Result<PageResponse>) -> Result<()> {
        if generation != self.generation {
            warn!(generation, latest = self.generation, "discarding stale page response");
            return Ok(());
        }
        let outcome = match result {
            Ok(page) => {
                let total = page.row_count();
                self.grid.replace_data(page.data, page.last_page, total);
                debug!(rows = self.grid.data_count(), total, page = self.grid.page(), "page loaded");
                self.broadcast("on_data_processed", &ParamSlice::new(), |m, ctx| {
                    m.on_data_processed(ctx)
                });
                self.apply_local_requests();
                let is_filtered = self.is_filtered();
                self.notifications.push(GridNotification::DataProcessed {
                    rows: self.grid.data_count(),
                    is_filtered,
                });
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "page fetch failed");
                self.notifications.push(GridNotification::DataLoadFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        };
        if self.grid.is_height_frozen() {
            self.grid.restore_height();
            self.notifications.push(GridNotification::HeightRestored);
        }
        outcome
    }

    /// Run a bulk list action against the current state.
    ///
    /// GET grids navigate to `url` with the state appended. POST grids send
    /// the state as the JSON body; redirects and notifications are turned into
    /// notifications and the response is returned so callers can save downloads.
    pub async fn execute_list_action(
        &mut self,
        url: &str,
        suppress_params: bool,
        new_tab: bool,
    ) -> Result<Option<ListActionResponse>> {
        let tree = self.url_tree();
        match self.config.transport {
            Transport::Get => {
                let url = if suppress_params {
                    url.to_string()
                } else if url.contains('?') {
                    format!("{url}&{}", self.codec.encode_pair(&tree))
                } else {
                    format!("{url}{}", self.codec.encode(&tree))
                };
                self.notifications
                    .push(GridNotification::Navigate { url, new_tab });
                Ok(None)
            }
            Transport::Post => {
                let response = match self.backend.list_action(url, &tree.into_value()).await {
                    Ok(response) => response,
                    Err(e) => {
                        error!(url, error = %e, "list action failed");
                        self.notifications.push(GridNotification::RequestFailed {
                            action: "list action",
                            message: e.to_string(),
                        });
                        return Err(e);
                    }
                };
                match &response {
                    ListActionResponse::Redirect { url } => {
                        self.notifications.push(GridNotification::Navigate {
                            url: url.clone(),
                            new_tab: false,
                        });
                    }
                    ListActionResponse::Notification { html } => {
                        self.notifications
                            .push(GridNotification::Notification { html: html.clone() });
                    }
                    ListActionResponse::Download { filename, bytes } => {
                        info!(filename = %filename, size = bytes.len(), "list action returned a download");
                    }
                }
                Ok(Some(response))
            }
        }
    }

    // Internals

    fn decode_tree(&self, search: &str) -> ParameterTree {
        let config = &self.config;
        self.codec.decode_with_views(search, &config.view_id, |id| {
            config
                .saved_view(id)
                .and_then(|view| serde_json::to_string(&view.params).ok())
        })
    }

    fn with_context<T>(
        &mut self,
        state_for_save: &ParamSlice,
        f: impl FnOnce(&mut ModuleSet, &mut ModuleContext<'_>) -> T,
    ) -> T {
        let location = self.history.location();
        let view_params = self
            .decode_tree(&location.search)
            .view_or_default(&self.config.view_id);
        let mut ctx = ModuleContext {
            config: &self.config,
            defaults: &self.defaults,
            grid: &mut self.grid,
            view_params: &view_params,
            search: &location.search,
            last_table_params: self.last_table_params.as_ref(),
            state_for_save,
            is_url_load: self.is_url_load,
            requests: &mut self.requests,
            notifications: &mut self.notifications,
        };
        f(&mut self.modules, &mut ctx)
    }

    fn broadcast<F>(&mut self, action: &'static str, state_for_save: &ParamSlice, mut f: F)
    where
        F: FnMut(&mut GridModule, &mut ModuleContext<'_>) -> Result<()>,
    {
        self.with_context(state_for_save, |modules, ctx| {
            modules.invoke(action, |m| f(m, ctx))
        })
    }

    fn collect_params(&mut self, for_save: bool) -> ParamSlice {
        self.with_context(&ParamSlice::new(), |modules, ctx| {
            let ctx = &*ctx;
            if for_save {
                modules.query("get_url_params_for_save", |m| m.get_url_params_for_save(ctx))
            } else {
                modules.query("get_url_params", |m| m.get_url_params(ctx))
            }
        })
    }

    fn load_from_url_after_init(&mut self) {
        let state_for_save = self.url_params_for_save();
        self.broadcast("load_from_url_after_init", &state_for_save, |m, ctx| {
            m.load_from_url_after_init(ctx)
        });
    }

    fn page_request(&mut self, params: ParamSlice, table: TableState) -> PageRequest {
        let mut tree = self.decode_tree(&self.history.location().search);
        tree.set_view(self.config.view_id.clone(), params.clone());
        let ajax_url = &self.config.table_ajax_url;
        let (url, body) = match self.config.transport {
            Transport::Get => (format!("{ajax_url}{}", self.codec.encode(&tree)), None),
            Transport::Post => (ajax_url.clone(), Some(tree.into_value())),
        };
        PageRequest {
            url,
            transport: self.config.transport,
            body,
            view_params: params,
            table,
        }
    }

    async fn fetch_once(&mut self) -> Result<()> {
        let (generation, request) = self.begin_fetch();
        debug!(generation, url = %request.url, "fetching page");
        let result = self.backend.fetch_page(&request).await;
        self.complete_fetch(generation, result)
    }

    async fn reload_from_url(&mut self) -> Result<()> {
        self.phase = GridPhase::LoadingFromUrl;
        self.is_url_load = true;
        debug!(search = %self.history.location().search, "loading state from url");
        self.broadcast("load_from_url", &ParamSlice::new(), |m, ctx| m.load_from_url(ctx));
        self.apply_local_requests();
        if self.grid.is_built() {
            self.load_from_url_after_init();
            self.apply_local_requests();
            self.grid.take_fetch_pending();
            self.fetch_once().await?;
            self.phase = GridPhase::Ready;
        }
        Ok(())
    }

    async fn refresh(&mut self) -> Result<()> {
        if self.is_url_load {
            debug!("skipping refresh during url load");
            return Ok(());
        }
        self.broadcast("before_refresh_table_data_if_not_url_load", &ParamSlice::new(), |m, ctx| {
            m.before_refresh_table_data_if_not_url_load(ctx)
        });
        self.apply_local_requests();

        let mut table = self.grid.table_state();
        table.page = 1;
        self.grid.restore_state(table);
        self.grid.take_fetch_pending();

        self.grid.freeze_height();
        self.notifications.push(GridNotification::HeightFrozen);
        self.fetch_once().await
    }

    /// Execute queued requests until none remain and no fetch is pending.
    async fn settle(&mut self) -> Result<()> {
        loop {
            if !self.requests.is_empty() {
                let request = self.requests.remove(0);
                self.apply_request(request).await?;
            } else if self.grid.take_fetch_pending() {
                self.fetch_once().await?;
            } else {
                return Ok(());
            }
        }
    }

    /// Apply queued requests that touch only in-process state, keeping the
    /// rest queued in order.
    fn apply_local_requests(&mut self) {
        let queued = mem::take(&mut self.requests);
        let mut remaining = Vec::new();
        for request in queued {
            if let Some(request) = self.apply_local(request) {
                remaining.push(request);
            }
        }
        remaining.append(&mut self.requests);
        self.requests = remaining;
    }

    /// Returns the request back if it needs the async path.
    fn apply_local(&mut self, request: GridRequest) -> Option<GridRequest> {
        match request {
            GridRequest::ClearFilterFields { fields } => {
                self.with_context(&ParamSlice::new(), |modules, ctx| {
                    if let Some(filter) = modules.filter_mut() {
                        filter.clear_fields(&fields, ctx);
                    }
                });
                None
            }
            GridRequest::ResetAdvancedFilter => {
                self.with_context(&ParamSlice::new(), |modules, ctx| {
                    if let Some(advanced) = modules.advanced_filter_mut() {
                        advanced.reset(ctx);
                    }
                });
                None
            }
            GridRequest::SetFilterValue { field, value } => {
                let result = self.with_context(&ParamSlice::new(), |modules, ctx| {
                    match modules.filter_mut() {
                        Some(filter) => filter.set_value(&field, &value, ctx),
                        None => Ok(()),
                    }
                });
                if let Err(e) = result {
                    warn!(field = %field, error = %e, "could not set filter value");
                }
                None
            }
            GridRequest::UpdateUrlState => {
                self.update_url_state();
                None
            }
            GridRequest::PushHistory { search } => {
                debug!(search = %search, "pushing history entry");
                let path = self.history.location().path;
                self.history.push_state(&format!("{path}{search}"));
                None
            }
            GridRequest::OpenDetail { row_id } => {
                self.open_detail(&row_id);
                None
            }
            other => Some(other),
        }
    }

    async fn apply_request(&mut self, request: GridRequest) -> Result<()> {
        let Some(request) = self.apply_local(request) else {
            return Ok(());
        };
        match request {
            GridRequest::RefreshData => self.refresh().await,
            GridRequest::LoadFromUrl => self.reload_from_url().await,
            GridRequest::NotifyRowMoved {
                current,
                replaced,
                page,
            } => {
                self.notify_row_moved(current, replaced, page).await;
                Ok(())
            }
            GridRequest::NotifyCellEdited {
                row_id,
                field,
                value,
                previous,
            } => {
                self.notify_cell_edited(row_id, field, value, previous).await;
                Ok(())
            }
            other => {
                warn!(request = ?other, "unhandled grid request");
                Ok(())
            }
        }
    }

    fn open_detail(&mut self, row_id: &RowId) {
        let Some(detail_url) = self.config.detail_url_for(&row_id.to_string()) else {
            warn!(row = %row_id, "detail url is not configured");
            return;
        };
        let tree = self.url_tree();
        let state = encode_uri_component(&self.codec.encode_pair(&tree));
        self.notifications.push(GridNotification::Navigate {
            url: format!("{detail_url}?{CHANGELIST_FILTERS_PARAM}={state}"),
            new_tab: false,
        });
    }

    /// Resolve the row a moved row now precedes into a server id.
    async fn resolve_follower(&mut self, replaced: ReplacedRow) -> Result<Option<RowId>> {
        match replaced {
            ReplacedRow::Row(id) => Ok(Some(id)),
            ReplacedRow::End => Ok(None),
            ReplacedRow::FirstOfPage(page) => {
                let mut params = self.url_params();
                let c = &self.config.constants;
                let table_params = params
                    .entry(c.table_params_name.clone())
                    .or_insert_with(|| json!({}));
                if let Value::Object(map) = table_params {
                    map.insert(c.table_params_page_name.clone(), json!(page));
                }
                let mut table = self.grid.table_state();
                table.page = page;
                let request = self.page_request(params, table);
                let response = self.backend.fetch_page(&request).await?;
                Ok(response
                    .data
                    .first()
                    .and_then(|row| RowId::of_row(row, &self.config.table_id_column_name)))
            }
        }
    }

    async fn notify_row_moved(&mut self, current: RowId, replaced: ReplacedRow, page: u32) {
        let result = match self.resolve_follower(replaced).await {
            Ok(replaced) => {
                let notice = RowMoveNotice {
                    current: current.clone(),
                    replaced,
                };
                self.backend.notify_row_moved(&notice).await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(reply) => info!(row = %current, reply = %reply, "row move acknowledged"),
            Err(e) => {
                error!(row = %current, error = %e, "row move rejected");
                self.notifications.push(GridNotification::RequestFailed {
                    action: "row move",
                    message: e.to_string(),
                });
                if self.config.revert_on_failure {
                    self.grid.set_page(page);
                }
            }
        }
    }

    async fn notify_cell_edited(
        &mut self,
        row_id: RowId,
        field: String,
        value: Value,
        previous: Option<Value>,
    ) {
        let notice = CellEditNotice {
            row_id: row_id.clone(),
            field: field.clone(),
            value,
        };
        match self.backend.notify_cell_edited(&notice).await {
            Ok(reply) => info!(row = %row_id, field = %field, reply = %reply, "cell edit acknowledged"),
            Err(e) => {
                error!(row = %row_id, field = %field, error = %e, "cell edit rejected");
                self.notifications.push(GridNotification::RequestFailed {
                    action: "cell edit",
                    message: e.to_string(),
                });
                if self.config.revert_on_failure
                    && let Err(e) = self
                        .grid
                        .update_cell(&row_id, &field, previous.unwrap_or(Value::Null))
                {
                    warn!(row = %row_id, error = %e, "could not revert cell edit");
                }
            }
        }
    }
}
