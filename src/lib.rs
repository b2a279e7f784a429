pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod grid;
pub mod history;
pub mod logging;
pub mod macros;
pub mod modules;
pub mod orchestrator;
pub mod types;

pub use backend::{GridBackend, HttpBackend, MemoryBackend, PageRequest, PageResponse};
pub use config::{Constants, GridConfig, Transport};
pub use debounce::InputDebouncer;
pub use error::{GridError, Result};
pub use events::{GridEvent, GridNotification, GridRequest};
pub use gridstate_params::{ParamCodec, ParameterTree};
pub use history::{Location, MemoryHistory, UrlHistory};
pub use modules::{FeatureModule, GridModule, ModuleRegistry, SelectionModel};
pub use orchestrator::{GridOrchestrator, GridPhase};
pub use types::{ColumnSpec, ParamSlice, Row, RowId, SortDir, SortSpec, TableState};
