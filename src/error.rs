use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("module '{module}' failed during {action}: {message}")]
    Module {
        module: String,
        action: &'static str,
        message: String,
    },

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("row '{0}' not found on the loaded page")]
    RowNotFound(String),

    #[error("filter field '{0}' not found")]
    FilterFieldNotFound(String),

    #[error("saved view '{0}' not found")]
    ViewNotFound(String),

    #[error("invalid sort direction '{0}'")]
    InvalidSortDir(String),

    #[error("invalid transport '{0}'")]
    InvalidTransport(String),

    #[error("invalid log format '{0}'")]
    InvalidLogFormat(String),

    #[error("grid is not built yet")]
    NotBuilt,

    #[error("{endpoint} endpoint is not configured")]
    EndpointMissing { endpoint: &'static str },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GridError>;
