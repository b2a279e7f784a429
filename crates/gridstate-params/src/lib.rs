//! URL parameter codec for grid view state.
//!
//! Every grid on a page persists its reloadable state (filters, columns,
//! selection, paging) inside one JSON object stored in a single query
//! parameter. This crate owns that object and its string form; it performs no
//! I/O and never fails on decode.

mod codec;
mod tree;

pub use codec::{
    DEFAULT_PARAM_NAME, DEFAULT_VIEW_PARAM_NAME, ParamCodec, encode_uri_component, query_value,
};
pub use tree::{ParamSlice, ParameterTree};
