use gridstate_params::ParamCodec;
use serde_json::Value;

use super::print_json;
use crate::error::{GridError, Result};

/// Print the tree encoded in `url`, or one view's slice of it.
pub fn cmd_decode(url: &str, view: Option<&str>, param: &str) -> Result<()> {
    let tree = ParamCodec::new(param).decode(url);
    match view {
        Some(view_id) => {
            let slice = tree
                .view(view_id)
                .cloned()
                .ok_or_else(|| GridError::Other(format!("no parameters for view '{view_id}'")))?;
            print_json(&Value::Object(slice))
        }
        None => print_json(&tree.into_value()),
    }
}
