use gridstate_params::{ParamCodec, ParameterTree};
use serde_json::Value;

use crate::error::{GridError, Result};

/// The `?<param>=...` query string for a JSON tree.
pub fn encode_tree(json: &str, param: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json)?;
    if !value.is_object() {
        return Err(GridError::Other(
            "parameter tree must be a JSON object".to_string(),
        ));
    }
    Ok(ParamCodec::new(param).encode(&ParameterTree::from_value(value)))
}

pub fn cmd_encode(json: &str, param: &str) -> Result<()> {
    println!("{}", encode_tree(json, param)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_tree() {
        assert_eq!(
            encode_tree(r#"{"g":{}}"#, "params").unwrap(),
            "?params=%7B%22g%22%3A%7B%7D%7D"
        );
        assert!(encode_tree("[1]", "params").is_err());
        assert!(encode_tree("{", "params").is_err());
    }
}
