use crate::domain::model::Product;
use crate::utils::error::{MarkError, Result};
use serde_json::Value;

/// Parses a caller-supplied JSON array of products.
pub fn parse_products(json: &str) -> Result<Vec<Product>> {
    let items = parse_array(json, "products")?;

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Product>(item)
                .map_err(|e| MarkError::parse(format!("product #{}: {}", index + 1, e)))
        })
        .collect()
}

/// Parses a JSON array of codes. Elements stay raw so non-strings can be counted as skips.
pub fn parse_code_list(json: &str) -> Result<Vec<Value>> {
    parse_array(json, "codes")
}

fn parse_array(json: &str, what: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(json.trim())
        .map_err(|e| MarkError::parse(format!("{} are not valid JSON: {}", what, e)))?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(MarkError::validation(format!(
            "{} must be a JSON array, got {}",
            what,
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
