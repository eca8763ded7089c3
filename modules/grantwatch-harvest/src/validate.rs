//! Schema gate between the model's untyped JSON and the typed pipeline.
//!
//! The model's output shape is never guaranteed, so each recovered element
//! is checked here before a `GrantRecord` is constructed. Only the minimal
//! contract is enforced: a JSON object with string `name` and `provider`.
//! Everything else is optional and defaulted downstream.

use serde_json::Value;

/// Validate one candidate element. Err carries a human-readable rejection
/// reason for the run summary.
pub fn validate(candidate: &Value) -> Result<(), String> {
    let obj = match candidate {
        Value::Object(obj) => obj,
        _ => return Err("not a JSON object".to_string()),
    };

    match obj.get("name") {
        None => return Err("missing name".to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(Value::String(_)) => return Err("name is empty".to_string()),
        Some(_) => return Err("name is not a string".to_string()),
    }

    match obj.get("provider") {
        None => return Err("missing provider".to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(Value::String(_)) => return Err("provider is empty".to_string()),
        Some(_) => return Err("provider is not a string".to_string()),
    }

    Ok(())
}
