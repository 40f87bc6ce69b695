use crate::pipeline::ExtractionError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Accepts a bare array or an object wrapping the array under `key`, and
/// deserializes each element.
pub fn parse_collection<T: DeserializeOwned>(
    value: Value,
    key: &str,
    phase: &str,
) -> Result<Vec<T>, ExtractionError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ExtractionError::schema(
                    phase,
                    format!("\"{}\" must be an array, got {}", key, kind(&other)),
                ))
            }
            None => {
                return Err(ExtractionError::schema(
                    phase,
                    format!("expected an array or an object with \"{}\"", key),
                ))
            }
        },
        other => {
            return Err(ExtractionError::schema(
                phase,
                format!("expected an array, got {}", kind(&other)),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| {
                ExtractionError::schema(phase, format!("item {}: {}", index, e))
            })
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Requires a non-blank string field, returning it trimmed
pub fn required_name(value: &str, field: &str, index: usize, phase: &str) -> Result<String, ExtractionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::schema(
            phase,
            format!("item {}: \"{}\" must not be empty", index, field),
        ));
    }
    Ok(trimmed.to_string())
}
