use serde_json::{Map, Value};

/// Looks up a candidate key, following `.`-separated segments into nested
/// objects (`Customer.firstName`).
pub(crate) fn lookup<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Returns the first candidate whose value coerces to a finite number.
pub fn resolve_number(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| lookup(record, key))
        .find_map(coerce_number)
}

/// Returns the first candidate holding a string with non-blank content.
///
/// The matched value is returned untouched; callers that care about padding
/// normalize it themselves.
pub fn resolve_string(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(record, key))
        .find_map(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        })
}

/// Returns the first candidate that reads as a boolean flag.
pub fn resolve_bool(record: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter()
        .filter_map(|key| lookup(record, key))
        .find_map(coerce_bool)
}

/// Identifiers arrive as numbers from some endpoints and strings from others.
pub fn resolve_identifier(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(record, key))
        .find_map(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}

/// Numeric coercion with the same acceptance rules the collector app applied:
/// blank strings read as zero, booleans as 0/1, containers never match.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Some(0.0);
            }
            trimmed.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
        }
    }
}

pub(crate) fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|parsed| parsed != 0.0),
        Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
