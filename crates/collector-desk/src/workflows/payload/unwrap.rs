use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Which envelope a collection was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionShape {
    Bare,
    Data,
    DataResults,
    DataItems,
    Unrecognized,
}

/// Flattens a list response regardless of how the endpoint wrapped it.
///
/// Checked in order: bare array, `data` array, `data.results`, `data.items`.
/// Anything else yields an empty collection.
pub fn unwrap_collection(response: &Value) -> Vec<Value> {
    let (items, shape) = locate_collection(response);
    if shape == CollectionShape::Unrecognized {
        debug!(kind = value_kind(response), "unrecognized collection payload");
    }
    items.map(<[Value]>::to_vec).unwrap_or_default()
}

/// Owned variant that avoids cloning when the caller no longer needs the
/// response.
pub fn into_collection(response: Value) -> Vec<Value> {
    match response {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Object(mut data)) => {
                for key in ["results", "items"] {
                    if let Some(Value::Array(items)) = data.remove(key) {
                        return items;
                    }
                }
                debug!("data envelope carried no results or items array");
                Vec::new()
            }
            _ => {
                debug!("object payload without a data collection");
                Vec::new()
            }
        },
        other => {
            debug!(kind = value_kind(&other), "unrecognized collection payload");
            Vec::new()
        }
    }
}

pub fn collection_shape(response: &Value) -> CollectionShape {
    locate_collection(response).1
}

/// Deserializes every element of the flattened collection. Elements that do
/// not fit `T` are logged and dropped so one malformed row cannot blank a list.
pub fn unwrap_typed<T: DeserializeOwned>(response: Value) -> Vec<T> {
    into_collection(response)
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                debug!(index, error = %err, "dropping collection element");
                None
            }
        })
        .collect()
}

/// Single-object counterpart: descends an object-valued `data`, then
/// `nested_key` when present. Covers bare, `data`-wrapped, `nested`-wrapped
/// and double-wrapped responses. Non-objects yield `None`.
pub fn unwrap_object(response: Value, nested_key: Option<&str>) -> Option<Value> {
    let mut current = match response {
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(data @ Value::Object(_)) => data,
            Some(other) => {
                envelope.insert("data".to_string(), other);
                Value::Object(envelope)
            }
            None => Value::Object(envelope),
        },
        _ => return None,
    };

    if let Some(key) = nested_key {
        let nested = current
            .get_mut(key)
            .filter(|inner| inner.is_object())
            .map(Value::take);
        if let Some(inner) = nested {
            current = inner;
        }
    }

    Some(current)
}

fn locate_collection(response: &Value) -> (Option<&[Value]>, CollectionShape) {
    if let Value::Array(items) = response {
        return (Some(items.as_slice()), CollectionShape::Bare);
    }

    match response.get("data") {
        Some(Value::Array(items)) => (Some(items.as_slice()), CollectionShape::Data),
        Some(Value::Object(data)) => {
            if let Some(Value::Array(items)) = data.get("results") {
                (Some(items.as_slice()), CollectionShape::DataResults)
            } else if let Some(Value::Array(items)) = data.get("items") {
                (Some(items.as_slice()), CollectionShape::DataItems)
            } else {
                (None, CollectionShape::Unrecognized)
            }
        }
        _ => (None, CollectionShape::Unrecognized),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn recognizes_each_documented_envelope() {
        let cases = [
            (json!([1, 2]), CollectionShape::Bare),
            (json!({ "data": [1, 2] }), CollectionShape::Data),
            (json!({ "data": { "results": [1, 2] } }), CollectionShape::DataResults),
            (json!({ "data": { "items": [1, 2] } }), CollectionShape::DataItems),
        ];

        for (payload, shape) in cases {
            assert_eq!(collection_shape(&payload), shape);
            assert_eq!(unwrap_collection(&payload), vec![json!(1), json!(2)]);
            assert_eq!(into_collection(payload), vec![json!(1), json!(2)]);
        }
    }

    #[test]
    fn results_win_over_items() {
        let payload = json!({ "data": { "items": [2], "results": [1] } });
        assert_eq!(unwrap_collection(&payload), vec![json!(1)]);
        assert_eq!(into_collection(payload), vec![json!(1)]);
    }

    #[test]
    fn unknown_shapes_become_empty() {
        for payload in [
            Value::Null,
            json!("oops"),
            json!(12),
            json!({ "rows": [1] }),
            json!({ "data": "nope" }),
            json!({ "data": { "results": "nope" } }),
        ] {
            assert!(unwrap_collection(&payload).is_empty(), "{payload}");
            assert!(into_collection(payload).is_empty());
        }
    }

    #[test]
    fn typed_unwrap_drops_malformed_rows() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Row {
            id: u32,
        }

        let rows: Vec<Row> = unwrap_typed(json!({ "data": [{ "id": 1 }, { "id": "x" }, { "id": 3 }] }));
        assert_eq!(rows, vec![Row { id: 1 }, Row { id: 3 }]);
    }

    #[test]
    fn object_unwrap_handles_every_calculation_wrapping() {
        let inner = json!({ "interestAmount": 1000 });
        for payload in [
            inner.clone(),
            json!({ "calculation": inner.clone() }),
            json!({ "data": inner.clone() }),
            json!({ "success": true, "data": { "calculation": inner.clone(), "schedule": [] } }),
        ] {
            assert_eq!(
                unwrap_object(payload, Some("calculation")),
                Some(inner.clone())
            );
        }
        assert_eq!(unwrap_object(json!([1]), Some("calculation")), None);
    }
}
