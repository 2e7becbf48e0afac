//! Shape normalization at the API boundary.
//!
//! The backend is untyped from our point of view. Anything that should be a
//! list but is not becomes an empty list, and list elements that do not
//! decode are dropped, so nothing downstream ever sees a malformed shape.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Name of a JSON value's shape, for diagnostics.
pub fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode a top-level JSON array, treating any other shape as empty.
pub fn sequence<T: DeserializeOwned>(endpoint: &str, value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        warn!(endpoint, shape = shape_name(&value), "expected a JSON array, treating as empty");
        return Vec::new();
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!(endpoint, index, error = %e, "skipping undecodable element");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!(endpoint, total, kept = decoded.len(), "dropped malformed elements");
    }
    decoded
}

/// Decode the array stored under `field` of a JSON object.
///
/// A missing field, `null`, or a non-object body all yield an empty list.
pub fn field_sequence<T: DeserializeOwned>(endpoint: &str, value: Value, field: &str) -> Vec<T> {
    match value {
        Value::Object(mut map) => match map.remove(field) {
            Some(Value::Null) | None => Vec::new(),
            Some(inner) => sequence(endpoint, inner),
        },
        other => {
            warn!(endpoint, shape = shape_name(&other), field, "expected a JSON object, treating as empty");
            Vec::new()
        }
    }
}

/// Non-empty string stored under `field`, if any.
pub fn text_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::types::{StorageEntry, Subject};
    use serde_json::json;

    #[test]
    fn test_non_array_is_empty() {
        for body in [json!(null), json!({}), json!("oops"), json!(3), json!({"subjects": []})] {
            let subjects: Vec<Subject> = sequence("/api/subjects", body);
            assert!(subjects.is_empty());
        }
    }

    #[test]
    fn test_array_decodes_and_skips_garbage() {
        let body = json!([
            {"subject_id": "a", "processing_status": "completed"},
            42,
            null,
            {"subject_id": "b"}
        ]);
        let subjects: Vec<Subject> = sequence("/api/subjects", body);
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].subject_id, "a");
        assert_eq!(subjects[1].subject_id, "b");
    }

    #[test]
    fn test_field_sequence_shapes() {
        let files: Vec<StorageEntry> = field_sequence(
            "/api/gcs/list",
            json!({"files": [{"name": "a/", "path": "a/", "is_directory": true}]}),
            "files",
        );
        assert_eq!(files.len(), 1);

        for body in [json!({}), json!({"files": null}), json!({"files": {}}), json!([1, 2])] {
            let files: Vec<StorageEntry> = field_sequence("/api/gcs/list", body, "files");
            assert!(files.is_empty());
        }
    }

    #[test]
    fn test_text_field() {
        assert_eq!(text_field(&json!({"response": "hi"}), "response").as_deref(), Some("hi"));
        assert_eq!(text_field(&json!({"response": "  "}), "response"), None);
        assert_eq!(text_field(&json!({"response": 1}), "response"), None);
        assert_eq!(text_field(&json!(null), "response"), None);
    }
}
