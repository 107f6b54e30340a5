//! Nested record and envelope extraction for JSON payloads.

use crate::{ParseError, Record, Schema};
use serde_json::Value;
use serde_json_path::JsonPath;
use std::borrow::Cow;
use tracing::debug;

/// Field under which hoisted root fields are attached to each extracted record.
pub const ENVELOPE_FIELD: &str = "stream_log_envelope";

/// Compiles a path query. Expressions without a leading `$` are relative to the root.
pub fn compile_path(expr: &str) -> Result<JsonPath, ParseError> {
    let expr = expr.trim();
    let normalized = if expr.starts_with('$') {
        Cow::Borrowed(expr)
    } else {
        Cow::Owned(format!("$.{expr}"))
    };

    JsonPath::parse(&normalized)
        .map_err(|err| ParseError::Misconfigured(format!("invalid json_path {expr:?}: {err}")))
}

/// Every value selected by `json_path`, cloned out of the payload.
pub fn extract_records(payload: &Value, json_path: &str) -> Result<Vec<Value>, ParseError> {
    let path = compile_path(json_path)?;
    let records: Vec<Value> = path.query(payload).all().into_iter().cloned().collect();
    debug!("json_path {} selected {} record(s)", json_path, records.len());
    Ok(records)
}

/// Root-level fields named by `keys`, in declared order. Absent keys are left out.
pub fn extract_envelope(payload: &Value, keys: &Schema) -> Record {
    let mut envelope = Record::new();
    for key in keys.keys() {
        match payload.get(key) {
            Some(value) => {
                envelope.insert(key.to_string(), value.clone());
            }
            None => debug!("envelope key [{}] not present in payload", key),
        }
    }
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldType, PrimitiveType};
    use serde_json::json;

    #[test]
    fn test_relative_and_absolute_paths_agree() {
        let payload = json!({"Records": [{"id": 1}, {"id": 2}]});

        let relative = extract_records(&payload, "Records[*]").unwrap();
        let absolute = extract_records(&payload, "$.Records[*]").unwrap();

        assert_eq!(relative, vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(relative, absolute);
    }

    #[test]
    fn test_no_matches_is_empty() {
        let payload = json!({"other": []});
        assert!(extract_records(&payload, "$.Records[*]").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_path_is_misconfiguration() {
        let err = extract_records(&json!({}), "$.[[").unwrap_err();
        assert!(matches!(err, ParseError::Misconfigured(_)));
    }

    #[test]
    fn test_envelope_follows_declared_keys() {
        let payload = json!({"region": "us-east-1", "account": "123", "Records": []});
        let keys: Schema = [
            ("account", FieldType::Primitive(PrimitiveType::String)),
            ("region", FieldType::Primitive(PrimitiveType::String)),
            ("missing", FieldType::Primitive(PrimitiveType::String)),
        ]
        .into_iter()
        .collect();

        let envelope = extract_envelope(&payload, &keys);
        assert_eq!(envelope.keys().collect::<Vec<_>>(), ["account", "region"]);
        assert_eq!(envelope["region"], json!("us-east-1"));
    }
}
