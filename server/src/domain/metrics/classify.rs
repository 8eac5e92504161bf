use serde_json::{Map, Value};

/// Top-level keys that mark a structured telemetry envelope
const ENVELOPE_KEYS: [&str; 2] = ["resource_metrics", "scope_metrics"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    StructuredEnvelope,
    GenericRecord,
}

/// Decide how a decoded record is extracted. Never fails.
pub fn classify(record: &Map<String, Value>) -> RecordKind {
    if ENVELOPE_KEYS.iter().any(|key| record.contains_key(*key)) {
        RecordKind::StructuredEnvelope
    } else {
        RecordKind::GenericRecord
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_resource_metrics_is_envelope() {
        let record = object(json!({"resource_metrics": []}));
        assert_eq!(classify(&record), RecordKind::StructuredEnvelope);
    }

    #[test]
    fn test_scope_metrics_is_envelope() {
        let record = object(json!({"scope_metrics": null, "count": 1}));
        assert_eq!(classify(&record), RecordKind::StructuredEnvelope);
    }

    #[test]
    fn test_flat_record_is_generic() {
        let record = object(json!({"count": 5, "label": "x"}));
        assert_eq!(classify(&record), RecordKind::GenericRecord);
    }

    #[test]
    fn test_empty_record_is_generic() {
        assert_eq!(classify(&Map::new()), RecordKind::GenericRecord);
    }

    #[test]
    fn test_nested_envelope_key_is_generic() {
        let record = object(json!({"payload": {"resource_metrics": []}}));
        assert_eq!(classify(&record), RecordKind::GenericRecord);
    }
}
