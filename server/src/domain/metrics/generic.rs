//! Flat record transformation
//!
//! Every numeric or numeric-looking field of a flat object becomes a
//! `kafka.<key>` gauge. Other fields are attributes and are not stored.

use serde_json::{Map, Value};

use super::registry::MetricRegistry;
use super::state::MetricStateStore;
use crate::core::constants::{GENERIC_DESCRIPTION_PREFIX, GENERIC_METRIC_PREFIX};

/// How a flat record field is treated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Numeric(f64),
    ParsableString(f64),
    Other,
}

impl FieldValue {
    pub fn as_metric_value(self) -> Option<f64> {
        match self {
            FieldValue::Numeric(v) | FieldValue::ParsableString(v) => Some(v),
            FieldValue::Other => None,
        }
    }
}

/// Classify a field value. Booleans are `Other`.
pub fn classify_field(value: &Value) -> FieldValue {
    match value {
        Value::Number(n) => n.as_f64().map_or(FieldValue::Other, FieldValue::Numeric),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_or(FieldValue::Other, FieldValue::ParsableString),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => FieldValue::Other,
    }
}

/// `kafka.` + key with spaces replaced by underscores, lowercased
pub fn metric_name_for_key(key: &str) -> String {
    format!(
        "{}{}",
        GENERIC_METRIC_PREFIX,
        key.replace(' ', "_").to_lowercase()
    )
}

/// Transform a flat record. Returns the number of values written.
///
/// Fields are processed in record order, so when two keys normalize to the
/// same name the later one wins.
pub fn transform_generic(
    record: &Map<String, Value>,
    registry: &MetricRegistry,
    state: &MetricStateStore,
) -> usize {
    let mut written = 0;

    for (key, value) in record {
        let Some(metric_value) = classify_field(value).as_metric_value() else {
            if value.is_string() {
                tracing::debug!(field = %key, "Non-metric attribute");
            } else {
                tracing::debug!(field = %key, "Skipping non-numeric field");
            }
            continue;
        };

        let name = metric_name_for_key(key);
        registry.ensure_registered(&name, &format!("{}{}", GENERIC_DESCRIPTION_PREFIX, key));
        state.set(&name, metric_value);
        tracing::debug!(metric = %name, value = metric_value, origin = "generic", "Updated metric");
        written += 1;
    }

    written
}
