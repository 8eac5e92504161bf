//! Structured envelope extraction
//!
//! Walks `resource_metrics[].scope_metrics[].metrics[]` and writes the gauge
//! data points of each descriptor. Any level that is missing or of the wrong
//! JSON type is skipped while its siblings continue.

use serde_json::{Map, Value};

use super::registry::MetricRegistry;
use super::state::MetricStateStore;
use crate::core::config::ValueSelection;
use crate::core::constants::UNKNOWN_METRIC_NAME;

/// Extract every metric in an envelope. Returns the number of values written.
pub fn extract_envelope(
    record: &Map<String, Value>,
    registry: &MetricRegistry,
    state: &MetricStateStore,
    selection: ValueSelection,
) -> usize {
    let mut written = 0;

    for resource_metrics in array_field(record.get("resource_metrics")) {
        for scope_metrics in array_field(resource_metrics.get("scope_metrics")) {
            for metric in array_field(scope_metrics.get("metrics")) {
                written += extract_metric(metric, registry, state, selection);
            }
        }
    }

    written
}

fn extract_metric(
    metric: &Value,
    registry: &MetricRegistry,
    state: &MetricStateStore,
    selection: ValueSelection,
) -> usize {
    let Some(metric) = metric.as_object() else {
        return 0;
    };

    let name = metric
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_METRIC_NAME);
    let description = metric
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    registry.ensure_registered(name, description);

    let data_points = metric
        .get("gauge")
        .filter(|gauge| gauge.is_object())
        .map(|gauge| array_field(gauge.get("data_points")))
        .unwrap_or_default();

    for data_point in data_points {
        let value = select_value(data_point, selection);
        tracing::debug!(metric = %name, value, origin = "envelope", "Updated metric");
        state.set(name, value);
    }

    data_points.len()
}

/// Pick a data point's value.
///
/// `NonZero` takes `as_double` if present and non-zero, else `as_int` if
/// present and non-zero, else 0. `Presence` drops the non-zero condition.
/// Non-numeric values count as absent in both modes.
pub fn select_value(data_point: &Value, selection: ValueSelection) -> f64 {
    let as_double = data_point.get("as_double").and_then(Value::as_f64);
    let as_int = data_point.get("as_int").and_then(Value::as_f64);

    let accept = |v: &f64| match selection {
        ValueSelection::NonZero => *v != 0.0,
        ValueSelection::Presence => true,
    };

    as_double
        .filter(accept)
        .or_else(|| as_int.filter(accept))
        .unwrap_or(0.0)
}

fn array_field(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::registry::testing::RecordingInstruments;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        registry: MetricRegistry,
        state: Arc<MetricStateStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let state = Arc::new(MetricStateStore::new());
            let registry =
                MetricRegistry::new(state.clone(), Arc::new(RecordingInstruments::default()));
            Self { registry, state }
        }

        fn extract(&self, record: Value, selection: ValueSelection) -> usize {
            let Value::Object(map) = record else {
                panic!("fixture must be an object");
            };
            extract_envelope(&map, &self.registry, &self.state, selection)
        }
    }

    fn envelope(metrics: Value) -> Value {
        json!({"resource_metrics": [{"scope_metrics": [{"metrics": metrics}]}]})
    }

    #[test]
    fn test_zero_double_falls_back_to_int() {
        let dp = json!({"as_double": 0.0, "as_int": 7});
        assert_eq!(select_value(&dp, ValueSelection::NonZero), 7.0);
    }

    #[test]
    fn test_double_takes_precedence() {
        assert_eq!(
            select_value(&json!({"as_double": 2.5}), ValueSelection::NonZero),
            2.5
        );
        assert_eq!(
            select_value(&json!({"as_double": 2.5, "as_int": 9}), ValueSelection::NonZero),
            2.5
        );
    }

    #[test]
    fn test_missing_values_yield_zero() {
        assert_eq!(select_value(&json!({}), ValueSelection::NonZero), 0.0);
        assert_eq!(select_value(&json!({"as_int": 0}), ValueSelection::NonZero), 0.0);
        assert_eq!(select_value(&json!(null), ValueSelection::Presence), 0.0);
    }

    #[test]
    fn test_non_numeric_values_are_absent() {
        let dp = json!({"as_double": "12.5", "as_int": 4});
        assert_eq!(select_value(&dp, ValueSelection::NonZero), 4.0);
        assert_eq!(select_value(&dp, ValueSelection::Presence), 4.0);
    }

    #[test]
    fn test_presence_keeps_zero_double() {
        let dp = json!({"as_double": 0.0, "as_int": 7});
        assert_eq!(select_value(&dp, ValueSelection::Presence), 0.0);
        assert_eq!(
            select_value(&json!({"as_int": -3}), ValueSelection::Presence),
            -3.0
        );
    }

    #[test]
    fn test_extract_gauge_registers_and_sets() {
        let fx = Fixture::new();
        let record = envelope(json!([{
            "name": "cpu.usage",
            "description": "CPU usage",
            "gauge": {"data_points": [{"as_double": 0.75}]}
        }]));

        assert_eq!(fx.extract(record, ValueSelection::NonZero), 1);
        assert_eq!(fx.registry.description("cpu.usage").as_deref(), Some("CPU usage"));
        assert_eq!(fx.state.get("cpu.usage"), 0.75);
    }

    #[test]
    fn test_last_data_point_wins() {
        let fx = Fixture::new();
        let record = envelope(json!([{
            "name": "queue.depth",
            "gauge": {"data_points": [{"as_int": 3}, {"as_int": 8}]}
        }]));

        assert_eq!(fx.extract(record, ValueSelection::NonZero), 2);
        assert_eq!(fx.state.get("queue.depth"), 8.0);
    }

    #[test]
    fn test_metric_without_gauge_is_registered_only() {
        let fx = Fixture::new();
        let record = envelope(json!([{"name": "requests", "sum": {"data_points": [{"as_int": 5}]}}]));

        assert_eq!(fx.extract(record, ValueSelection::NonZero), 0);
        assert!(fx.registry.contains("requests"));
        assert_eq!(fx.registry.description("requests").as_deref(), Some(""));
        assert_eq!(fx.state.get("requests"), 0.0);
        assert!(fx.state.is_empty());
    }

    #[test]
    fn test_missing_name_uses_unknown() {
        let fx = Fixture::new();
        let record = envelope(json!([{"name": 42, "gauge": {"data_points": [{"as_int": 1}]}}]));

        fx.extract(record, ValueSelection::NonZero);
        assert!(fx.registry.contains("unknown"));
        assert_eq!(fx.state.get("unknown"), 1.0);
    }

    #[test]
    fn test_missing_scope_metrics_skips_only_that_branch() {
        let fx = Fixture::new();
        let record = json!({"resource_metrics": [
            {"resource": {"attributes": []}},
            {"scope_metrics": [{"metrics": [{
                "name": "mem.used",
                "gauge": {"data_points": [{"as_int": 1024}]}
            }]}]}
        ]});

        assert_eq!(fx.extract(record, ValueSelection::NonZero), 1);
        assert_eq!(fx.state.get("mem.used"), 1024.0);
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn test_wrong_types_are_treated_as_missing() {
        let fx = Fixture::new();
        let record = json!({"resource_metrics": [
            {"scope_metrics": {"metrics": []}},
            {"scope_metrics": [{"metrics": "none"}]},
            {"scope_metrics": [{"metrics": ["not-a-descriptor"]}]},
            {"scope_metrics": [{"metrics": [{"name": "a", "gauge": [1, 2]}]}]},
            {"scope_metrics": [{"metrics": [{"name": "b", "gauge": {"data_points": 5}}]}]},
            {"scope_metrics": [{"metrics": [{"name": "c", "gauge": {"data_points": [{"as_double": 1.5}]}}]}]}
        ]});

        assert_eq!(fx.extract(record, ValueSelection::NonZero), 1);
        assert_eq!(fx.registry.len(), 3);
        assert_eq!(fx.state.get("c"), 1.5);
    }

    #[test]
    fn test_top_level_scope_metrics_yields_nothing() {
        let fx = Fixture::new();
        let record = json!({"scope_metrics": [{"metrics": [{
            "name": "orphan",
            "gauge": {"data_points": [{"as_int": 1}]}
        }]}]});

        assert_eq!(fx.extract(record, ValueSelection::NonZero), 0);
        assert!(fx.registry.is_empty());
    }

    #[test]
    fn test_first_description_is_kept_across_records() {
        let fx = Fixture::new();
        fx.extract(
            envelope(json!([{"name": "temp", "description": "first"}])),
            ValueSelection::NonZero,
        );
        fx.extract(
            envelope(json!([{"name": "temp", "description": "second", "gauge": {"data_points": [{"as_double": 19.0}]}}])),
            ValueSelection::NonZero,
        );

        assert_eq!(fx.registry.description("temp").as_deref(), Some("first"));
        assert_eq!(fx.state.get("temp"), 19.0);
    }
}
