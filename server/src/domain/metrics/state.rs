//! Latest-value store
//!
//! One `f64` per metric name. Writes overwrite unconditionally; reads of a
//! name that was never written return 0. Values are stored whole under a
//! shard lock, so concurrent readers never see a partially written value.

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct MetricStateStore {
    values: DashMap<String, f64>,
}

impl MetricStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the value for `name`
    pub fn set(&self, name: &str, value: f64) {
        if let Some(mut slot) = self.values.get_mut(name) {
            *slot = value;
            return;
        }
        self.values.insert(name.to_string(), value);
    }

    /// Most recent value for `name`, or 0 if never set
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).map(|v| *v).unwrap_or(0.0)
    }

    /// Number of names that have received at least one write
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unknown_returns_zero() {
        let store = MetricStateStore::new();
        assert_eq!(store.get("kafka.never_set"), 0.0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let store = MetricStateStore::new();
        store.set("kafka.temperature", 21.5);
        assert_eq!(store.get("kafka.temperature"), 21.5);

        store.set("kafka.temperature", -3.0);
        assert_eq!(store.get("kafka.temperature"), -3.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_names_are_independent() {
        let store = MetricStateStore::new();
        store.set("a", 1.0);
        store.set("b", 2.0);
        assert_eq!(store.get("a"), 1.0);
        assert_eq!(store.get("b"), 2.0);
        assert_eq!(store.get("c"), 0.0);
    }
}
