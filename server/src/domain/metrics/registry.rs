//! Metric registry
//!
//! Tracks every metric name ever extracted and owns exactly one pull
//! instrument per name. Registration is monotonic: names are never removed
//! and the description from the first registration is kept.
//!
//! ## Pull callbacks
//!
//! Each instrument is bound to a [`GaugeReader`], a capability holding the
//! metric name and a read handle into [`MetricStateStore`]. The exporter's
//! periodic reader invokes it on every collection cycle; it never blocks and
//! never mutates state.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Meter, ObservableGauge};

use super::state::MetricStateStore;
use crate::core::constants::{METRIC_UNIT, SOURCE_ATTR_KEY, SOURCE_ATTR_VALUE};

// ============================================================================
// PULL CALLBACK
// ============================================================================

/// A single value reported at poll time
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub value: f64,
    pub attributes: [KeyValue; 1],
}

/// Read capability bound to one metric name
#[derive(Debug, Clone)]
pub struct GaugeReader {
    name: Arc<str>,
    state: Arc<MetricStateStore>,
}

impl GaugeReader {
    pub fn new(name: &str, state: Arc<MetricStateStore>) -> Self {
        Self {
            name: Arc::from(name),
            state,
        }
    }

    #[cfg(test)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value tagged with `source = "kafka"`
    pub fn observe(&self) -> Observation {
        Observation {
            value: self.state.get(&self.name),
            attributes: [KeyValue::new(SOURCE_ATTR_KEY, SOURCE_ATTR_VALUE)],
        }
    }
}

// ============================================================================
// INSTRUMENT BACKEND
// ============================================================================

/// Descriptor passed to the instrument backend on first registration
#[derive(Debug, Clone, Copy)]
pub struct GaugeDescriptor<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub unit: &'a str,
}

/// Keeps a created instrument alive for the lifetime of its metric
pub struct InstrumentHandle {
    _gauge: Option<ObservableGauge<f64>>,
}

impl InstrumentHandle {
    pub fn otel(gauge: ObservableGauge<f64>) -> Self {
        Self {
            _gauge: Some(gauge),
        }
    }

    /// Handle for backends that keep their own references
    pub fn detached() -> Self {
        Self { _gauge: None }
    }
}

/// Creates pull instruments
pub trait InstrumentBackend: Send + Sync {
    /// Create one observable gauge whose callback reports `reader.observe()`
    fn create_gauge(&self, descriptor: GaugeDescriptor<'_>, reader: GaugeReader)
    -> InstrumentHandle;
}

/// OpenTelemetry observable gauges on a shared meter
pub struct OtelInstruments {
    meter: Meter,
}

impl OtelInstruments {
    pub fn new(meter: Meter) -> Self {
        Self { meter }
    }
}

impl InstrumentBackend for OtelInstruments {
    fn create_gauge(
        &self,
        descriptor: GaugeDescriptor<'_>,
        reader: GaugeReader,
    ) -> InstrumentHandle {
        let gauge = self
            .meter
            .f64_observable_gauge(descriptor.name.to_string())
            .with_description(descriptor.description.to_string())
            .with_unit(descriptor.unit.to_string())
            .with_callback(move |observer| {
                let observation = reader.observe();
                observer.observe(observation.value, &observation.attributes);
            })
            .build();
        InstrumentHandle::otel(gauge)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// A registered metric
pub struct Metric {
    pub description: String,
    pub reader: GaugeReader,
    _instrument: InstrumentHandle,
}

pub struct MetricRegistry {
    metrics: DashMap<String, Metric>,
    state: Arc<MetricStateStore>,
    instruments: Arc<dyn InstrumentBackend>,
}

impl MetricRegistry {
    pub fn new(state: Arc<MetricStateStore>, instruments: Arc<dyn InstrumentBackend>) -> Self {
        Self {
            metrics: DashMap::new(),
            state,
            instruments,
        }
    }

    /// Register `name` once. Returns `true` only for the call that created
    /// the instrument; later calls leave the stored description untouched.
    pub fn ensure_registered(&self, name: &str, description: &str) -> bool {
        if self.metrics.contains_key(name) {
            return false;
        }

        // The entry lock makes racing first registrations create one instrument
        match self.metrics.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                let reader = GaugeReader::new(name, self.state.clone());
                let instrument = self.instruments.create_gauge(
                    GaugeDescriptor {
                        name,
                        description,
                        unit: METRIC_UNIT,
                    },
                    reader.clone(),
                );
                slot.insert(Metric {
                    description: description.to_string(),
                    reader,
                    _instrument: instrument,
                });
                tracing::info!(metric = %name, unit = METRIC_UNIT, "Registered metric");
                true
            }
        }
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    #[cfg(test)]
    pub fn description(&self, name: &str) -> Option<String> {
        self.metrics.get(name).map(|m| m.description.clone())
    }

    /// Pull callback of a registered metric
    #[cfg(test)]
    pub fn reader(&self, name: &str) -> Option<GaugeReader> {
        self.metrics.get(name).map(|m| m.reader.clone())
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Observe every registered metric, sorted by name.
    ///
    /// Safe to call while other threads register new names; those may or may
    /// not be included.
    pub fn observe_all(&self) -> Vec<(String, Observation)> {
        let mut observations: Vec<(String, Observation)> = self
            .metrics
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().reader.observe()))
            .collect();
        observations.sort_by(|a, b| a.0.cmp(&b.0));
        observations
    }
}
