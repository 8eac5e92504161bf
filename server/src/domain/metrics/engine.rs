//! Metrics engine
//!
//! Owns the latest-value store and the registry, and routes each decoded
//! record to the matching extractor.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use super::classify::{RecordKind, classify};
use super::envelope::extract_envelope;
use super::generic::transform_generic;
use super::registry::{InstrumentBackend, MetricRegistry};
use super::state::MetricStateStore;
use crate::core::config::ValueSelection;

/// A raw message that cannot be turned into a record
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

/// Result of ingesting one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub kind: RecordKind,
    pub written: usize,
}

pub struct MetricsEngine {
    state: Arc<MetricStateStore>,
    registry: MetricRegistry,
    selection: ValueSelection,
}

impl MetricsEngine {
    pub fn new(instruments: Arc<dyn InstrumentBackend>, selection: ValueSelection) -> Self {
        let state = Arc::new(MetricStateStore::new());
        let registry = MetricRegistry::new(state.clone(), instruments);
        Self {
            state,
            registry,
            selection,
        }
    }

    /// Decode a raw payload and ingest it
    pub fn ingest_payload(&self, payload: &[u8]) -> Result<IngestOutcome, RecordError> {
        let text = std::str::from_utf8(payload)?;
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(record) => Ok(self.ingest_record(&record)),
            other => Err(RecordError::NotAnObject(json_type_name(&other))),
        }
    }

    /// Classify a decoded record and run the matching extractor
    pub fn ingest_record(&self, record: &Map<String, Value>) -> IngestOutcome {
        let kind = classify(record);
        let written = match kind {
            RecordKind::StructuredEnvelope => {
                extract_envelope(record, &self.registry, &self.state, self.selection)
            }
            RecordKind::GenericRecord => transform_generic(record, &self.registry, &self.state),
        };
        IngestOutcome { kind, written }
    }

    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    /// Current (name, value) of every registered metric, sorted by name
    pub fn snapshot(&self) -> Vec<(String, f64)> {
        self.registry
            .observe_all()
            .into_iter()
            .map(|(name, observation)| (name, observation.value))
            .collect()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
