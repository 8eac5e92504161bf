//! Metrics Ingestion
//!
//! Turns JSON records from the message bus into OpenTelemetry gauges.
//! Two record shapes are understood: structured metric envelopes
//! (`resource_metrics` / `scope_metrics`) and flat objects whose numeric
//! fields become `kafka.<field>` gauges.

pub mod classify;
pub mod engine;
pub mod envelope;
pub mod generic;
pub mod pipeline;
pub mod registry;
pub mod state;

pub use classify::{RecordKind, classify};
pub use engine::{IngestOutcome, MetricsEngine, RecordError};
pub use pipeline::{MetricsPipeline, PipelineStats, PipelineSummary};
pub use registry::{GaugeReader, InstrumentBackend, MetricRegistry, Observation, OtelInstruments};
pub use state::MetricStateStore;
