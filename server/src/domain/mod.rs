//! Domain logic
//!
//! - `metrics` - record classification, extraction and gauge registration

pub mod metrics;

pub use metrics::{MetricsEngine, MetricsPipeline, OtelInstruments};
