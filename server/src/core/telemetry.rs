//! OpenTelemetry meter provider bootstrap
//!
//! Builds the OTLP/gRPC metric exporter and the periodic reader that polls
//! every registered gauge callback on a fixed interval.

use std::time::Duration;

use opentelemetry::metrics::{Meter, MeterProvider};
use opentelemetry::{InstrumentationScope, KeyValue};
use opentelemetry_otlp::{MetricExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use thiserror::Error;
use tonic::transport::ClientTlsConfig;

use super::config::ExporterConfig;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to build OTLP metric exporter: {0}")]
    Exporter(String),
}

/// Build the meter provider described by `config`.
///
/// Must be called from within a Tokio runtime: the gRPC channel spawns its
/// connection worker onto the current runtime.
pub fn init_meter_provider(config: &ExporterConfig) -> Result<MeterGuard, TelemetryError> {
    let mut builder = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.endpoint.clone())
        .with_timeout(Duration::from_secs(config.timeout_secs));
    if let Some(tls) = tls_config(config) {
        builder = builder.with_tls_config(tls);
    }
    let exporter = builder
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(Duration::from_millis(config.interval_ms))
        .build();

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new(
            "service.version",
            config.service_version.clone(),
        ))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build();

    tracing::debug!(
        endpoint = %config.endpoint,
        insecure = config.insecure,
        interval_ms = config.interval_ms,
        timeout_secs = config.timeout_secs,
        "Meter provider initialized"
    );

    Ok(MeterGuard::new(provider))
}

/// TLS settings for a secure exporter, verified against the system roots
fn tls_config(config: &ExporterConfig) -> Option<ClientTlsConfig> {
    if config.insecure {
        None
    } else {
        Some(ClientTlsConfig::new().with_native_roots())
    }
}

/// Owns the meter provider for the process lifetime
pub struct MeterGuard {
    provider: SdkMeterProvider,
}

impl MeterGuard {
    pub fn new(provider: SdkMeterProvider) -> Self {
        Self { provider }
    }

    /// Meter scoped to the reporting service
    pub fn meter(&self, name: &str, version: &str) -> Meter {
        let scope = InstrumentationScope::builder(name.to_string())
            .with_version(version.to_string())
            .build();
        self.provider.meter_with_scope(scope)
    }

    /// Run a final collection and export, then release the exporter.
    ///
    /// Blocks until the exporter responds or times out.
    pub fn shutdown(&self) {
        if let Err(e) = self.provider.force_flush() {
            tracing::warn!(error = %e, "Final metrics export failed");
        } else {
            tracing::debug!("Final metrics export complete");
        }
        if let Err(e) = self.provider.shutdown() {
            tracing::warn!(error = %e, "Meter provider shutdown failed");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::metrics::data::Gauge;
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

    /// One gauge data point as it left the SDK
    #[derive(Debug, Clone, PartialEq)]
    pub struct ExportedGauge {
        pub name: String,
        pub description: String,
        pub unit: String,
        pub value: f64,
        pub attributes: Vec<KeyValue>,
    }

    /// Provider whose periodic reader exports into memory
    pub fn in_memory_provider() -> (InMemoryMetricExporter, SdkMeterProvider) {
        let exporter = InMemoryMetricExporter::default();
        let reader = PeriodicReader::builder(exporter.clone()).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        (exporter, provider)
    }

    /// f64 gauge points of the most recent export, sorted by name
    pub fn exported_gauges(exporter: &InMemoryMetricExporter) -> Vec<ExportedGauge> {
        let exports = exporter.get_finished_metrics().unwrap();
        let Some(latest) = exports.last() else {
            return Vec::new();
        };

        let mut gauges = Vec::new();
        for scope in &latest.scope_metrics {
            for metric in &scope.metrics {
                let Some(gauge) = metric.data.as_any().downcast_ref::<Gauge<f64>>() else {
                    continue;
                };
                for point in &gauge.data_points {
                    gauges.push(ExportedGauge {
                        name: metric.name.to_string(),
                        description: metric.description.to_string(),
                        unit: metric.unit.to_string(),
                        value: point.value,
                        attributes: point.attributes.clone(),
                    });
                }
            }
        }
        gauges.sort_by(|a, b| a.name.cmp(&b.name));
        gauges
    }
}
