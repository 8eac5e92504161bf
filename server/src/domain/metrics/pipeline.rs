//! Metrics Ingestion Pipeline
//!
//! Pulls one message at a time from the bus and runs it through the engine.
//! A failing record is logged and dropped; the loop always moves on to the
//! next one.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::engine::MetricsEngine;
use crate::data::bus::{BusBackend, BusError, BusMessage};

/// Record counters, updated by the ingestion task
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    processed: AtomicU64,
    empty: AtomicU64,
    undecodable: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineSummary {
    pub received: u64,
    pub processed: u64,
    pub empty: u64,
    pub undecodable: u64,
    pub failed: u64,
}

impl PipelineStats {
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            received: self.received.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            undecodable: self.undecodable.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct MetricsPipeline {
    engine: Arc<MetricsEngine>,
    stats: Arc<PipelineStats>,
}

impl MetricsPipeline {
    pub fn new(engine: Arc<MetricsEngine>) -> Self {
        Self {
            engine,
            stats: Arc::new(PipelineStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    /// Subscribe to the bus and spawn the ingestion loop.
    ///
    /// The task ends when shutdown is signalled or the bus stream closes. A
    /// record already being processed when shutdown arrives is finished first.
    pub async fn start(
        self,
        bus: Arc<dyn BusBackend>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<JoinHandle<()>, BusError> {
        let mut subscription = bus.subscribe().await?;
        let backend = bus.backend_name();
        tracing::info!(backend, "Subscribed to message bus");

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.wait_for(|&v| v) => {
                        tracing::debug!("MetricsPipeline received shutdown");
                        break;
                    }
                    next = subscription.receiver.next() => {
                        match next {
                            Some(Ok(message)) => self.handle(&message),
                            Some(Err(e)) => {
                                tracing::warn!(backend, error = %e, "Bus receive error");
                            }
                            None => {
                                tracing::info!(backend, "Message bus stream ended");
                                break;
                            }
                        }
                    }
                }
            }
            self.log_summary();
        }))
    }

    fn handle(&self, message: &BusMessage) {
        self.stats.received.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "Received message"
        );

        let Some(payload) = message.payload.as_deref() else {
            self.stats.empty.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(offset = message.offset, "Skipping message without payload");
            return;
        };

        let engine = &self.engine;
        match std::panic::catch_unwind(AssertUnwindSafe(|| engine.ingest_payload(payload))) {
            Ok(Ok(outcome)) => {
                self.stats.processed.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    offset = message.offset,
                    kind = ?outcome.kind,
                    written = outcome.written,
                    "Processed record"
                );
            }
            Ok(Err(e)) => {
                self.stats.undecodable.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Discarding undecodable message"
                );
            }
            Err(panic) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %panic_message(panic.as_ref()),
                    "Record processing failed"
                );
            }
        }
    }

    fn log_summary(&self) {
        let summary = self.stats.summary();
        tracing::info!(
            received = summary.received,
            processed = summary.processed,
            empty = summary.empty,
            undecodable = summary.undecodable,
            failed = summary.failed,
            registered_metrics = self.engine.registered_count(),
            "MetricsPipeline stopped"
        );
        for (name, value) in self.engine.snapshot() {
            tracing::debug!(metric = %name, value, "Last observed value");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
