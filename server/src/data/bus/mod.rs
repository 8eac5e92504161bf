//! Message bus consumers
//!
//! Pluggable record sources for the ingestion pipeline:
//! - Kafka (default) - consumer group subscription, cargo feature `kafka`
//! - Stdin - newline-delimited JSON, for local runs
//!
//! The backend is selected by `bus.backend` in the configuration.

mod backend;
mod error;
#[cfg(feature = "kafka")]
mod kafka;
mod stdin;

use std::sync::Arc;

pub use backend::{BusBackend, BusMessage, BusSubscription};
pub use error::BusError;
#[cfg(feature = "kafka")]
pub use kafka::KafkaBus;
pub use stdin::{STDIN_TOPIC, StdinBus};

use crate::core::config::{BusBackendType, BusConfig};

/// Build the configured bus backend
pub fn create_bus(config: &BusConfig) -> Result<Arc<dyn BusBackend>, BusError> {
    match config.backend {
        #[cfg(feature = "kafka")]
        BusBackendType::Kafka => Ok(Arc::new(KafkaBus::new(config)?)),
        #[cfg(not(feature = "kafka"))]
        BusBackendType::Kafka => Err(BusError::Unavailable("kafka")),
        BusBackendType::Stdin => Ok(Arc::new(StdinBus::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::OffsetReset;

    fn bus_config(backend: BusBackendType) -> BusConfig {
        BusConfig {
            backend,
            brokers: "localhost:9092".to_string(),
            topic: "test-topic".to_string(),
            group_id: "my-group".to_string(),
            auto_offset_reset: OffsetReset::Earliest,
            session_timeout_ms: 30_000,
        }
    }

    #[test]
    fn test_create_stdin_bus() {
        let bus = create_bus(&bus_config(BusBackendType::Stdin)).unwrap();
        assert_eq!(bus.backend_name(), "stdin");
    }

    #[cfg(feature = "kafka")]
    #[tokio::test]
    async fn test_create_kafka_bus_without_broker_connection() {
        // Consumer creation is lazy; no broker is contacted until subscribe/recv
        let bus = create_bus(&bus_config(BusBackendType::Kafka)).unwrap();
        assert_eq!(bus.backend_name(), "kafka");
    }
}
