//! Kafka consumer backend (rdkafka)
//!
//! Consumer-group subscription with broker-side auto commit. Offsets are
//! committed by librdkafka in the background, so a record is acknowledged
//! independently of whether it yielded any metric.

use std::sync::Arc;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;

use super::backend::{BusBackend, BusMessage, BusSubscription};
use super::error::BusError;
use crate::core::config::BusConfig;

pub struct KafkaBus {
    consumer: Arc<StreamConsumer>,
    topic: String,
}

impl KafkaBus {
    /// Create a consumer for `config.topic` in group `config.group_id`
    pub fn new(config: &BusConfig) -> Result<Self, BusError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", config.auto_offset_reset.as_str())
            .set("session.timeout.ms", config.session_timeout_ms.to_string())
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| BusError::Config(e.to_string()))?;

        tracing::debug!(
            brokers = %config.brokers,
            group_id = %config.group_id,
            auto_offset_reset = %config.auto_offset_reset,
            "Kafka consumer created"
        );

        Ok(Self {
            consumer: Arc::new(consumer),
            topic: config.topic.clone(),
        })
    }
}

#[async_trait]
impl BusBackend for KafkaBus {
    async fn subscribe(&self) -> Result<BusSubscription, BusError> {
        self.consumer
            .subscribe(&[self.topic.as_str()])
            .map_err(|e| BusError::Subscribe(e.to_string()))?;

        tracing::info!(topic = %self.topic, "Kafka consumer subscribed");

        let consumer = self.consumer.clone();
        let receiver = async_stream::stream! {
            loop {
                let next = match consumer.recv().await {
                    Ok(msg) => Ok(BusMessage {
                        topic: msg.topic().to_string(),
                        partition: msg.partition(),
                        offset: msg.offset(),
                        payload: msg.payload().map(|p| p.to_vec()),
                    }),
                    Err(e) => Err(BusError::from(e)),
                };
                yield next;
            }
        };

        Ok(BusSubscription {
            receiver: Box::pin(receiver),
        })
    }

    fn backend_name(&self) -> &'static str {
        "kafka"
    }
}
