//! Bus backend trait definition
//!
//! Defines the interface for message bus consumers (Kafka and stdin).
//! Delivery semantics, partition assignment and offset management are owned
//! by the backend; callers only see an ordered stream of messages.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::error::BusError;

/// Raw message received from the bus
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    /// Topic (or source name) the message came from
    pub topic: String,
    /// Partition number, 0 for unpartitioned sources
    pub partition: i32,
    /// Offset within the partition
    pub offset: i64,
    /// Message payload, `None` for tombstones
    pub payload: Option<Vec<u8>>,
}

/// Subscription to the configured topic
pub struct BusSubscription {
    /// Stream of received messages. Ends when the bus closes.
    pub receiver: Pin<Box<dyn Stream<Item = Result<BusMessage, BusError>> + Send>>,
}

/// Message bus backend trait
#[async_trait]
pub trait BusBackend: Send + Sync {
    /// Subscribe to the configured topic
    async fn subscribe(&self) -> Result<BusSubscription, BusError>;

    /// Backend name for debugging/logging
    fn backend_name(&self) -> &'static str;
}
