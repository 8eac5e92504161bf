//! Bus error types

use thiserror::Error;

/// Error type for message bus operations
#[derive(Error, Debug)]
pub enum BusError {
    /// Client could not be created or configured
    #[error("bus configuration error: {0}")]
    Config(String),

    /// Subscribing to the topic failed
    #[error("subscription error: {0}")]
    Subscribe(String),

    /// Receiving the next message failed
    #[error("receive error: {0}")]
    Receive(String),

    /// Subscription already taken (single-consumer backends)
    #[error("bus '{0}' is already subscribed")]
    AlreadySubscribed(&'static str),

    /// Backend not compiled into this binary
    #[error("bus backend '{0}' is not available in this build")]
    Unavailable(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "kafka")]
impl From<rdkafka::error::KafkaError> for BusError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        BusError::Receive(err.to_string())
    }
}
