//! Standard input backend
//!
//! Reads one JSON record per line. Offsets are zero-based line numbers and
//! the stream ends at EOF. Intended for local runs and replaying captures:
//! `cat records.jsonl | metricbridge --bus stdin`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::SplitStream;

use super::backend::{BusBackend, BusMessage, BusSubscription};
use super::error::BusError;

/// Topic name reported for stdin records
pub const STDIN_TOPIC: &str = "stdin";

#[derive(Default)]
pub struct StdinBus {
    subscribed: AtomicBool,
}

impl StdinBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BusBackend for StdinBus {
    async fn subscribe(&self) -> Result<BusSubscription, BusError> {
        // Process stdin has a single reader
        if self.subscribed.swap(true, Ordering::SeqCst) {
            return Err(BusError::AlreadySubscribed(self.backend_name()));
        }

        let lines = SplitStream::new(BufReader::new(tokio::io::stdin()).split(b'\n'));
        Ok(BusSubscription {
            receiver: Box::pin(line_messages(lines)),
        })
    }

    fn backend_name(&self) -> &'static str {
        "stdin"
    }
}

/// Number raw lines and wrap them as bus messages, skipping blank lines.
///
/// Lines stay as bytes; UTF-8 validation happens when the record is decoded.
fn line_messages<S>(lines: S) -> impl futures::Stream<Item = Result<BusMessage, BusError>> + Send
where
    S: futures::Stream<Item = std::io::Result<Vec<u8>>> + Send,
{
    lines
        .enumerate()
        .filter_map(|(offset, line)| async move {
            match line {
                Ok(line) if line.iter().all(u8::is_ascii_whitespace) => None,
                Ok(mut line) => {
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    Some(Ok(BusMessage {
                        topic: STDIN_TOPIC.to_string(),
                        partition: 0,
                        offset: offset as i64,
                        payload: Some(line),
                    }))
                }
                Err(e) => Some(Err(BusError::Io(e))),
            }
        })
}
