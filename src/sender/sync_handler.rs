use bytes::Bytes;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::LogEntry;
use crate::handler::HandlerError;
use crate::port::{Encoder, LogHandler, Publisher};

/// Encodes and publishes each entry on the caller's task.
///
/// Exactly one publish attempt per call; encode and publish errors go
/// straight back to the caller. Concurrent calls are serialized.
pub struct SyncPublishHandler {
    encoder: Arc<dyn Encoder>,
    publisher: Arc<dyn Publisher>,
    topic: String,
    lock: Mutex<()>,
}

impl SyncPublishHandler {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        publisher: Arc<dyn Publisher>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            encoder,
            publisher,
            topic: topic.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl LogHandler for SyncPublishHandler {
    fn handle_log<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let payload = self.encoder.encode(entry)?;
            self.publisher
                .publish(&self.topic, Bytes::from(payload))
                .await?;
            Ok(())
        })
    }
}
