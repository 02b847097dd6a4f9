use bytes::Bytes;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::Message;
use crate::port::{MessageHandler, Publisher};
use crate::sender::TransportError;

#[derive(Debug, Clone, Copy)]
pub struct LocalBusConfig {
    /// Deliveries per message before it is discarded.
    pub max_attempts: u16,
    pub requeue_delay: Duration,
}

impl Default for LocalBusConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            requeue_delay: Duration::ZERO,
        }
    }
}

/// In-process loopback bus.
///
/// `publish` delivers the body to every subscriber of the topic before it
/// returns, each subscriber getting its own [`Message`]. A subscriber that
/// returns an error gets the message again, with `attempts` incremented,
/// until `max_attempts` deliveries have failed; then the message is
/// discarded. Publishing to a topic nobody subscribed to drops the body.
pub struct LocalBus {
    config: LocalBusConfig,
    subscribers: RwLock<HashMap<String, Vec<Arc<dyn MessageHandler>>>>,
    delivered: AtomicU64,
    requeued: AtomicU64,
    discarded: AtomicU64,
}

impl LocalBus {
    pub fn new(config: LocalBusConfig) -> Self {
        Self {
            config,
            subscribers: RwLock::new(HashMap::new()),
            delivered: AtomicU64::new(0),
            requeued: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self, topic: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        self.subscribers
            .write()
            .entry(topic.into())
            .or_default()
            .push(handler);
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.read().get(topic).map_or(0, Vec::len)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn requeued(&self) -> u64 {
        self.requeued.load(Ordering::Relaxed)
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    async fn dispatch(&self, topic: &str, body: Bytes) {
        let handlers = self
            .subscribers
            .read()
            .get(topic)
            .cloned()
            .unwrap_or_default();

        if handlers.is_empty() {
            debug!(topic, "No subscribers, dropping message");
            return;
        }

        for handler in handlers {
            self.deliver(handler.as_ref(), Message::new(body.clone())).await;
        }
    }

    async fn deliver(&self, handler: &dyn MessageHandler, mut message: Message) {
        loop {
            match handler.handle_message(&message).await {
                Ok(()) => {
                    self.delivered.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(e) if message.attempts < self.config.max_attempts => {
                    debug!(id = %message.id, attempts = message.attempts, error = %e, "Requeueing message");
                    self.requeued.fetch_add(1, Ordering::Relaxed);
                    message.attempts += 1;
                    if !self.config.requeue_delay.is_zero() {
                        tokio::time::sleep(self.config.requeue_delay).await;
                    }
                }
                Err(e) => {
                    warn!(id = %message.id, attempts = message.attempts, error = %e, "Discarding message after max attempts");
                    self.discarded.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            }
        }
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(LocalBusConfig::default())
    }
}

impl Publisher for LocalBus {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            self.dispatch(topic, body).await;
            Ok(())
        })
    }
}
