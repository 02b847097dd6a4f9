use bytes::Bytes;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::metrics::{PublishMetrics, PublishMetricsCollector};
use crate::domain::{FieldValue, Level, LogEntry};
use crate::handler::HandlerError;
use crate::port::{Encoder, LogHandler, Publisher};
use crate::reliability::{Backoff, BackoffConfig, FallbackSink};

tokio::task_local! {
    static PUBLISHING: ();
}

/// `true` while the current task is inside a worker's publish call.
pub fn in_publish_scope() -> bool {
    PUBLISHING.try_with(|_| ()).is_ok()
}

#[derive(Debug, Clone)]
pub struct AsyncPublishConfig {
    pub topic: String,
    /// Queue capacity; zero is treated as one.
    pub buffer_capacity: usize,
    pub backoff: BackoffConfig,
    /// How long `stop` waits for the worker to exit.
    pub stop_timeout: Duration,
}

impl Default for AsyncPublishConfig {
    fn default() -> Self {
        Self {
            topic: "log".to_string(),
            buffer_capacity: 1024,
            backoff: BackoffConfig::default(),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// An entry the queue would not take.
#[derive(Debug)]
pub struct Rejected {
    pub entry: LogEntry,
    /// `true` when the handler has stopped, `false` when the queue was full.
    pub stopped: bool,
}

/// Publishes entries from a background worker so logging never waits on the
/// bus.
///
/// `handle_log` only enqueues. When the queue is full, or the handler has
/// stopped, the entry goes to the fallback sink instead, together with a
/// warning. The worker publishes in FIFO order, retrying each failed entry
/// with exponential backoff until the next delay would pass the ceiling;
/// then the entry and an error report go to the fallback sink.
///
/// `stop` cancels a pending backoff sleep, hands the in-flight entry and
/// everything still queued to the fallback sink, and waits for the worker
/// to exit. A publish call already in progress is allowed to finish.
///
/// Must be constructed inside a Tokio runtime.
pub struct AsyncPublishHandler {
    sender: mpsc::Sender<LogEntry>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
    fallback: FallbackSink,
    metrics: Arc<PublishMetricsCollector>,
    topic: String,
    stop_timeout: Duration,
}

impl AsyncPublishHandler {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        publisher: Arc<dyn Publisher>,
        config: AsyncPublishConfig,
        fallback: Option<FallbackSink>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.buffer_capacity.max(1));
        let cancel = CancellationToken::new();
        let fallback = fallback.unwrap_or_default();
        let metrics = Arc::new(PublishMetricsCollector::new());

        let worker = PublishWorker {
            receiver,
            encoder,
            publisher,
            topic: config.topic.clone(),
            backoff: Backoff::new(config.backoff),
            fallback: fallback.clone(),
            metrics: Arc::clone(&metrics),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(worker.run());

        info!(
            topic = %config.topic,
            buffer_capacity = config.buffer_capacity,
            "Async publish handler started"
        );

        Self {
            sender,
            cancel,
            worker: Mutex::new(Some(handle)),
            fallback,
            metrics,
            topic: config.topic,
            stop_timeout: config.stop_timeout,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn fallback(&self) -> &FallbackSink {
        &self.fallback
    }

    pub fn metrics(&self) -> PublishMetrics {
        self.metrics.snapshot()
    }

    pub fn is_stopped(&self) -> bool {
        self.worker.lock().is_none()
    }

    /// Non-blocking enqueue. A rejected entry is handed back untouched so
    /// the caller can pass it to [`AsyncPublishHandler::divert`].
    pub fn try_enqueue(&self, entry: LogEntry) -> Result<(), Rejected> {
        match self.sender.try_send(entry) {
            Ok(()) => {
                self.metrics.record_enqueued();
                Ok(())
            }
            Err(TrySendError::Full(entry)) => {
                self.metrics.record_overflowed();
                Err(Rejected {
                    entry,
                    stopped: false,
                })
            }
            Err(TrySendError::Closed(entry)) => {
                self.metrics.record_overflowed();
                Err(Rejected {
                    entry,
                    stopped: true,
                })
            }
        }
    }

    /// Reports a rejected entry and hands it to the fallback sink.
    pub async fn divert(fallback: &FallbackSink, rejected: Rejected) {
        let message = if rejected.stopped {
            "AsyncPublishHandler is stopped, logging directly to fallback"
        } else {
            "AsyncPublishHandler log queue is full, logging directly to fallback"
        };
        fallback.record(Level::Warn, message, []).await;
        fallback.deliver(&rejected.entry).await;
    }

    /// Signals the worker and waits up to `stop_timeout` for it to exit.
    /// Calling it again after it returned is a no-op.
    pub async fn stop(&self) -> Result<(), HandlerError> {
        let worker = self.worker.lock().take();
        let Some(worker) = worker else {
            return Ok(());
        };

        debug!(topic = %self.topic, "Stopping async publish handler");
        self.cancel.cancel();

        match tokio::time::timeout(self.stop_timeout, worker).await {
            Ok(Ok(())) => {
                info!(topic = %self.topic, "Async publish handler stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(topic = %self.topic, error = %e, "Publish worker terminated abnormally");
                Err(HandlerError::WorkerFailed(e.to_string()))
            }
            Err(_) => {
                warn!(
                    topic = %self.topic,
                    timeout_ms = self.stop_timeout.as_millis() as u64,
                    "Publish worker did not stop in time"
                );
                Err(HandlerError::StopTimeout(self.stop_timeout))
            }
        }
    }
}

impl LogHandler for AsyncPublishHandler {
    fn handle_log<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            if let Err(rejected) = self.try_enqueue(entry.clone()) {
                Self::divert(&self.fallback, rejected).await;
            }
            Ok(())
        })
    }
}

impl Drop for AsyncPublishHandler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct PublishWorker {
    receiver: mpsc::Receiver<LogEntry>,
    encoder: Arc<dyn Encoder>,
    publisher: Arc<dyn Publisher>,
    topic: String,
    backoff: Backoff,
    fallback: FallbackSink,
    metrics: Arc<PublishMetricsCollector>,
    cancel: CancellationToken,
}

impl PublishWorker {
    async fn run(mut self) {
        debug!(topic = %self.topic, "Publish worker started");

        loop {
            let entry = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = self.receiver.recv() => match received {
                    Some(entry) => entry,
                    None => break,
                },
            };

            if self.process(entry).await.is_break() {
                break;
            }
        }

        self.drain().await;
        debug!(topic = %self.topic, "Publish worker exited");
    }

    /// Publishes one entry, retrying until it succeeds, the backoff
    /// ceiling is passed, or stop is requested. `Break` means stop.
    async fn process(&mut self, entry: LogEntry) -> ControlFlow<()> {
        let payload = match self.encoder.encode(&entry) {
            Ok(payload) => Bytes::from(payload),
            Err(e) => {
                self.metrics.record_failed();
                self.fallback
                    .record(
                        Level::Error,
                        "Failed to marshal log entry",
                        [("error", FieldValue::from(e.to_string()))],
                    )
                    .await;
                return ControlFlow::Continue(());
            }
        };

        let mut attempts: u64 = 0;
        loop {
            let publish = PUBLISHING.scope((), async {
                self.publisher.publish(&self.topic, payload.clone()).await
            });
            let err = match publish.await {
                Ok(()) => {
                    self.backoff.reset();
                    self.metrics.record_published();
                    return ControlFlow::Continue(());
                }
                Err(e) => e,
            };
            attempts += 1;

            let Some(delay) = self.backoff.next_delay() else {
                self.backoff.reset();
                self.metrics.record_failed();
                self.fallback
                    .record(
                        Level::Error,
                        "giving up publishing log entry",
                        [
                            ("error", FieldValue::from(err.to_string())),
                            ("attempts", FieldValue::from(attempts)),
                        ],
                    )
                    .await;
                self.fallback.deliver(&entry).await;
                return ControlFlow::Continue(());
            };

            self.metrics.record_retry();
            self.fallback
                .record(
                    Level::Info,
                    "Failed to publish log entry, backing off",
                    [
                        ("error", FieldValue::from(err.to_string())),
                        ("backoff", FieldValue::from(delay)),
                    ],
                )
                .await;

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.backoff.reset();
                    self.metrics.record_abandoned(1);
                    self.fallback
                        .record(
                            Level::Warn,
                            "Stopped while retrying, abandoning log entry",
                            [
                                ("error", FieldValue::from(err.to_string())),
                                ("attempts", FieldValue::from(attempts)),
                            ],
                        )
                        .await;
                    self.fallback.deliver(&entry).await;
                    return ControlFlow::Break(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Closes the queue and hands whatever is left to the fallback sink.
    async fn drain(&mut self) {
        self.receiver.close();

        let mut pending = Vec::new();
        while let Ok(entry) = self.receiver.try_recv() {
            pending.push(entry);
        }
        if pending.is_empty() {
            return;
        }

        self.metrics.record_abandoned(pending.len() as u64);
        self.fallback
            .record(
                Level::Warn,
                "Stopped with queued log entries, logging directly to fallback",
                [("pending", FieldValue::from(pending.len() as u64))],
            )
            .await;
        for entry in &pending {
            self.fallback.deliver(entry).await;
        }
    }
}
