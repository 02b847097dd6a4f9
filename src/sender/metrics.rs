use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishMetrics {
    /// Entries accepted onto the queue.
    pub enqueued: u64,
    pub published: u64,
    /// Entries sent to the fallback sink because the queue was full or closed.
    pub overflowed: u64,
    /// Failed publish attempts that were retried.
    pub retries: u64,
    /// Entries given up on: backoff ceiling reached or encode failure.
    pub failed: u64,
    /// Entries handed to the fallback sink by stop.
    pub abandoned: u64,
}

impl PublishMetrics {
    /// Entries whose fate is settled one way or another.
    pub fn settled(&self) -> u64 {
        self.published + self.overflowed + self.failed + self.abandoned
    }
}

#[derive(Debug, Default)]
pub struct PublishMetricsCollector {
    enqueued: AtomicU64,
    published: AtomicU64,
    overflowed: AtomicU64,
    retries: AtomicU64,
    failed: AtomicU64,
    abandoned: AtomicU64,
}

impl PublishMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overflowed(&self) {
        self.overflowed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self, count: u64) {
        self.abandoned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PublishMetrics {
        PublishMetrics {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            overflowed: self.overflowed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}
