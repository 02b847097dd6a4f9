//! Publishing log entries onto the message bus.
//!
//! Two handlers share the same collaborators (an `Encoder` and a
//! `Publisher`) and differ in how they treat the caller:
//! - `SyncPublishHandler`: one publish per call, errors returned as-is
//! - `AsyncPublishHandler`: bounded queue plus a background worker that
//!   retries with backoff and reports failures to a `FallbackSink`

pub mod async_handler;
pub mod http;
pub mod metrics;
pub mod publisher;
pub mod sync_handler;

use thiserror::Error;

pub use async_handler::{AsyncPublishConfig, AsyncPublishHandler, Rejected};
pub use http::{HttpPublisher, HttpPublisherConfig};
pub use metrics::{PublishMetrics, PublishMetricsCollector};
pub use publisher::{FanoutPublisher, FnPublisher};
pub use sync_handler::SyncPublishHandler;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP error from {endpoint}: {status} - {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("No publishers configured")]
    NoPublishers,
    #[error("Publish failed: {0}")]
    Failed(String),
}
