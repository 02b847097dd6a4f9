#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Safe within realistic value bounds (durations, sizes)
    clippy::cast_precision_loss,      // Acceptable for metrics/display
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. CodecError in codec module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

//! Ships structured log entries over a message bus and replays them on
//! the consuming side.
//!
//! Producers log through a [`handler::Logger`] whose handler is a
//! [`sender::SyncPublishHandler`] or [`sender::AsyncPublishHandler`];
//! consumers feed bus messages to a [`consumer::BusLogConsumer`].

pub mod app;
pub mod codec;
pub mod consumer;
pub mod domain;
pub mod handler;
pub mod layer;
pub mod port;
pub mod reliability;
pub mod sender;

// Re-export main types for easy access
pub use app::{App, Config};
pub use codec::{CodecError, JsonCodec, ProtobufCodec, WireFormat};
pub use consumer::{BusLogConsumer, ConsumeError, LocalBus, Message};
pub use domain::{BusError, FieldValue, Fields, Level, LogEntry};
pub use handler::{Context, HandlerError, Logger, service_context};
pub use layer::BusLayer;
pub use reliability::{BackoffConfig, FallbackSink};
pub use sender::{AsyncPublishConfig, AsyncPublishHandler, SyncPublishHandler, TransportError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
