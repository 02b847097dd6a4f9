//! Capability traits at the seams between the bus adapter and its
//! collaborators.
//!
//! The async traits are dyn-compatible by returning boxed futures instead
//! of `impl Future`, so handlers and publishers can be stored as
//! `Arc<dyn …>` and swapped for fakes in tests.

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::codec::CodecError;
use crate::consumer::{ConsumeError, Message};
use crate::domain::LogEntry;
use crate::handler::HandlerError;
use crate::sender::TransportError;

/// Receives finished log entries: terminal sinks, filters and publish
/// handlers all implement this.
pub trait LogHandler: Send + Sync {
    fn handle_log<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), HandlerError>>;
}

/// Turns an entry into a message body.
pub trait Encoder: Send + Sync {
    fn encode(&self, entry: &LogEntry) -> Result<Vec<u8>, CodecError>;
}

/// Rebuilds an entry from a message body, merging into `entry`.
pub trait Decoder: Send + Sync {
    fn decode(&self, data: &[u8], entry: &mut LogEntry) -> Result<(), CodecError>;
}

/// Pushes a message body onto a topic of the messaging transport.
///
/// Implementations that fan out to several endpoints should treat any
/// single endpoint failure as failure of the whole call.
pub trait Publisher: Send + Sync {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, Result<(), TransportError>>;
}

/// Invoked by a messaging client once per delivered message. An `Err`
/// asks the client to requeue.
pub trait MessageHandler: Send + Sync {
    fn handle_message<'a>(
        &'a self,
        message: &'a Message,
    ) -> BoxFuture<'a, Result<(), ConsumeError>>;
}
