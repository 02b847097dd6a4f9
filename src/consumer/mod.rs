//! The consuming side: turning bus messages back into log entries.

pub mod local_bus;
pub mod log_consumer;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::codec::CodecError;
use crate::handler::HandlerError;

pub use local_bus::{LocalBus, LocalBusConfig};
pub use log_consumer::BusLogConsumer;

#[derive(Error, Debug)]
pub enum ConsumeError {
    #[error("Failed to decode message: {0}")]
    Decode(#[from] CodecError),
    #[error("Downstream handler failed: {0}")]
    Handler(#[from] HandlerError),
}

/// One delivery of a bus message.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub body: Bytes,
    /// 1 on first delivery, incremented on each redelivery.
    pub attempts: u16,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(body: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            body,
            attempts: 1,
            timestamp: Utc::now(),
        }
    }
}
