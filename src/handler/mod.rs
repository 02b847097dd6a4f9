//! Log handlers and the logging facade they plug into.
//!
//! - `Logger` / `Context`: build entries and route them to a handler
//! - `MemoryHandler`, `ConsoleHandler`, `CliHandler`, `DiscardHandler`:
//!   terminal sinks
//! - `service_context` / `ServiceFilterHandler`: tag entries with the
//!   producing process and replay only selected services

pub mod cli;
pub mod console;
pub mod filter;
pub mod logger;
pub mod memory;
pub mod service;

use std::time::Duration;
use thiserror::Error;

use crate::codec::CodecError;
use crate::sender::TransportError;

pub use cli::CliHandler;
pub use console::{ConsoleHandler, ConsoleTarget};
pub use filter::{ServiceFilter, ServiceFilterHandler};
pub use logger::{Context, Logger};
pub use memory::{DiscardHandler, MemoryHandler};
pub use service::{HOSTNAME_FIELD, PID_FIELD, SERVICE_FIELD, process_name, service_context};

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Encode failed: {0}")]
    Codec(#[from] CodecError),
    #[error("Publish failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Entry had a service field that was not a string (found {type_name})")]
    InvalidServiceField { type_name: &'static str },
    #[error("Background publisher did not stop within {0:?}")]
    StopTimeout(Duration),
    #[error("Background publisher failed: {0}")]
    WorkerFailed(String),
    #[error("Sink write failed: {0}")]
    Sink(#[from] std::io::Error),
}
