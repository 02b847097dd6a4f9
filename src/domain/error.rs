use thiserror::Error;

use crate::app::{ConfigError, LoggingInitError};
use crate::codec::CodecError;
use crate::consumer::ConsumeError;
use crate::handler::HandlerError;
use crate::sender::TransportError;

/// Top-level error type for the log bus.
#[derive(Error, Debug)]
pub enum BusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Consume error: {0}")]
    Consume(#[from] ConsumeError),

    #[error("Logging setup error: {0}")]
    Logging(#[from] LoggingInitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
