use std::sync::Arc;
use tracing::error;

use crate::domain::{FieldValue, Level, LogEntry};
use crate::handler::{ConsoleHandler, Logger};
use crate::port::LogHandler;

/// Last-resort local sink for entries the asynchronous path cannot accept
/// or deliver, and for reports about those failures.
///
/// Cloning shares the underlying handler, so one sink can back any number
/// of publish handlers; the handler must tolerate concurrent calls.
#[derive(Clone)]
pub struct FallbackSink {
    logger: Arc<Logger>,
}

impl FallbackSink {
    pub fn new(handler: Arc<dyn LogHandler>) -> Self {
        Self {
            logger: Arc::new(Logger::new(handler, Level::Info)),
        }
    }

    /// logfmt lines on stderr.
    pub fn console() -> Self {
        Self::new(Arc::new(ConsoleHandler::stderr()))
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Logs a report about the delivery path. Reports below `info` are
    /// dropped by the sink's level.
    pub async fn record<I>(&self, level: Level, message: &str, fields: I)
    where
        I: IntoIterator<Item = (&'static str, FieldValue)>,
    {
        let result = self.logger.with_fields(fields).log(level, message).await;
        if let Err(e) = result {
            error!(error = %e, report = message, "Fallback sink rejected report");
        }
    }

    /// Hands an original entry straight to the sink's handler, whatever its
    /// level.
    pub async fn deliver(&self, entry: &LogEntry) {
        if let Err(e) = self.logger.handler().handle_log(entry).await {
            error!(error = %e, message = %entry.message, "Fallback sink rejected entry");
        }
    }
}

impl Default for FallbackSink {
    fn default() -> Self {
        Self::console()
    }
}
