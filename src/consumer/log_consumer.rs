use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::trace;

use super::{ConsumeError, Message};
use crate::handler::Logger;
use crate::port::{Decoder, MessageHandler};

/// Decodes bus messages and replays them into a logger.
///
/// Entries below the logger's level are dropped without error. Decode and
/// handler errors are returned so the messaging client requeues the
/// message; no retrying happens here.
pub struct BusLogConsumer {
    logger: Arc<Logger>,
    decoder: Arc<dyn Decoder>,
}

impl BusLogConsumer {
    pub fn new(logger: Arc<Logger>, decoder: Arc<dyn Decoder>) -> Self {
        Self { logger, decoder }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub async fn consume(&self, body: &[u8]) -> Result<(), ConsumeError> {
        let mut entry = self.logger.entry();
        self.decoder.decode(body, &mut entry)?;

        if !self.logger.enabled(entry.level) {
            trace!(level = %entry.level, "Dropping consumed entry below minimum level");
            return Ok(());
        }

        self.logger.handler().handle_log(&entry).await?;
        Ok(())
    }
}

impl MessageHandler for BusLogConsumer {
    fn handle_message<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, Result<(), ConsumeError>> {
        Box::pin(self.consume(&message.body))
    }
}
