use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;

use super::HandlerError;
use crate::domain::LogEntry;
use crate::port::LogHandler;

/// Keeps every entry it receives, in arrival order.
#[derive(Default)]
pub struct MemoryHandler {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl LogHandler for MemoryHandler {
    fn handle_log<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), HandlerError>> {
        self.entries.lock().push(entry.clone());
        future::ready(Ok(())).boxed()
    }
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardHandler;

impl LogHandler for DiscardHandler {
    fn handle_log<'a>(&'a self, _entry: &'a LogEntry) -> BoxFuture<'a, Result<(), HandlerError>> {
        future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Level;

    #[tokio::test]
    async fn test_memory_handler_keeps_order() {
        let handler = MemoryHandler::new();
        for i in 0..3 {
            handler
                .handle_log(&LogEntry::new(Level::Info, i.to_string()))
                .await
                .unwrap();
        }

        let messages: Vec<_> = handler.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["0", "1", "2"]);

        handler.clear();
        assert!(handler.is_empty());
    }
}
