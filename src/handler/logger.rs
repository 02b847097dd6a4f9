use std::fmt::Display;
use std::sync::Arc;

use super::HandlerError;
use crate::domain::{FieldValue, Fields, Level, LogEntry};
use crate::port::LogHandler;

/// A handler plus a minimum severity.
pub struct Logger {
    handler: Arc<dyn LogHandler>,
    level: Level,
}

impl Logger {
    pub fn new(handler: Arc<dyn LogHandler>, level: Level) -> Self {
        Self { handler, level }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn handler(&self) -> &Arc<dyn LogHandler> {
        &self.handler
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// A fresh zero entry for a decoder to fill in.
    pub fn entry(&self) -> LogEntry {
        LogEntry::default()
    }

    /// Forwards `entry` to the handler unless it is below the logger's level.
    pub async fn log(&self, entry: &LogEntry) -> Result<(), HandlerError> {
        if !self.enabled(entry.level) {
            return Ok(());
        }
        self.handler.handle_log(entry).await
    }

    pub fn context(self: &Arc<Self>) -> Context {
        Context {
            logger: Arc::clone(self),
            fields: Fields::new(),
        }
    }

    pub fn with_field(
        self: &Arc<Self>,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Context {
        self.context().with_field(key, value)
    }

    pub fn with_fields<I, K, V>(self: &Arc<Self>, fields: I) -> Context
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.context().with_fields(fields)
    }
}

/// A logger with accumulated fields. Cloning is cheap enough to derive a
/// new context per call site.
#[derive(Clone)]
pub struct Context {
    logger: Arc<Logger>,
    fields: Fields,
}

impl Context {
    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn with_field(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> Context {
        let mut ctx = self.clone();
        ctx.fields.insert(key.into(), value.into());
        ctx
    }

    pub fn with_fields<I, K, V>(&self, fields: I) -> Context
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut ctx = self.clone();
        ctx.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        ctx
    }

    pub fn with_error(&self, err: &dyn Display) -> Context {
        self.with_field("error", err.to_string())
    }

    /// Builds the entry this context would log, without logging it.
    pub fn entry(&self, level: Level, message: impl Into<String>) -> LogEntry {
        let mut entry = LogEntry::new(level, message);
        entry.fields = self.fields.clone();
        entry
    }

    pub async fn log(&self, level: Level, message: impl Into<String>) -> Result<(), HandlerError> {
        if !self.logger.enabled(level) {
            return Ok(());
        }
        let entry = self.entry(level, message);
        self.logger.handler.handle_log(&entry).await
    }

    pub async fn debug(&self, message: impl Into<String>) -> Result<(), HandlerError> {
        self.log(Level::Debug, message).await
    }

    pub async fn info(&self, message: impl Into<String>) -> Result<(), HandlerError> {
        self.log(Level::Info, message).await
    }

    pub async fn warn(&self, message: impl Into<String>) -> Result<(), HandlerError> {
        self.log(Level::Warn, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Result<(), HandlerError> {
        self.log(Level::Error, message).await
    }

    pub async fn fatal(&self, message: impl Into<String>) -> Result<(), HandlerError> {
        self.log(Level::Fatal, message).await
    }
}
