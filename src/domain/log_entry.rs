use super::field::{FieldValue, Fields};
use super::log_level::Level;
use chrono::{DateTime, Utc};

/// One structured log record: the unit that crosses the bus.
///
/// Entries are produced by a [`Context`](crate::handler::Context), handed
/// to a handler, encoded by a codec on the producer side and rebuilt by a
/// decoder on the consumer side.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub fields: Fields,
}

impl LogEntry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            message: message.into(),
            fields: Fields::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

impl Default for LogEntry {
    /// The zero entry: debug level, Unix epoch, empty message, no fields.
    /// Decoders fill one of these in.
    fn default() -> Self {
        Self {
            level: Level::default(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            message: String::new(),
            fields: Fields::new(),
        }
    }
}
