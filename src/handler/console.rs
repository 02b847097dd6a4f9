use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::io::{self, Write};

use super::HandlerError;
use crate::codec::timestamp_text;
use crate::domain::LogEntry;
use crate::port::LogHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

/// Writes one logfmt line per entry:
/// `timestamp=… level=info message="hello" user=alice`.
///
/// Fields are written in key order. This is the default fallback sink.
pub struct ConsoleHandler {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleHandler {
    pub fn new(target: ConsoleTarget) -> Self {
        let writer: Box<dyn Write + Send> = match target {
            ConsoleTarget::Stdout => Box::new(io::stdout()),
            ConsoleTarget::Stderr => Box::new(io::stderr()),
        };
        Self::with_writer(writer)
    }

    pub fn stderr() -> Self {
        Self::new(ConsoleTarget::Stderr)
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn format_line(entry: &LogEntry) -> String {
        let mut line = format!(
            "timestamp={} level={} message={}",
            timestamp_text(&entry.timestamp),
            entry.level,
            quote(&entry.message)
        );
        for (key, value) in &entry.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(&quote(&value.to_string()));
        }
        line
    }

    fn write_entry(&self, entry: &LogEntry) -> io::Result<()> {
        let line = Self::format_line(entry);
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")?;
        writer.flush()
    }
}

fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '=' || c == '"');
    if needs_quotes {
        format!("{value:?}")
    } else {
        value.to_string()
    }
}

impl LogHandler for ConsoleHandler {
    fn handle_log<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), HandlerError>> {
        future::ready(self.write_entry(entry).map_err(HandlerError::from)).boxed()
    }
}
