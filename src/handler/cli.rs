use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::io::{self, Write};

use super::HandlerError;
use crate::domain::{Level, LogEntry};
use crate::port::LogHandler;

const MESSAGE_WIDTH: usize = 25;

fn symbol(level: Level) -> &'static str {
    match level {
        Level::Debug | Level::Info | Level::Warn => "•",
        Level::Error | Level::Fatal => "⨯",
    }
}

fn color(level: Level) -> u8 {
    match level {
        Level::Debug => 37,
        Level::Info => 34,
        Level::Warn => 33,
        Level::Error | Level::Fatal => 31,
    }
}

/// Human-oriented terminal output, one line per entry:
///
/// ```text
///    • hello                     service=api user=alice
/// ```
///
/// The level symbol and field keys are colored with ANSI escapes unless
/// color is turned off. Fields are written in key order.
pub struct CliHandler {
    writer: Mutex<Box<dyn Write + Send>>,
    color: bool,
    padding: usize,
}

impl CliHandler {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            color: true,
            padding: 3,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn format_line(&self, entry: &LogEntry) -> String {
        let mut line = String::new();
        let width = self.padding + 1;
        let level = format!("{:>width$}", symbol(entry.level));
        line.push_str(&self.paint(entry.level, &level));
        line.push(' ');
        line.push_str(&format!("{:<width$}", entry.message, width = MESSAGE_WIDTH));

        for (key, value) in &entry.fields {
            line.push(' ');
            line.push_str(&self.paint(entry.level, key));
            line.push('=');
            line.push_str(&value.to_string());
        }
        line
    }

    fn paint(&self, level: Level, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{text}\x1b[0m", color(level))
        } else {
            text.to_string()
        }
    }

    fn write_entry(&self, entry: &LogEntry) -> io::Result<()> {
        let line = self.format_line(entry);
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")?;
        writer.flush()
    }
}

impl LogHandler for CliHandler {
    fn handle_log<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), HandlerError>> {
        future::ready(self.write_entry(entry).map_err(HandlerError::from)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> CliHandler {
        CliHandler::with_writer(Box::new(io::sink())).with_color(false)
    }

    #[test]
    fn test_plain_line() {
        let entry = LogEntry::new(Level::Info, "hello")
            .with_field("user", "alice")
            .with_field("service", "api");
        assert_eq!(
            plain().format_line(&entry),
            "   • hello                     service=api user=alice"
        );
    }

    #[test]
    fn test_errors_use_cross() {
        let line = plain().format_line(&LogEntry::new(Level::Error, "boom"));
        assert!(line.starts_with("   ⨯ boom"));
    }

    #[test]
    fn test_colored_keys() {
        let handler = CliHandler::with_writer(Box::new(io::sink()));
        let line = handler.format_line(&LogEntry::new(Level::Warn, "slow").with_field("ms", 900_i64));
        assert!(line.starts_with("\x1b[33m   •\x1b[0m slow"));
        assert!(line.ends_with(" \x1b[33mms\x1b[0m=900"));
    }
}
