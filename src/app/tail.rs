use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::config::{InputEncoding, TailConfig};
use super::shutdown_signal;
use crate::consumer::{BusLogConsumer, LocalBus};
use crate::domain::BusError;
use crate::handler::{
    CliHandler, ConsoleHandler, ConsoleTarget, Logger, ServiceFilter, ServiceFilterHandler,
};
use crate::port::{LogHandler, Publisher};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailStats {
    /// Bodies handed to the bus.
    pub messages: u64,
    /// Lines that did not hold a body in the configured input encoding.
    pub invalid: u64,
    /// Bodies the consumer gave up on.
    pub discarded: u64,
}

/// Prints the log entries carried by message bodies.
///
/// Each input line holds one body. Bodies go through an in-process
/// [`LocalBus`] to a [`BusLogConsumer`], which decodes them and hands the
/// entries to the service filter and then to the console.
pub struct TailApp {
    config: TailConfig,
    bus: Arc<LocalBus>,
}

impl TailApp {
    /// logfmt on stdout, or the cli renderer with `--cli`.
    pub fn from_config(config: TailConfig) -> Self {
        let sink: Arc<dyn LogHandler> = if config.cli {
            Arc::new(CliHandler::stdout().with_color(!config.no_color))
        } else {
            Arc::new(ConsoleHandler::new(ConsoleTarget::Stdout))
        };
        Self::with_sink(config, sink)
    }

    pub fn with_sink(config: TailConfig, sink: Arc<dyn LogHandler>) -> Self {
        let filter = (!config.services.is_empty())
            .then(|| ServiceFilter::new(config.services.iter().cloned()));
        let filtered = Arc::new(ServiceFilterHandler::new(sink, filter));
        let logger = Arc::new(Logger::new(filtered, config.min_level));

        let bus = Arc::new(LocalBus::new(config.local_bus_config()));
        bus.subscribe(
            config.topic.clone(),
            Arc::new(BusLogConsumer::new(logger, config.format.decoder())),
        );

        Self { config, bus }
    }

    pub fn config(&self) -> &TailConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<LocalBus> {
        &self.bus
    }

    /// Reads until EOF or `shutdown` resolves. Blank lines are skipped.
    pub async fn tail<R, F>(&self, reader: R, shutdown: F) -> Result<TailStats, BusError>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let mut segments = reader.split(b'\n');
        let mut stats = TailStats::default();
        let discarded_before = self.bus.discarded();
        tokio::pin!(shutdown);

        loop {
            let segment = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                segment = segments.next_segment() => match segment? {
                    Some(segment) => segment,
                    None => break,
                },
            };

            let body = match self.body_of(&segment) {
                Ok(Some(body)) => body,
                Ok(None) => continue,
                Err(e) => {
                    stats.invalid += 1;
                    warn!(error = %e, "Skipping undecodable input line");
                    continue;
                }
            };

            stats.messages += 1;
            self.bus.publish(&self.config.topic, body).await?;
        }

        stats.discarded = self.bus.discarded() - discarded_before;
        Ok(stats)
    }

    fn body_of(&self, line: &[u8]) -> Result<Option<Bytes>, base64::DecodeError> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.trim_ascii().is_empty() {
            return Ok(None);
        }
        match self.config.input {
            InputEncoding::Raw => Ok(Some(Bytes::copy_from_slice(line))),
            InputEncoding::Base64 => STANDARD.decode(line.trim_ascii()).map(|b| Some(b.into())),
        }
    }

    pub async fn run(self) -> Result<(), BusError> {
        info!(
            "Tailing topic={}, services={:?}, format={:?}, input={:?}",
            self.config.topic, self.config.services, self.config.format, self.config.input
        );

        let stdin = BufReader::new(tokio::io::stdin());
        let stats = self.tail(stdin, shutdown_signal()).await?;
        info!(
            messages = stats.messages,
            invalid = stats.invalid,
            discarded = stats.discarded,
            "rask-log-tail stopped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WireFormat;
    use crate::domain::{Level, LogEntry};
    use crate::handler::{MemoryHandler, SERVICE_FIELD};
    use crate::port::Encoder;

    fn json_line(entry: &LogEntry) -> Vec<u8> {
        let mut line = WireFormat::Json.encoder().encode(entry).unwrap().to_vec();
        line.push(b'\n');
        line
    }

    #[tokio::test]
    async fn test_raw_lines_reach_the_sink() {
        let memory = Arc::new(MemoryHandler::new());
        let config = TailConfig {
            format: WireFormat::Json,
            ..TailConfig::default()
        };
        let app = TailApp::with_sink(config, memory.clone());

        let mut input = json_line(&LogEntry::new(Level::Info, "one"));
        input.extend_from_slice(b"\r\n  \n");
        input.extend(json_line(
            &LogEntry::new(Level::Warn, "two").with_field(SERVICE_FIELD, "api"),
        ));

        let stats = app
            .tail(input.as_slice(), std::future::pending())
            .await
            .unwrap();
        assert_eq!(stats.messages, 2);
        assert_eq!(stats.invalid, 0);

        let messages: Vec<_> = memory.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_bad_base64_is_counted() {
        let memory = Arc::new(MemoryHandler::new());
        let config = TailConfig {
            input: InputEncoding::Base64,
            ..TailConfig::default()
        };
        let app = TailApp::with_sink(config, memory.clone());

        let input: &[u8] = b"%%%not base64%%%\n";
        let stats = app.tail(input, std::future::pending()).await.unwrap();
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.messages, 0);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_reading() {
        let app = TailApp::with_sink(TailConfig::default(), Arc::new(MemoryHandler::new()));
        let input: &[u8] = b"ignored\n";
        let stats = app.tail(input, async {}).await.unwrap();
        assert_eq!(stats, TailStats::default());
    }
}
