pub mod config;
pub mod logging_system;
pub mod shutdown;
pub mod tail;

pub use config::{
    Config, ConfigError, InputEncoding, LogFormat, LogLevel, PublishMode, TailConfig,
};
pub use logging_system::{LoggingInitError, LoggingSystem, setup_logging_safe};
pub use shutdown::shutdown_signal;
pub use tail::{TailApp, TailStats};

use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::domain::{BusError, Level};
use crate::handler::{Logger, service_context};
use crate::port::{LogHandler, Publisher};
use crate::reliability::FallbackSink;
use crate::sender::{
    AsyncPublishHandler, FanoutPublisher, HttpPublisher, PublishMetrics, SyncPublishHandler,
};

enum PublishHandler {
    Sync(Arc<SyncPublishHandler>),
    Async(Arc<AsyncPublishHandler>),
}

impl PublishHandler {
    fn as_log_handler(&self) -> Arc<dyn LogHandler> {
        match self {
            PublishHandler::Sync(handler) => handler.clone(),
            PublishHandler::Async(handler) => handler.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    pub lines: u64,
    /// Lines the sync handler could not publish.
    pub failed: u64,
}

/// Forwards lines from a reader to the bus, one `info` entry per line,
/// tagged with the service context.
pub struct App {
    config: Config,
    handler: PublishHandler,
    logger: Arc<Logger>,
}

impl App {
    /// Publishes to every configured nsqd over HTTP.
    pub fn from_config(config: Config) -> Result<Self, BusError> {
        let publishers = config
            .http_publisher_configs()
            .into_iter()
            .map(|publisher| {
                HttpPublisher::new(publisher).map(|p| Arc::new(p) as Arc<dyn Publisher>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::with_publisher(
            config,
            Arc::new(FanoutPublisher::new(publishers)),
            None,
        ))
    }

    /// Must be called inside a Tokio runtime when `config.mode` is async.
    pub fn with_publisher(
        config: Config,
        publisher: Arc<dyn Publisher>,
        fallback: Option<FallbackSink>,
    ) -> Self {
        let encoder = config.format.encoder();
        let handler = match config.mode {
            PublishMode::Sync => PublishHandler::Sync(Arc::new(SyncPublishHandler::new(
                encoder,
                publisher,
                config.topic.clone(),
            ))),
            PublishMode::Async => PublishHandler::Async(Arc::new(AsyncPublishHandler::new(
                encoder,
                publisher,
                config.async_publish_config(),
                fallback,
            ))),
        };
        let logger = Arc::new(Logger::new(handler.as_log_handler(), Level::Debug));

        Self {
            config,
            handler,
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Metrics of the async handler; `None` in sync mode.
    pub fn metrics(&self) -> Option<PublishMetrics> {
        match &self.handler {
            PublishHandler::Async(handler) => Some(handler.metrics()),
            PublishHandler::Sync(_) => None,
        }
    }

    /// Reads until EOF or `shutdown` resolves. Blank lines are skipped.
    pub async fn forward<R, F>(&self, reader: R, shutdown: F) -> Result<ForwardStats, BusError>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let ctx = service_context(&self.logger);
        let mut lines = reader.lines();
        let mut stats = ForwardStats::default();
        tokio::pin!(shutdown);

        loop {
            let line = tokio::select! {
                _ = &mut shutdown => break,
                line = lines.next_line() => match line? {
                    Some(line) => line,
                    None => break,
                },
            };
            if line.trim().is_empty() {
                continue;
            }

            stats.lines += 1;
            if let Err(e) = ctx.info(line).await {
                stats.failed += 1;
                warn!(error = %e, topic = %self.config.topic, "Failed to publish line");
            }
        }

        Ok(stats)
    }

    /// Stops the async handler and logs its metrics.
    pub async fn shutdown(&self) -> Result<(), BusError> {
        if let PublishHandler::Async(handler) = &self.handler {
            handler.stop().await?;
            let metrics = handler.metrics();
            info!(
                enqueued = metrics.enqueued,
                published = metrics.published,
                overflowed = metrics.overflowed,
                retries = metrics.retries,
                failed = metrics.failed,
                abandoned = metrics.abandoned,
                "Publish metrics"
            );
        }
        Ok(())
    }

    pub async fn run(self) -> Result<(), BusError> {
        info!("Starting rask-log-bus v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Configuration: topic={}, nsqd={:?}, mode={:?}, format={:?}",
            self.config.topic, self.config.nsqd_http_address, self.config.mode, self.config.format
        );

        let stdin = BufReader::new(tokio::io::stdin());
        let forwarded = self.forward(stdin, shutdown_signal()).await;
        let stopped = self.shutdown().await;

        let stats = forwarded?;
        stopped?;
        info!(lines = stats.lines, failed = stats.failed, "rask-log-bus stopped");
        Ok(())
    }
}
