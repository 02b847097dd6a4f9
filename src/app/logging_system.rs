use super::config::{LogFormat, LogLevel};
use parking_lot::RwLock;
use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug, Clone)]
pub enum LoggingInitError {
    #[error("Invalid filter directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },
    #[error("Failed to create EnvFilter with '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
    #[error("Failed to set global tracing subscriber: {0}")]
    SubscriberInstall(String),
}

fn level_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Builds the `EnvFilter` for the process's own diagnostics.
#[derive(Default)]
pub struct LoggingSystem {
    directives: RwLock<Vec<String>>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_directive(&self, directive: &str) -> Result<(), LoggingInitError> {
        directive
            .parse::<Directive>()
            .map_err(|e| LoggingInitError::InvalidDirective {
                directive: directive.to_string(),
                reason: e.to_string(),
            })?;
        self.directives.write().push(directive.to_string());
        Ok(())
    }

    /// Quiets the HTTP stack underneath the publisher.
    pub fn add_default_directives(&self) -> Result<(), LoggingInitError> {
        for directive in ["hyper=warn", "reqwest=warn", "h2=warn"] {
            self.add_directive(directive)?;
        }
        Ok(())
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let directives = self.directives.read();
        let mut filter_parts = Vec::with_capacity(directives.len() + 1);
        // Default level first
        filter_parts.push(level_str(default_level).to_string());
        filter_parts.extend(directives.iter().cloned());
        filter_parts.join(",")
    }

    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }

    pub fn initialize_tracing(
        &self,
        default_level: LogLevel,
        format: LogFormat,
    ) -> Result<(), LoggingInitError> {
        let filter = self.build_filter_string(default_level);
        let env_filter =
            EnvFilter::try_new(&filter).map_err(|e| LoggingInitError::InvalidFilter {
                filter: filter.clone(),
                reason: e.to_string(),
            })?;

        let registry = tracing_subscriber::registry().with(env_filter);
        let result = match format {
            LogFormat::Json => tracing::subscriber::set_global_default(
                registry.with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                ),
            ),
            LogFormat::Text => tracing::subscriber::set_global_default(
                registry.with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .compact()
                        .with_writer(std::io::stderr),
                ),
            ),
        };

        result.map_err(|e| LoggingInitError::SubscriberInstall(e.to_string()))
    }
}

/// Installs the global subscriber once; later calls return the outcome of
/// the first.
pub fn setup_logging_safe(level: LogLevel, format: LogFormat) -> Result<(), LoggingInitError> {
    static INIT: OnceLock<Result<(), LoggingInitError>> = OnceLock::new();

    INIT.get_or_init(|| {
        let logging_system = LoggingSystem::new();
        logging_system.add_default_directives()?;
        logging_system.initialize_tracing(level, format)
    })
    .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_string() {
        let logging_system = LoggingSystem::new();
        assert_eq!(logging_system.build_filter_string(LogLevel::Info), "info");

        logging_system.add_default_directives().unwrap();
        assert_eq!(
            logging_system.build_filter_string(LogLevel::Debug),
            "debug,hyper=warn,reqwest=warn,h2=warn"
        );
    }

    #[test]
    fn test_invalid_directive_is_rejected() {
        let logging_system = LoggingSystem::new();
        assert!(matches!(
            logging_system.add_directive("target=loudest"),
            Err(LoggingInitError::InvalidDirective { .. })
        ));
        assert_eq!(logging_system.directive_count(), 0);
    }

    #[test]
    fn test_setup_logging_safe_is_idempotent() {
        let first = setup_logging_safe(LogLevel::Info, LogFormat::Text);
        let second = setup_logging_safe(LogLevel::Debug, LogFormat::Json);
        assert_eq!(first.is_ok(), second.is_ok());
    }
}
