use super::validation::validate_topic;
use super::{ConfigError, InputEncoding, LogFormat, LogLevel};
use crate::codec::WireFormat;
use crate::consumer::LocalBusConfig;
use crate::domain::Level;
use clap::Parser;

/// Options of `rask-log-tail`.
#[derive(Parser, Debug, Clone)]
#[command(name = "rask-log-tail", author, version, about = "Print log entries from bus message bodies", long_about = None)]
pub struct TailConfig {
    /// Topic the bodies were published to
    #[arg(long, env = "RASK_BUS_TOPIC", default_value = "log")]
    pub topic: String,

    /// Only print entries of this service; repeat for several
    #[arg(long = "service", env = "TAIL_SERVICES", value_delimiter = ',')]
    pub services: Vec<String>,

    /// Human-oriented output instead of logfmt
    #[arg(long, env = "TAIL_CLI")]
    pub cli: bool,

    /// Disable ANSI colors in cli output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Wire format of the bodies
    #[arg(long, env = "WIRE_FORMAT", value_enum, default_value = "protobuf")]
    pub format: WireFormat,

    /// How bodies are laid out on stdin
    #[arg(long, env = "TAIL_INPUT", value_enum, default_value = "raw")]
    pub input: InputEncoding,

    /// Entries below this level are not printed
    #[arg(long, env = "TAIL_MIN_LEVEL", default_value = "debug")]
    pub min_level: Level,

    /// Deliveries per body before it is discarded
    #[arg(long, env = "TAIL_MAX_ATTEMPTS", default_value = "5")]
    pub max_attempts: u16,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: LogLevel,

    /// Diagnostic output format
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            topic: "log".to_string(),
            services: Vec::new(),
            cli: false,
            no_color: false,
            format: WireFormat::Protobuf,
            input: InputEncoding::Raw,
            min_level: Level::Debug,
            max_attempts: 5,
            log_level: LogLevel::Warn,
            log_format: LogFormat::Text,
        }
    }
}

impl TailConfig {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = TailConfig::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.post_process();
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) {
        self.services = self
            .services
            .iter()
            .map(|service| service.trim().to_string())
            .filter(|service| !service.is_empty())
            .collect();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_topic(&self.topic)?;
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "Max attempts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn local_bus_config(&self) -> LocalBusConfig {
        LocalBusConfig {
            max_attempts: self.max_attempts,
            ..LocalBusConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_services_and_cli() {
        let config = TailConfig::from_args([
            "rask-log-tail",
            "--service",
            "api",
            "--service",
            "worker, ",
            "--cli",
        ])
        .unwrap();

        assert_eq!(config.services, vec!["api", "worker"]);
        assert!(config.cli);
        assert_eq!(config.min_level, Level::Debug);
        assert_eq!(config.input, InputEncoding::Raw);
    }

    #[test]
    fn test_level_and_input_flags() {
        let config = TailConfig::from_args([
            "rask-log-tail",
            "--min-level",
            "warn",
            "--input",
            "base64",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(config.min_level, Level::Warn);
        assert_eq!(config.input, InputEncoding::Base64);
        assert_eq!(config.format, WireFormat::Json);
    }

    #[test]
    fn test_rejects_bad_topic_and_level() {
        assert!(matches!(
            TailConfig::from_args(["rask-log-tail", "--topic", "a b"]),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert!(TailConfig::from_args(["rask-log-tail", "--min-level", "loud"]).is_err());
    }
}
