use super::serde_helpers::{
    env_value, load_env_enum, load_env_list, load_env_path_opt, load_env_string, load_env_var,
};
use super::{ConfigError, LogFormat, LogLevel, PublishMode};
use crate::codec::WireFormat;
use crate::reliability::BackoffConfig;
use crate::sender::{AsyncPublishConfig, HttpPublisherConfig};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Topic log entries are published to
    #[arg(long, env = "RASK_BUS_TOPIC", default_value = "log")]
    pub topic: String,

    /// nsqd HTTP address; repeat (or comma-separate) to publish to several
    #[arg(
        long,
        env = "NSQD_HTTP_ADDRESS",
        value_delimiter = ',',
        default_value = "http://127.0.0.1:4151"
    )]
    pub nsqd_http_address: Vec<String>,

    /// Publish handler (sync surfaces errors, async queues and retries)
    #[arg(long, env = "PUBLISH_MODE", value_enum, default_value = "async")]
    pub mode: PublishMode,

    /// Wire format of published messages
    #[arg(long, env = "WIRE_FORMAT", value_enum, default_value = "protobuf")]
    pub format: WireFormat,

    /// Queue capacity of the async handler
    #[arg(long, env = "BUFFER_CAPACITY", default_value = "1024")]
    pub buffer_capacity: usize,

    /// Backoff base in milliseconds
    #[arg(long, env = "BACKOFF_BASE_MS", default_value = "1000")]
    pub backoff_base_ms: u64,

    /// Backoff ceiling in milliseconds; an entry is given up once exceeded
    #[arg(long, env = "MAX_BACKOFF_MS", default_value = "5000")]
    pub max_backoff_ms: u64,

    /// Randomize backoff delays by ±50%
    #[arg(long, env = "BACKOFF_JITTER")]
    pub backoff_jitter: bool,

    /// How long stopping waits for queued publishing to wind down
    #[arg(long, env = "STOP_TIMEOUT_MS", default_value = "5000")]
    pub stop_timeout_ms: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Diagnostic output format
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub backoff: BackoffConfig,

    #[serde(skip)]
    #[arg(skip)]
    pub stop_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic: "log".to_string(),
            nsqd_http_address: vec!["http://127.0.0.1:4151".to_string()],
            mode: PublishMode::Async,
            format: WireFormat::Protobuf,
            buffer_capacity: 1024,
            backoff_base_ms: 1000,
            max_backoff_ms: 5000,
            backoff_jitter: false,
            stop_timeout_ms: 5000,
            request_timeout_secs: 10,
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
            config_file: None,
            backoff: BackoffConfig::default(),
            stop_timeout: Duration::from_millis(5000),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Parses CLI arguments (with env fallbacks). When a config file is
    /// named, its contents replace the parsed values.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        if let Some(path) = config.config_file.clone() {
            let mut from_file = Self::from_file(&path)?;
            from_file.config_file = Some(path);
            return Ok(from_file);
        }
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        // Inline TOML takes precedence over individual variables
        if let Some(inline) = env_value("RASK_BUS_CONFIG") {
            return Self::from_toml_str(&inline);
        }

        let mut config = Config::default();

        load_env_string("RASK_BUS_TOPIC", &mut config.topic);
        load_env_list("NSQD_HTTP_ADDRESS", &mut config.nsqd_http_address);
        load_env_enum("PUBLISH_MODE", &mut config.mode)?;
        load_env_enum("WIRE_FORMAT", &mut config.format)?;
        load_env_var("BUFFER_CAPACITY", &mut config.buffer_capacity)?;
        load_env_var("BACKOFF_BASE_MS", &mut config.backoff_base_ms)?;
        load_env_var("MAX_BACKOFF_MS", &mut config.max_backoff_ms)?;
        load_env_var("BACKOFF_JITTER", &mut config.backoff_jitter)?;
        load_env_var("STOP_TIMEOUT_MS", &mut config.stop_timeout_ms)?;
        load_env_var("REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs)?;
        load_env_enum("LOG_LEVEL", &mut config.log_level)?;
        load_env_enum("RUST_LOG_FORMAT", &mut config.log_format)?;
        load_env_path_opt("CONFIG_FILE", &mut config.config_file);

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        // Convert milliseconds to Duration
        self.backoff = BackoffConfig {
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.max_backoff_ms),
            jitter: self.backoff_jitter,
        };
        self.stop_timeout = Duration::from_millis(self.stop_timeout_ms);
        self.request_timeout = Duration::from_secs(self.request_timeout_secs);

        self.nsqd_http_address = self
            .nsqd_http_address
            .iter()
            .map(|address| address.trim().to_string())
            .filter(|address| !address.is_empty())
            .collect();

        Ok(())
    }

    pub fn async_publish_config(&self) -> AsyncPublishConfig {
        AsyncPublishConfig {
            topic: self.topic.clone(),
            buffer_capacity: self.buffer_capacity,
            backoff: self.backoff,
            stop_timeout: self.stop_timeout,
        }
    }

    pub fn http_publisher_configs(&self) -> Vec<HttpPublisherConfig> {
        self.nsqd_http_address
            .iter()
            .map(|endpoint| HttpPublisherConfig {
                endpoint: endpoint.clone(),
                timeout: self.request_timeout,
                ..HttpPublisherConfig::default()
            })
            .collect()
    }
}
