use super::{Config, ConfigError};
use url::Url;

const MAX_TOPIC_LEN: usize = 64;
const EPHEMERAL_SUFFIX: &str = "#ephemeral";

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_topic(&self.topic)?;

        if self.nsqd_http_address.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "At least one nsqd HTTP address is required".to_string(),
            ));
        }
        for address in &self.nsqd_http_address {
            let url = Url::parse(address).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid nsqd HTTP address '{address}': {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl(format!(
                    "nsqd HTTP address '{address}' must use http or https"
                )));
            }
        }

        if self.buffer_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "Buffer capacity must be greater than 0".to_string(),
            ));
        }

        if self.max_backoff_ms < self.backoff_base_ms {
            return Err(ConfigError::InvalidConfig(format!(
                "Max backoff ({}ms) must be at least the backoff base ({}ms)",
                self.max_backoff_ms, self.backoff_base_ms
            )));
        }

        // Validate timeouts
        if self.stop_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Stop timeout must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// nsqd topic names: 1 to 64 characters of `[.a-zA-Z0-9_-]`, optionally
/// ending in `#ephemeral`.
pub(super) fn validate_topic(topic: &str) -> Result<(), ConfigError> {
    let name = topic.strip_suffix(EPHEMERAL_SUFFIX).unwrap_or(topic);
    let valid = !name.is_empty()
        && topic.len() <= MAX_TOPIC_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfig(format!(
            "Invalid topic name '{topic}'"
        )))
    }
}
