//! Tunables for locating the host and for the reminder scanner.
//!
//! Durations are stored as milliseconds so the config round-trips through the
//! JSON settings file unchanged.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbedConfig {
    /// Enumeration passes per spawn-message strategy.
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub spawn_timeout_ms: u64,
    /// Switch the content to software rendering while it is embedded.
    pub software_render_when_embedded: bool,
    pub reminder_poll_interval_ms: u64,
}

impl EmbedConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn spawn_timeout(&self) -> Duration {
        Duration::from_millis(self.spawn_timeout_ms)
    }

    pub fn reminder_poll_interval(&self) -> Duration {
        Duration::from_millis(self.reminder_poll_interval_ms)
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            retry_attempts: constants::LOCATE_RETRY_ATTEMPTS,
            retry_backoff_ms: constants::LOCATE_RETRY_BACKOFF.as_millis() as u64,
            spawn_timeout_ms: constants::SPAWN_WORKER_TIMEOUT.as_millis() as u64,
            software_render_when_embedded: true,
            reminder_poll_interval_ms: constants::REMINDER_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shell_timings() {
        let config = EmbedConfig::default();
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.retry_backoff(), Duration::from_millis(50));
        assert_eq!(config.spawn_timeout(), Duration::from_millis(1000));
        assert_eq!(config.reminder_poll_interval(), Duration::from_secs(30));
        assert!(config.software_render_when_embedded);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EmbedConfig = serde_json::from_str(r#"{ "retryAttempts": 8 }"#).unwrap();
        assert_eq!(config.retry_attempts, 8);
        assert_eq!(config.retry_backoff_ms, 50);
        assert!(config.software_render_when_embedded);
    }
}
