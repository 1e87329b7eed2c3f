//! Logger configuration.
//!
//! Settings are normally read from the environment:
//!
//! | Variable                  | Setting                           |
//! |---------------------------|-----------------------------------|
//! | `ARDOR_SUBMIT_LOGS_KEY`   | [`LoggerConfig::api_key`]           |
//! | `ARDOR_SERVICE_ID`        | [`LoggerConfig::service_id`]        |
//! | `ARDOR_LOGS_API_URL`      | [`LoggerConfig::logs_api_base_url`] |
//! | `ARDOR_PROXY_ENDPOINT`    | [`LoggerConfig::proxy_endpoint`]    |
//! | `ARDOR_REMOTE_LOG_LEVEL`  | [`LoggerConfig::min_remote_level`]  |
//!
//! Remote delivery is only switched on when both a key and a service id are
//! present.

use std::time::Duration;

use crate::LogLevel;

/// Variable holding the logs API key.
pub const API_KEY_VAR: &str = "ARDOR_SUBMIT_LOGS_KEY";
/// Variable holding the service id.
pub const SERVICE_ID_VAR: &str = "ARDOR_SERVICE_ID";
/// Variable holding the logs API base URL.
pub const LOGS_API_URL_VAR: &str = "ARDOR_LOGS_API_URL";
/// Variable holding the proxy endpoint.
pub const PROXY_ENDPOINT_VAR: &str = "ARDOR_PROXY_ENDPOINT";
/// Variable holding the minimum remote level.
pub const REMOTE_LOG_LEVEL_VAR: &str = "ARDOR_REMOTE_LOG_LEVEL";

/// Proxy path used when no logs API base URL is configured.
pub const DEFAULT_PROXY_ENDPOINT: &str = "/_debug";

/// How the logger filters, buffers and delivers.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    /// Lowest level written locally
    pub min_level: LogLevel,
    /// Lowest level buffered for remote delivery
    pub min_remote_level: LogLevel,
    /// Whether anything is written at all
    pub enabled: bool,
    /// Whether lines are buffered and flushed to the logs API
    pub remote_enabled: bool,
    /// Period of the flush loop
    pub flush_interval: Duration,
    /// Most entries kept in the buffer; the oldest are dropped first
    pub max_buffer_size: usize,
    /// Retries after a rate limit or transport failure
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further one
    pub retry_base_delay: Duration,
    /// Key sent with every batch
    pub api_key: String,
    /// Service the logs belong to
    pub service_id: String,
    /// Direct logs API base URL, empty to go through the proxy
    pub logs_api_base_url: String,
    /// Proxy path prefix
    pub proxy_endpoint: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            min_remote_level: LogLevel::Error,
            enabled: true,
            remote_enabled: false,
            flush_interval: Duration::from_secs(5),
            max_buffer_size: 100,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            api_key: String::new(),
            service_id: String::new(),
            logs_api_base_url: String::new(),
            proxy_endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
        }
    }
}

impl LoggerConfig {
    /// Configuration from the process environment. Debug builds log from
    /// [`LogLevel::Debug`] up.
    pub fn from_env() -> Self {
        Self::from_lookup(cfg!(debug_assertions), |name| std::env::var(name).ok())
    }

    /// Configuration from `lookup`, which resolves variable names to values.
    pub fn from_lookup(development: bool, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup(API_KEY_VAR).unwrap_or_default();
        let service_id = lookup(SERVICE_ID_VAR).unwrap_or_default();
        let min_remote_level = lookup(REMOTE_LOG_LEVEL_VAR)
            .and_then(|level| level.parse().ok())
            .unwrap_or(LogLevel::Error);

        Self {
            min_level: if development {
                LogLevel::Debug
            } else {
                LogLevel::Info
            },
            min_remote_level,
            remote_enabled: !api_key.is_empty() && !service_id.is_empty(),
            logs_api_base_url: lookup(LOGS_API_URL_VAR).unwrap_or_default(),
            proxy_endpoint: lookup(PROXY_ENDPOINT_VAR)
                .unwrap_or_else(|| DEFAULT_PROXY_ENDPOINT.to_string()),
            api_key,
            service_id,
            ..Self::default()
        }
    }

    /// Whether a key and a service id are both set.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.service_id.is_empty()
    }

    /// Where batches are submitted.
    pub fn endpoint(&self) -> String {
        let path = format!("/api/v1/services/{}/logs/submit", self.service_id);
        if self.logs_api_base_url.is_empty() {
            format!("{}{path}", self.proxy_endpoint)
        } else {
            format!("{}/solutions-api{path}", self.logs_api_base_url)
        }
    }

    /// Where beacon batches are submitted; the key travels in the query.
    pub fn beacon_endpoint(&self) -> String {
        format!("{}?api_key={}", self.endpoint(), self.api_key)
    }

    /// Delay before retry number `attempt` (counting from zero).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn it_stays_local_without_credentials() {
        let config = LoggerConfig::from_lookup(false, lookup(&[(SERVICE_ID_VAR, "svc")]));

        assert!(!config.remote_enabled);
        assert_eq!(config.min_level, LogLevel::Info);
        assert_eq!(config.min_remote_level, LogLevel::Error);
    }

    #[test]
    fn it_enables_remote_delivery_with_credentials() {
        let config = LoggerConfig::from_lookup(
            true,
            lookup(&[
                (API_KEY_VAR, "k-123"),
                (SERVICE_ID_VAR, "svc"),
                (REMOTE_LOG_LEVEL_VAR, "warn"),
            ]),
        );

        assert!(config.remote_enabled);
        assert_eq!(config.min_level, LogLevel::Debug);
        assert_eq!(config.min_remote_level, LogLevel::Warn);
    }

    #[test]
    fn it_falls_back_to_error_for_an_unknown_remote_level() {
        let config = LoggerConfig::from_lookup(false, lookup(&[(REMOTE_LOG_LEVEL_VAR, "LOUD")]));

        assert_eq!(config.min_remote_level, LogLevel::Error);
    }

    #[test]
    fn it_routes_through_the_proxy_without_a_base_url() {
        let config = LoggerConfig::from_lookup(
            false,
            lookup(&[(API_KEY_VAR, "k-123"), (SERVICE_ID_VAR, "svc")]),
        );

        assert_eq!(config.endpoint(), "/_debug/api/v1/services/svc/logs/submit");
        assert_eq!(
            config.beacon_endpoint(),
            "/_debug/api/v1/services/svc/logs/submit?api_key=k-123"
        );
    }

    #[test]
    fn it_targets_the_logs_api_directly_with_a_base_url() {
        let config = LoggerConfig::from_lookup(
            false,
            lookup(&[
                (SERVICE_ID_VAR, "svc"),
                (LOGS_API_URL_VAR, "https://logs.example"),
            ]),
        );

        assert_eq!(
            config.endpoint(),
            "https://logs.example/solutions-api/api/v1/services/svc/logs/submit"
        );
    }

    #[test]
    fn it_doubles_the_retry_delay() {
        let config = LoggerConfig::default();

        assert_eq!(config.retry_delay(0), Duration::from_secs(1));
        assert_eq!(config.retry_delay(1), Duration::from_secs(2));
        assert_eq!(config.retry_delay(2), Duration::from_secs(4));
    }
}
