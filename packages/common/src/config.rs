use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Execution backend configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendAppConfig {
    /// Base URL of the Judge0-compatible execution service.
    /// Default: "http://localhost:2358".
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Per-request HTTP timeout in milliseconds. Default: 5000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Interval between result polls in milliseconds. Default: 250.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Ask the backend to judge synchronously in the submit call.
    /// Default: false (poll-based).
    #[serde(default)]
    pub synchronous: bool,
}

fn default_backend_url() -> String {
    "http://localhost:2358".into()
}
fn default_request_timeout_ms() -> u64 {
    5000
}
fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for BackendAppConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_ms: default_request_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            synchronous: false,
        }
    }
}

/// Dispatcher configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct DispatchAppConfig {
    /// Maximum submissions judged concurrently (slot pool size). Default: 8.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Wall-clock deadline for one whole submission in milliseconds.
    /// Default: 30000.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Retries after the initial backend attempt. Default: 3.
    #[serde(default = "default_max_retries")]
    pub max_retries: u8,
    /// Base retry delay in milliseconds. Default: 250.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum retry delay in milliseconds. Default: 10000.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_concurrent() -> usize {
    8
}
fn default_deadline_ms() -> u64 {
    30_000
}
fn default_max_retries() -> u8 {
    3
}
fn default_base_delay_ms() -> u64 {
    250
}
fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for DispatchAppConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            deadline_ms: default_deadline_ms(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl DispatchAppConfig {
    /// Retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_defaults() {
        let cfg = BackendAppConfig::default();
        assert_eq!(cfg.url, "http://localhost:2358");
        assert_eq!(cfg.poll_interval_ms, 250);
        assert!(!cfg.synchronous);
    }

    #[test]
    fn test_dispatch_defaults() {
        let cfg = DispatchAppConfig::default();
        assert_eq!(cfg.max_concurrent, 8);
        assert_eq!(cfg.deadline_ms, 30_000);
        assert_eq!(cfg.retry_policy().max_retries, 3);
    }

    #[test]
    fn test_sections_deserialize_empty() {
        let cfg: DispatchAppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.max_concurrent, 8);

        let cfg: BackendAppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.request_timeout_ms, 5000);
    }
}
