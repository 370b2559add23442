//! Configuration schema definitions.
//!
//! This module defines the configuration file structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::policy::{
    Delay, RetryOn, RetryOptions, DEFAULT_DELAY, DEFAULT_RETRIES, DEFAULT_RETRY_STATUSES,
};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Instance retry defaults.
    pub retries: RetryConfig,

    /// reqwest client settings.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Delay strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Always wait `delay_ms`.
    #[default]
    Fixed,
    /// Start at `delay_ms`, double per retry, cap at `max_delay_ms`.
    Exponential,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,

    /// Delay between attempts in milliseconds (base delay for exponential).
    pub delay_ms: u64,

    /// Delay strategy.
    pub backoff: Backoff,

    /// Cap for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Response statuses that trigger a retry.
    pub retry_on: Vec<u16>,

    /// Per-attempt timeout in milliseconds.
    pub attempt_timeout_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRIES,
            delay_ms: DEFAULT_DELAY.as_millis() as u64,
            backoff: Backoff::Fixed,
            max_delay_ms: 10_000,
            retry_on: DEFAULT_RETRY_STATUSES.to_vec(),
            attempt_timeout_ms: None,
        }
    }
}

impl RetryConfig {
    /// Convert into retry options usable as client defaults.
    pub fn to_options<R>(&self) -> RetryOptions<R> {
        let delay = match self.backoff {
            Backoff::Fixed => Delay::from_millis(self.delay_ms),
            Backoff::Exponential => Delay::exponential(
                Duration::from_millis(self.delay_ms),
                Duration::from_millis(self.max_delay_ms),
            ),
        };

        let options = RetryOptions::new()
            .retries(self.max_retries)
            .retry_delay(delay)
            .retry_on(RetryOn::statuses(self.retry_on.iter().copied()));

        match self.attempt_timeout_ms {
            Some(ms) => options.attempt_timeout(Duration::from_millis(ms)),
            None => options,
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            user_agent: concat!("fetch-retry/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
