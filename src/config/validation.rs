//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (status codes, timeouts, backoff caps)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted; the engine itself never validates

use thiserror::Error;

use crate::config::schema::{Backoff, ClientConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("retries.retry_on contains invalid HTTP status {0}")]
    InvalidStatus(u16),

    #[error("retries.attempt_timeout_ms must be greater than 0")]
    ZeroAttemptTimeout,

    #[error("retries.max_delay_ms ({max_delay_ms}) is below retries.delay_ms ({delay_ms})")]
    BackoffCapTooLow { delay_ms: u64, max_delay_ms: u64 },

    #[error("http.connect_timeout_ms must be greater than 0")]
    ZeroConnectTimeout,

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let retries = &config.retries;

    for &status in &retries.retry_on {
        if !(100..=599).contains(&status) {
            errors.push(ValidationError::InvalidStatus(status));
        }
    }

    if retries.attempt_timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroAttemptTimeout);
    }

    if retries.backoff == Backoff::Exponential && retries.max_delay_ms < retries.delay_ms {
        errors.push(ValidationError::BackoffCapTooLow {
            delay_ms: retries.delay_ms,
            max_delay_ms: retries.max_delay_ms,
        });
    }

    if config.http.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
