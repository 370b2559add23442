//! Metrics collection.
//!
//! # Metrics
//! - `fetch_retry_attempts_total` (counter): attempts by outcome (response, error, aborted)
//! - `fetch_retry_retries_total` (counter): affirmative retry decisions
//! - `fetch_retry_timeouts_total` (counter): attempts aborted by the attempt timeout
//! - `fetch_retry_delay_seconds` (histogram): wait before each retry
//! - `fetch_retry_calls_total` (counter): settled calls by result (ok, err)
//! - `fetch_retry_call_retries` (histogram): retries performed per settled call
//!
//! Every function is a no-op until a recorder is installed.

use std::time::Duration;

use metrics::{counter, histogram};

/// Record one finished attempt.
pub fn record_attempt(outcome: &'static str) {
    counter!("fetch_retry_attempts_total", "outcome" => outcome).increment(1);
}

/// Record an affirmative retry decision and the delay it scheduled.
pub fn record_retry(delay: Duration) {
    counter!("fetch_retry_retries_total").increment(1);
    histogram!("fetch_retry_delay_seconds").record(delay.as_secs_f64());
}

pub fn record_timeout() {
    counter!("fetch_retry_timeouts_total").increment(1);
}

/// Record a settled call.
pub fn record_call(result: &'static str, retry_count: u32) {
    counter!("fetch_retry_calls_total", "result" => result).increment(1);
    histogram!("fetch_retry_call_retries").record(f64::from(retry_count));
}
