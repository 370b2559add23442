//! Error definitions shared by the transport and the retry engine.

use thiserror::Error;

use crate::resilience::abort::AbortReason;

/// Errors a single attempt can fail with.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The reqwest transport failed (connect, TLS, body, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A custom transport reported a failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Socket-level failure from a custom transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The attempt was cancelled through its abort signal.
    #[error("Request aborted: {0}")]
    Aborted(AbortReason),
}

impl FetchError {
    /// Build a transport error from any message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// True when the attempt ended because its abort signal fired.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

/// Terminal failure of a retried call.
///
/// Carries the error of the last attempt and how many retries were
/// performed before giving up.
#[derive(Debug, Error)]
#[error("{source} (after {retry_count} retries)")]
pub struct RetryError {
    #[source]
    source: FetchError,
    retry_count: u32,
}

impl RetryError {
    pub(crate) fn new(source: FetchError, retry_count: u32) -> Self {
        Self { source, retry_count }
    }

    /// Number of retries performed, i.e. the index of the final attempt.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Error of the final attempt.
    pub fn error(&self) -> &FetchError {
        &self.source
    }

    pub fn into_error(self) -> FetchError {
        self.source
    }

    pub fn is_aborted(&self) -> bool {
        self.source.is_aborted()
    }
}

/// Result type of a retried call.
pub type FetchResult<R> = Result<crate::resilience::RetryResponse<R>, RetryError>;
