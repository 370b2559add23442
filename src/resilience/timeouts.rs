//! Per-attempt timeout enforcement.
//!
//! # Responsibilities
//! - Bound a single attempt, never the whole call
//! - Fire the attempt's abort signal when the bound is exceeded
//! - Release the expiry timer as soon as the attempt settles
//!
//! # Design Decisions
//! - A fresh controller per attempt; signals are never reused across attempts
//! - The expiry timer lives inside the `select!` and is dropped with it
//! - A timed-out attempt is an ordinary failure for the retry predicate

use std::time::Duration;

use crate::error::FetchError;
use crate::http::{RequestInit, Transport};
use crate::observability::metrics;
use crate::resilience::abort::{AbortController, AbortReason};

/// Issue one attempt, bounded by `timeout` when set.
pub async fn issue_attempt<T>(
    transport: &T,
    input: &T::Input,
    init: &RequestInit,
    timeout: Option<Duration>,
) -> Result<T::Response, FetchError>
where
    T: Transport + ?Sized,
{
    let Some(limit) = timeout else {
        return transport.request(input, init).await;
    };

    let controller = AbortController::new();
    let init = init.with_signal(controller.signal());

    tokio::select! {
        biased;
        res = transport.request(input, &init) => res,
        _ = tokio::time::sleep(limit) => {
            let reason = AbortReason::Timeout(limit);
            controller.abort(reason);
            tracing::warn!(timeout = ?limit, "Attempt timed out, aborting");
            metrics::record_timeout();
            Err(FetchError::Aborted(reason))
        }
    }
}
