//! Retry engine: a transport decorator running one attempt loop per call.
//!
//! # States
//! ```text
//! Issuing(n) ──▶ Deciding(n, outcome) ──▶ Settled(n, outcome)      predicate says stop
//!     ▲                    │
//!     │                    ▼
//!     └──────────── Retrying(n, outcome)                            predicate says retry
//!        n + 1        (delay computed, sleep)
//! ```
//!
//! # Design Decisions
//! - Loop state is owned by the call; nothing is shared between calls
//! - Attempts are strictly sequential; the engine spawns no tasks
//! - The delay function runs only after an affirmative retry decision
//! - The caller sees only the settled outcome, annotated with its retry count

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::error::{FetchError, FetchResult, RetryError};
use crate::http::{HttpResponse, RequestInit, Transport};
use crate::observability::metrics;
use crate::resilience::policy::{Delay, RetryDefaults, RetryOn, RetryOptions, RetryPolicy};
use crate::resilience::timeouts::issue_attempt;

/// Response of a retried call.
#[derive(Debug)]
pub struct RetryResponse<R> {
    response: R,
    retry_count: u32,
}

impl<R> RetryResponse<R> {
    /// Number of retries performed, i.e. the index of the attempt that produced this response.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn into_inner(self) -> R {
        self.response
    }

    pub fn into_parts(self) -> (R, u32) {
        (self.response, self.retry_count)
    }
}

impl<R> Deref for RetryResponse<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.response
    }
}

/// Attempt-loop state of one call.
pub(crate) enum LoopState<R> {
    Issuing(u32),
    Deciding(u32, Result<R, FetchError>),
    Retrying(u32, Result<R, FetchError>),
    Settled(u32, Result<R, FetchError>),
}

impl<R> RetryPolicy<R> {
    /// `Deciding` transition: consult the predicate.
    pub(crate) fn decide(&self, index: u32, outcome: Result<R, FetchError>) -> LoopState<R> {
        if self.should_retry(index, outcome.as_ref()) {
            LoopState::Retrying(index, outcome)
        } else {
            LoopState::Settled(index, outcome)
        }
    }
}

fn outcome_label<R>(outcome: &Result<R, FetchError>) -> &'static str {
    match outcome {
        Ok(_) => "response",
        Err(e) if e.is_aborted() => "aborted",
        Err(_) => "error",
    }
}

struct Shared<T: Transport> {
    transport: T,
    defaults: RetryDefaults<T::Response>,
}

/// A transport wrapped with retry behavior.
///
/// Cloning is cheap; clones share the transport and instance defaults.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use fetch_retry::{FetchRetry, RequestInit, ReqwestTransport};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FetchRetry::builder(ReqwestTransport::new())
///     .retries(5)
///     .retry_delay(Duration::from_millis(200))
///     .attempt_timeout(Duration::from_secs(2))
///     .build();
///
/// let response = client.fetch("https://example.com", &RequestInit::default()).await?;
/// println!("{} after {} retries", response.status(), response.retry_count());
/// # Ok(())
/// # }
/// ```
pub struct FetchRetry<T: Transport> {
    inner: Arc<Shared<T>>,
}

impl<T> FetchRetry<T>
where
    T: Transport,
    T::Response: 'static,
{
    /// Wrap `transport` with the built-in defaults.
    pub fn new(transport: T) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: T) -> FetchRetryBuilder<T> {
        FetchRetryBuilder {
            transport,
            options: RetryOptions::default(),
        }
    }

    /// Instance defaults every call starts from.
    pub fn defaults(&self) -> &RetryDefaults<T::Response> {
        &self.inner.defaults
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Issue `input` with the instance defaults.
    pub async fn fetch(&self, input: &T::Input, init: &RequestInit) -> FetchResult<T::Response> {
        self.fetch_with(input, init, RetryOptions::default()).await
    }

    /// Issue `input`, overriding instance defaults for this call only.
    pub async fn fetch_with(
        &self,
        input: &T::Input,
        init: &RequestInit,
        overrides: RetryOptions<T::Response>,
    ) -> FetchResult<T::Response> {
        let policy = RetryPolicy::resolve(&overrides, &self.inner.defaults);
        let span = tracing::debug_span!(
            "fetch",
            call_id = %Uuid::new_v4(),
            method = %init.method,
            max_retries = policy.max_retries(),
        );

        self.run(&policy, input, init).instrument(span).await
    }

    async fn run(
        &self,
        policy: &RetryPolicy<T::Response>,
        input: &T::Input,
        init: &RequestInit,
    ) -> FetchResult<T::Response> {
        let mut state = LoopState::Issuing(0);
        loop {
            state = match state {
                LoopState::Issuing(index) => {
                    tracing::debug!(attempt = index, "Issuing request");
                    let outcome = issue_attempt(
                        &self.inner.transport,
                        input,
                        init,
                        policy.attempt_timeout(),
                    )
                    .await;
                    metrics::record_attempt(outcome_label(&outcome));
                    LoopState::Deciding(index, outcome)
                }
                LoopState::Deciding(index, outcome) => policy.decide(index, outcome),
                LoopState::Retrying(index, outcome) => {
                    let delay = policy.delay(index, outcome.as_ref());
                    log_retry(index, delay, &outcome);
                    metrics::record_retry(delay);
                    drop(outcome);

                    if delay.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(delay).await;
                    }
                    LoopState::Issuing(index + 1)
                }
                LoopState::Settled(index, outcome) => return settle(index, outcome),
            };
        }
    }
}

fn log_retry<R: HttpResponse>(index: u32, delay: Duration, outcome: &Result<R, FetchError>) {
    match outcome {
        Ok(response) => tracing::info!(
            attempt = index,
            delay = ?delay,
            status = %response.status(),
            "Retrying request"
        ),
        Err(e) => tracing::info!(
            attempt = index,
            delay = ?delay,
            error = %e,
            "Retrying after error"
        ),
    }
}

fn settle<R: HttpResponse>(index: u32, outcome: Result<R, FetchError>) -> FetchResult<R> {
    match outcome {
        Ok(response) => {
            tracing::debug!(retry_count = index, status = %response.status(), "Request settled");
            metrics::record_call("ok", index);
            Ok(RetryResponse {
                response,
                retry_count: index,
            })
        }
        Err(error) => {
            tracing::debug!(retry_count = index, error = %error, "Request failed");
            metrics::record_call("err", index);
            Err(RetryError::new(error, index))
        }
    }
}

impl<T: Transport> Clone for FetchRetry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> fmt::Debug for FetchRetry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRetry")
            .field("defaults", &self.inner.defaults)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FetchRetry`]. Unset fields keep the built-in defaults.
pub struct FetchRetryBuilder<T: Transport> {
    transport: T,
    options: RetryOptions<T::Response>,
}

impl<T> FetchRetryBuilder<T>
where
    T: Transport,
    T::Response: 'static,
{
    pub fn retries(mut self, retries: u32) -> Self {
        self.options.retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, delay: impl Into<Delay<T::Response>>) -> Self {
        self.options.retry_delay = Some(delay.into());
        self
    }

    pub fn retry_on(mut self, retry_on: RetryOn<T::Response>) -> Self {
        self.options.retry_on = Some(retry_on);
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.options.attempt_timeout = Some(timeout);
        self
    }

    /// Replace every option at once, e.g. from [`crate::config::RetryConfig::to_options`].
    pub fn options(mut self, options: RetryOptions<T::Response>) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> FetchRetry<T> {
        let defaults = RetryDefaults::default().merged(&self.options);
        tracing::debug!(defaults = ?defaults, "Retry client configured");

        FetchRetry {
            inner: Arc::new(Shared {
                transport: self.transport,
                defaults,
            }),
        }
    }
}
