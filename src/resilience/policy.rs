//! Retry policy: delay strategy, retry predicate and option merging.
//!
//! # Resolution
//! ```text
//! built-in defaults (3 retries, 500ms, statuses 419/503/504, no timeout)
//!     ← builder options           (instance defaults)
//!         ← per-call RetryOptions (call overrides)
//!             → RetryPolicy       (resolved once per call, immutable)
//! ```
//!
//! # Design Decisions
//! - `None` is the only "unset" value; a set field always wins
//! - Delay and retry-on unions are turned into plain callables at resolution
//! - A custom predicate replaces the default one entirely, ceiling included

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;
use crate::http::HttpResponse;
use crate::resilience::backoff::exponential_delay;

/// Retries performed when nothing else is configured.
pub const DEFAULT_RETRIES: u32 = 3;

/// Delay between attempts when nothing else is configured.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Statuses retried by the default predicate.
pub const DEFAULT_RETRY_STATUSES: [u16; 3] = [419, 503, 504];

/// One attempt of a call, as seen by delay and retry functions.
pub struct Attempt<'a, R> {
    /// Zero-based attempt index.
    pub index: u32,
    /// Retry ceiling of the resolved policy.
    pub max_retries: u32,
    /// What the transport produced.
    pub outcome: Result<&'a R, &'a FetchError>,
}

impl<'a, R> Attempt<'a, R> {
    pub fn error(&self) -> Option<&'a FetchError> {
        self.outcome.err()
    }

    pub fn response(&self) -> Option<&'a R> {
        self.outcome.ok()
    }
}

pub type DelayFn<R> = Arc<dyn Fn(&Attempt<'_, R>) -> Duration + Send + Sync>;
pub type PredicateFn<R> = Arc<dyn Fn(&Attempt<'_, R>) -> bool + Send + Sync>;

/// Wait before the next attempt.
pub enum Delay<R> {
    Fixed(Duration),
    Computed(DelayFn<R>),
}

impl<R> Delay<R> {
    pub fn fixed(delay: Duration) -> Self {
        Delay::Fixed(delay)
    }

    pub fn from_millis(ms: u64) -> Self {
        Delay::Fixed(Duration::from_millis(ms))
    }

    /// Compute the delay from the attempt being retried.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Attempt<'_, R>) -> Duration + Send + Sync + 'static,
    {
        Delay::Computed(Arc::new(f))
    }

    /// Exponential backoff with jitter, capped at `max`.
    ///
    /// The first retry waits `base`, each following one doubles it.
    pub fn exponential(base: Duration, max: Duration) -> Self {
        Delay::computed(move |attempt| exponential_delay(attempt.index.saturating_add(1), base, max))
    }
}

impl<R: 'static> Delay<R> {
    fn into_fn(self) -> DelayFn<R> {
        match self {
            Delay::Fixed(delay) => Arc::new(move |_: &Attempt<'_, R>| delay),
            Delay::Computed(f) => f,
        }
    }
}

impl<R> Clone for Delay<R> {
    fn clone(&self) -> Self {
        match self {
            Delay::Fixed(delay) => Delay::Fixed(*delay),
            Delay::Computed(f) => Delay::Computed(f.clone()),
        }
    }
}

impl<R> fmt::Debug for Delay<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delay::Fixed(delay) => f.debug_tuple("Fixed").field(delay).finish(),
            Delay::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<R> From<Duration> for Delay<R> {
    fn from(delay: Duration) -> Self {
        Delay::Fixed(delay)
    }
}

/// Which outcomes are retried.
pub enum RetryOn<R> {
    /// Default predicate over this status list: errors and listed statuses
    /// are retried while the attempt index is below the ceiling.
    Statuses(Vec<u16>),
    /// Custom predicate. Responsible for its own ceiling.
    Predicate(PredicateFn<R>),
}

impl<R> RetryOn<R> {
    pub fn statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        RetryOn::Statuses(statuses.into_iter().collect())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Attempt<'_, R>) -> bool + Send + Sync + 'static,
    {
        RetryOn::Predicate(Arc::new(f))
    }
}

impl<R: HttpResponse + 'static> RetryOn<R> {
    fn into_fn(self) -> PredicateFn<R> {
        match self {
            RetryOn::Statuses(statuses) => default_predicate(statuses),
            RetryOn::Predicate(f) => f,
        }
    }
}

impl<R> Default for RetryOn<R> {
    fn default() -> Self {
        RetryOn::Statuses(DEFAULT_RETRY_STATUSES.to_vec())
    }
}

impl<R> Clone for RetryOn<R> {
    fn clone(&self) -> Self {
        match self {
            RetryOn::Statuses(statuses) => RetryOn::Statuses(statuses.clone()),
            RetryOn::Predicate(f) => RetryOn::Predicate(f.clone()),
        }
    }
}

impl<R> fmt::Debug for RetryOn<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryOn::Statuses(statuses) => f.debug_tuple("Statuses").field(statuses).finish(),
            RetryOn::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Default retry predicate over a status list.
///
/// Retries when the attempt failed or its status is listed, and only while
/// `index < max_retries`.
pub fn default_predicate<R: HttpResponse + 'static>(statuses: Vec<u16>) -> PredicateFn<R> {
    Arc::new(move |attempt: &Attempt<'_, R>| {
        let retry_worthy = match attempt.outcome {
            Err(_) => true,
            Ok(response) => statuses.contains(&response.status().as_u16()),
        };
        retry_worthy && attempt.index < attempt.max_retries
    })
}

/// Partial retry settings. Every `None` falls through to the next layer.
pub struct RetryOptions<R> {
    pub retries: Option<u32>,
    pub retry_delay: Option<Delay<R>>,
    pub retry_on: Option<RetryOn<R>>,
    pub attempt_timeout: Option<Duration>,
}

impl<R> RetryOptions<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, delay: impl Into<Delay<R>>) -> Self {
        self.retry_delay = Some(delay.into());
        self
    }

    pub fn retry_on(mut self, retry_on: RetryOn<R>) -> Self {
        self.retry_on = Some(retry_on);
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }
}

impl<R> Default for RetryOptions<R> {
    fn default() -> Self {
        Self {
            retries: None,
            retry_delay: None,
            retry_on: None,
            attempt_timeout: None,
        }
    }
}

impl<R> Clone for RetryOptions<R> {
    fn clone(&self) -> Self {
        Self {
            retries: self.retries,
            retry_delay: self.retry_delay.clone(),
            retry_on: self.retry_on.clone(),
            attempt_timeout: self.attempt_timeout,
        }
    }
}

impl<R> fmt::Debug for RetryOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("retry_on", &self.retry_on)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

/// Complete retry settings held by a client as its instance defaults.
pub struct RetryDefaults<R> {
    pub retries: u32,
    pub retry_delay: Delay<R>,
    pub retry_on: RetryOn<R>,
    pub attempt_timeout: Option<Duration>,
}

impl<R> RetryDefaults<R> {
    /// Layer `overrides` on top of these settings.
    pub fn merged(&self, overrides: &RetryOptions<R>) -> Self {
        Self {
            retries: overrides.retries.unwrap_or(self.retries),
            retry_delay: overrides
                .retry_delay
                .clone()
                .unwrap_or_else(|| self.retry_delay.clone()),
            retry_on: overrides
                .retry_on
                .clone()
                .unwrap_or_else(|| self.retry_on.clone()),
            attempt_timeout: overrides.attempt_timeout.or(self.attempt_timeout),
        }
    }
}

impl<R> Default for RetryDefaults<R> {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            retry_delay: Delay::Fixed(DEFAULT_DELAY),
            retry_on: RetryOn::default(),
            attempt_timeout: None,
        }
    }
}

impl<R> Clone for RetryDefaults<R> {
    fn clone(&self) -> Self {
        Self {
            retries: self.retries,
            retry_delay: self.retry_delay.clone(),
            retry_on: self.retry_on.clone(),
            attempt_timeout: self.attempt_timeout,
        }
    }
}

impl<R> fmt::Debug for RetryDefaults<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryDefaults")
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("retry_on", &self.retry_on)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

/// Retry parameters governing one call.
pub struct RetryPolicy<R> {
    max_retries: u32,
    delay: DelayFn<R>,
    should_retry: PredicateFn<R>,
    attempt_timeout: Option<Duration>,
}

impl<R: HttpResponse + 'static> RetryPolicy<R> {
    /// Merge call overrides over instance defaults and resolve the result.
    pub fn resolve(overrides: &RetryOptions<R>, defaults: &RetryDefaults<R>) -> Self {
        Self::from(defaults.merged(overrides))
    }
}

impl<R: HttpResponse + 'static> From<RetryDefaults<R>> for RetryPolicy<R> {
    fn from(settings: RetryDefaults<R>) -> Self {
        Self {
            max_retries: settings.retries,
            delay: settings.retry_delay.into_fn(),
            should_retry: settings.retry_on.into_fn(),
            attempt_timeout: settings.attempt_timeout,
        }
    }
}

impl<R> RetryPolicy<R> {
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    fn attempt<'a>(&self, index: u32, outcome: Result<&'a R, &'a FetchError>) -> Attempt<'a, R> {
        Attempt {
            index,
            max_retries: self.max_retries,
            outcome,
        }
    }

    /// Ask the predicate whether attempt `index` should be followed by another.
    pub fn should_retry(&self, index: u32, outcome: Result<&R, &FetchError>) -> bool {
        (self.should_retry)(&self.attempt(index, outcome))
    }

    /// Delay before the attempt following `index`.
    pub fn delay(&self, index: u32, outcome: Result<&R, &FetchError>) -> Duration {
        (self.delay)(&self.attempt(index, outcome))
    }
}

impl<R> fmt::Debug for RetryPolicy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    type Resp = http::Response<()>;

    fn response(status: u16) -> Resp {
        http::Response::builder().status(status).body(()).unwrap()
    }

    #[test]
    fn test_builtin_defaults() {
        let policy = RetryPolicy::<Resp>::from(RetryDefaults::default());
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.attempt_timeout(), None);

        let ok = response(200);
        assert_eq!(policy.delay(0, Ok(&ok)), Duration::from_millis(500));
    }

    #[test]
    fn test_default_predicate_statuses() {
        let policy = RetryPolicy::<Resp>::from(RetryDefaults::default());

        for status in [419, 503, 504] {
            assert!(policy.should_retry(0, Ok(&response(status))), "{} should retry", status);
        }
        for status in [200, 404, 500, 502] {
            assert!(!policy.should_retry(0, Ok(&response(status))), "{} should not retry", status);
        }

        let err = FetchError::transport("boom");
        assert!(policy.should_retry(2, Err(&err)));
    }

    #[test]
    fn test_default_predicate_enforces_ceiling() {
        let policy = RetryPolicy::<Resp>::from(RetryDefaults::default());
        let err = FetchError::transport("boom");

        assert!(policy.should_retry(2, Err(&err)));
        assert!(!policy.should_retry(3, Err(&err)));
        assert!(!policy.should_retry(3, Ok(&response(503))));
    }

    #[test]
    fn test_zero_retries_never_retries() {
        let defaults = RetryDefaults::<Resp>::default();
        let policy = RetryPolicy::resolve(&RetryOptions::new().retries(0), &defaults);
        let err = FetchError::transport("boom");

        assert!(!policy.should_retry(0, Err(&err)));
        assert!(!policy.should_retry(0, Ok(&response(503))));
    }

    #[test]
    fn test_custom_status_list() {
        let defaults = RetryDefaults::<Resp>::default();
        let overrides = RetryOptions::new().retry_on(RetryOn::statuses([500, 502]));
        let policy = RetryPolicy::resolve(&overrides, &defaults);

        assert!(policy.should_retry(0, Ok(&response(500))));
        assert!(!policy.should_retry(0, Ok(&response(503))));
    }

    #[test]
    fn test_custom_predicate_has_no_implicit_ceiling() {
        let defaults = RetryDefaults::<Resp>::default();
        let overrides = RetryOptions::new()
            .retries(1)
            .retry_on(RetryOn::predicate(|_| true));
        let policy = RetryPolicy::resolve(&overrides, &defaults);

        assert!(policy.should_retry(10, Ok(&response(200))));
    }

    #[test]
    fn test_predicate_sees_attempt_context() {
        let defaults = RetryDefaults::<Resp>::default();
        let overrides = RetryOptions::new()
            .retries(7)
            .retry_on(RetryOn::predicate(|attempt: &Attempt<'_, Resp>| {
                attempt.max_retries == 7
                    && attempt.error().is_none()
                    && attempt.response().map(|r| r.status().as_u16()) == Some(418)
            }));
        let policy = RetryPolicy::resolve(&overrides, &defaults);

        assert!(policy.should_retry(0, Ok(&response(418))));
        assert!(!policy.should_retry(0, Ok(&response(200))));
    }

    #[test]
    fn test_overrides_shadow_instance_defaults() {
        let instance_calls = Arc::new(AtomicU32::new(0));
        let counter = instance_calls.clone();
        let instance = RetryDefaults::<Resp> {
            retries: 1,
            retry_delay: Delay::computed({
                let counter = counter.clone();
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Duration::ZERO
                }
            }),
            retry_on: RetryOn::predicate(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            }),
            attempt_timeout: Some(Duration::from_secs(1)),
        };

        let overrides = RetryOptions::new()
            .retries(2)
            .retry_delay(Duration::ZERO)
            .retry_on(RetryOn::statuses(DEFAULT_RETRY_STATUSES));
        let policy = RetryPolicy::resolve(&overrides, &instance);

        assert_eq!(policy.max_retries(), 2);
        assert_eq!(policy.attempt_timeout(), Some(Duration::from_secs(1)));
        assert!(policy.should_retry(0, Ok(&response(503))));
        assert_eq!(policy.delay(0, Ok(&response(503))), Duration::ZERO);
        assert_eq!(instance_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unset_overrides_fall_through() {
        let instance = RetryDefaults::<Resp> {
            retries: 5,
            retry_delay: Delay::from_millis(20),
            retry_on: RetryOn::statuses([429]),
            attempt_timeout: None,
        };
        let merged = instance.merged(&RetryOptions::new().attempt_timeout(Duration::from_millis(50)));

        assert_eq!(merged.retries, 5);
        assert!(matches!(merged.retry_delay, Delay::Fixed(d) if d == Duration::from_millis(20)));
        assert!(matches!(merged.retry_on, RetryOn::Statuses(ref s) if s == &[429]));
        assert_eq!(merged.attempt_timeout, Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_exponential_delay_grows() {
        let delay = Delay::<Resp>::exponential(Duration::from_millis(100), Duration::from_millis(1000));
        let policy = RetryPolicy::from(RetryDefaults {
            retry_delay: delay,
            ..RetryDefaults::default()
        });
        let err = FetchError::transport("boom");

        let first = policy.delay(0, Err(&err));
        let second = policy.delay(1, Err(&err));
        let capped = policy.delay(9, Err(&err));
        assert!(first >= Duration::from_millis(100) && first < Duration::from_millis(110));
        assert!(second >= Duration::from_millis(200) && second < Duration::from_millis(220));
        assert!(capped >= Duration::from_millis(1000) && capped < Duration::from_millis(1100));
    }
}
