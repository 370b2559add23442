//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! FetchRetry::fetch_with(input, init, overrides)
//!     → policy.rs (merge overrides over instance defaults, resolve callables)
//!     → engine.rs (attempt loop)
//!         → timeouts.rs (issue one attempt, abort it on expiry via abort.rs)
//!         → policy.rs (retry predicate, delay function)
//!         → backoff.rs (when the delay is exponential)
//!     → RetryResponse / RetryError annotated with the retry count
//! ```
//!
//! # Design Decisions
//! - Each call owns its policy and loop state; clients only hold read-only defaults
//! - Timeouts bound single attempts; the call as a whole is bounded by the predicate
//! - Retry decisions never look at anything but the current attempt

pub mod abort;
pub mod backoff;
pub mod engine;
pub mod policy;
pub mod timeouts;

pub use abort::{AbortController, AbortReason, AbortSignal};
pub use engine::{FetchRetry, FetchRetryBuilder, RetryResponse};
pub use policy::{Attempt, Delay, RetryDefaults, RetryOn, RetryOptions, RetryPolicy};
