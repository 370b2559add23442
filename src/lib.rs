//! Retrying HTTP fetch.
//!
//! Wraps any asynchronous request function with configurable retries:
//! failed attempts and retry-worthy statuses are re-issued according to a
//! policy (max retries, delay, retry predicate), optionally bounding every
//! attempt with a timeout.
//!
//! # Architecture Overview
//!
//! ```text
//!     caller ──fetch(input, init)──▶ ┌──────────────────────────────────────┐
//!                                    │             resilience               │
//!                                    │  policy ─▶ engine ─▶ timeouts/abort  │
//!                                    └──────────────────┬───────────────────┘
//!                                                       │ one call per attempt
//!                                                       ▼
//!                                    ┌──────────────────────────────────────┐
//!                                    │   http::Transport (reqwest or own)   │
//!                                    └──────────────────────────────────────┘
//!
//!     cross-cutting: config (TOML defaults), observability (tracing, metrics)
//! ```
//!
//! # Defaults
//! - 3 retries
//! - 500ms fixed delay
//! - retry on errors and statuses 419, 503, 504
//! - no attempt timeout

pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod resilience;

pub use error::{FetchError, FetchResult, RetryError};
pub use crate::http::{HttpResponse, ReqwestTransport, RequestInit, Transport};
pub use resilience::{Attempt, Delay, FetchRetry, FetchRetryBuilder, RetryOn, RetryOptions, RetryResponse};
