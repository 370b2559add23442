//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Retry engine produces:
//!     → logging.rs (structured events inside a per-call `fetch` span)
//!     → metrics.rs (attempt, retry and call counters)
//!
//! Consumers:
//!     → stderr (pretty or JSON)
//!     → any `metrics` recorder (the CLI installs a Prometheus one)
//! ```

pub mod logging;
pub mod metrics;
