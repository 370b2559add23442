//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! FetchRetry attempt
//!     → transport.rs (Transport trait, RequestInit forwarded unmodified)
//!     → client.rs (reqwest-backed implementation, honors the abort signal)
//!     → response handed back to the retry predicate
//! ```

pub mod client;
pub mod transport;

pub use client::ReqwestTransport;
pub use transport::{HttpResponse, RequestInit, Transport};
