//! Transport abstraction wrapped by the retry engine.
//!
//! # Responsibilities
//! - Define the request function the engine decorates
//! - Define the request options forwarded on every attempt
//! - Expose the response status to retry predicates
//!
//! # Design Decisions
//! - Input and options are forwarded unmodified; nothing is parsed here
//! - The only field the engine touches is the abort signal, set per attempt

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use crate::error::FetchError;
use crate::resilience::abort::AbortSignal;

/// A response that carries an HTTP status.
pub trait HttpResponse {
    fn status(&self) -> StatusCode;
}

impl<B> HttpResponse for http::Response<B> {
    fn status(&self) -> StatusCode {
        http::Response::status(self)
    }
}

impl HttpResponse for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }
}

/// The request function decorated by [`crate::FetchRetry`].
///
/// A transport is called once per attempt with the caller's original input
/// and options. It may fail; failures are fed to the retry predicate.
#[async_trait]
pub trait Transport: Send + Sync {
    /// What identifies the request (usually a URL).
    type Input: ?Sized + Sync;

    type Response: HttpResponse + Send;

    async fn request(
        &self,
        input: &Self::Input,
        init: &RequestInit,
    ) -> Result<Self::Response, FetchError>;
}

/// Options forwarded to the transport on every attempt.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    signal: Option<AbortSignal>,
}

impl RequestInit {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Append a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Abort signal of the current attempt.
    ///
    /// Only present when an attempt timeout is configured. Transports that
    /// can stop early should watch it.
    pub fn signal(&self) -> Option<&AbortSignal> {
        self.signal.as_ref()
    }

    pub(crate) fn with_signal(&self, signal: AbortSignal) -> Self {
        let mut init = self.clone();
        init.signal = Some(signal);
        init
    }
}
