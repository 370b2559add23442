//! reqwest-backed transport.
//!
//! # Responsibilities
//! - Issue one HTTP request per attempt with the caller's method, headers and body
//! - Stop early when the attempt's abort signal fires
//!
//! # Design Decisions
//! - The URL is handed to reqwest as-is; parse failures surface as transport errors
//! - Connection pooling is left to the shared `reqwest::Client`

use std::time::Duration;

use async_trait::async_trait;

use crate::config::HttpConfig;
use crate::error::FetchError;
use crate::http::transport::{RequestInit, Transport};

/// Transport issuing requests through a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the underlying client from configuration.
    pub fn from_config(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Input = str;
    type Response = reqwest::Response;

    async fn request(&self, input: &str, init: &RequestInit) -> Result<reqwest::Response, FetchError> {
        let mut builder = self
            .client
            .request(init.method.clone(), input)
            .headers(init.headers.clone());
        if let Some(body) = &init.body {
            builder = builder.body(body.clone());
        }

        let send = builder.send();
        match init.signal() {
            None => Ok(send.await?),
            Some(signal) => tokio::select! {
                res = send => Ok(res?),
                reason = signal.aborted() => Err(FetchError::Aborted(reason)),
            },
        }
    }
}
