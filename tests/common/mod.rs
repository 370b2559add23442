//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fetch_retry::{FetchError, RequestInit, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[allow(dead_code)]
pub type Resp = http::Response<String>;

/// One scripted transport reaction.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Step {
    Status(u16),
    Fail(&'static str),
    /// Answer with the status after sleeping.
    Slow(Duration, u16),
}

/// In-memory transport replaying a script, then answering `fallback` forever.
#[allow(dead_code)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicU32,
    started: Mutex<Vec<Instant>>,
    saw_signal: Mutex<Vec<bool>>,
    inputs: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self::with_fallback(script, Step::Status(200))
    }

    pub fn with_fallback(script: impl IntoIterator<Item = Step>, fallback: Step) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            calls: AtomicU32::new(0),
            started: Mutex::new(Vec::new()),
            saw_signal: Mutex::new(Vec::new()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// When each attempt was issued.
    pub fn started(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }

    /// Input of each attempt.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    /// Whether each attempt was handed an abort signal.
    pub fn saw_signal(&self) -> Vec<bool> {
        self.saw_signal.lock().unwrap().clone()
    }
}

#[allow(dead_code)]
fn respond(status: u16) -> Resp {
    http::Response::builder()
        .status(status)
        .body(status.to_string())
        .unwrap()
}

#[async_trait]
impl Transport for ScriptedTransport {
    type Input = str;
    type Response = Resp;

    async fn request(&self, input: &str, init: &RequestInit) -> Result<Resp, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_string());
        self.started.lock().unwrap().push(Instant::now());
        self.saw_signal.lock().unwrap().push(init.signal().is_some());

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            Step::Status(status) => Ok(respond(status)),
            Step::Fail(msg) => Err(FetchError::transport(msg)),
            Step::Slow(latency, status) => {
                tokio::time::sleep(latency).await;
                Ok(respond(status))
            }
        }
    }
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` is called once per connection with the zero-based request number and
/// returns the status and body to answer with.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);
    let counter = Arc::new(AtomicU32::new(0));

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        // Request head is small; one read is enough for these tests.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f(n).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            419 => "419 Page Expired",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            504 => "504 Gateway Timeout",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
