//! `fetch-retry`: issue one HTTP request with retries.
//!
//! ```text
//! fetch-retry -X POST -H "Content-Type: application/json" -d '{"a":1}' \
//!     --retries 5 --delay-ms 200 --retry-on 502,503,504 http://localhost:3000/jobs
//! ```
//!
//! Flags override values from `--config`, which override built-in defaults.

use std::path::PathBuf;

use clap::Parser;
use http::{HeaderName, HeaderValue, Method};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;

use fetch_retry::config::{self, Backoff, ClientConfig, RetryConfig};
use fetch_retry::observability::logging;
use fetch_retry::{FetchRetry, RequestInit, ReqwestTransport};

#[derive(Parser, Debug)]
#[command(name = "fetch-retry")]
#[command(about = "Issue an HTTP request, retrying failures and retry-worthy statuses", long_about = None)]
struct Cli {
    /// Request URL (forwarded as-is)
    url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request header, repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    headers: Vec<String>,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of retries
    #[arg(long)]
    retries: Option<u32>,

    /// Delay between attempts (base delay with --exponential)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Comma-separated statuses to retry on
    #[arg(long, value_delimiter = ',')]
    retry_on: Option<Vec<u16>>,

    /// Per-attempt timeout
    #[arg(long)]
    attempt_timeout_ms: Option<u64>,

    /// Use exponential backoff instead of a fixed delay
    #[arg(long)]
    exponential: bool,

    /// Print a JSON summary instead of the raw body
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long)]
    metrics: bool,
}

impl Cli {
    /// Layer command-line flags over the loaded retry configuration.
    fn apply_overrides(&self, retries: &mut RetryConfig) {
        if let Some(max_retries) = self.retries {
            retries.max_retries = max_retries;
        }
        if let Some(delay_ms) = self.delay_ms {
            retries.delay_ms = delay_ms;
        }
        if let Some(statuses) = &self.retry_on {
            retries.retry_on = statuses.clone();
        }
        if let Some(ms) = self.attempt_timeout_ms {
            retries.attempt_timeout_ms = Some(ms);
        }
        if self.exponential {
            retries.backoff = Backoff::Exponential;
        }
    }

    fn request_init(&self) -> Result<RequestInit, Box<dyn std::error::Error>> {
        let method = Method::from_bytes(self.method.as_bytes())?;
        let mut init = RequestInit::new(method);

        for raw in &self.headers {
            let (name, value) = raw
                .split_once(':')
                .ok_or_else(|| format!("Invalid header '{}', expected 'Name: value'", raw))?;
            init = init.header(
                HeaderName::from_bytes(name.trim().as_bytes())?,
                HeaderValue::from_str(value.trim())?,
            );
        }

        if let Some(data) = &self.data {
            init = init.body(data.clone());
        }
        Ok(init)
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    status: u16,
    retry_count: u32,
    body: &'a str,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ClientConfig::default(),
    };
    cli.apply_overrides(&mut config.retries);
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;
    let metrics = if cli.metrics {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let outcome = run(&cli, &config).await;

    if let Some(handle) = metrics {
        eprintln!("{}", handle.render());
    }
    outcome
}

/// Issue the request and print the result.
async fn run(cli: &Cli, config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let init = cli.request_init()?;
    let transport = ReqwestTransport::from_config(&config.http)?;
    let client = FetchRetry::builder(transport)
        .options(config.retries.to_options())
        .build();

    tracing::info!(url = %cli.url, method = %init.method, "Sending request");

    let response = match client.fetch(cli.url.as_str(), &init).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(retry_count = e.retry_count(), error = %e.error(), "Request failed");
            return Err(e.into());
        }
    };

    let (response, retry_count) = response.into_parts();
    let status = response.status().as_u16();
    let body = response.text().await?;

    if cli.json {
        let summary = Summary {
            status,
            retry_count,
            body: &body,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        eprintln!("HTTP {} (retries: {})", status, retry_count);
        print!("{}", body);
    }
    Ok(())
}
