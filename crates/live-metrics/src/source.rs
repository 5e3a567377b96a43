//! Where performance reports come from.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::PollerConfig;
use crate::status::PerformanceReport;
use crate::{Error, Result};

/// Fetches the current performance report.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Describe the source for diagnostics (usually the URL).
    fn describe(&self) -> String;

    /// Fetch and parse one report.
    async fn fetch(&self) -> Result<PerformanceReport>;
}

fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate may have installed one first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Report source backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: Client,
    url: Url,
}

impl HttpStatusSource {
    /// Build a source for `{base_url}{config.endpoint_path}`.
    pub fn new(base_url: &str, config: &PollerConfig) -> Result<Self> {
        config.validate()?;
        install_rustls_provider();

        let base = Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid base URL {:?}: {}", base_url, e)))?;
        let url = base.join(&config.endpoint_path).map_err(|e| {
            Error::config(format!(
                "invalid endpoint path {:?}: {}",
                config.endpoint_path, e
            ))
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch(&self) -> Result<PerformanceReport> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status,
                url: self.url.to_string(),
            });
        }

        let body = response.bytes().await?;
        debug!(url = %self.url, bytes = body.len(), "Received performance report");
        PerformanceReport::from_slice(&body)
    }
}

/// Canned response served by [`StaticSource`].
#[derive(Debug, Clone)]
pub enum StaticResponse {
    Report(PerformanceReport),
    Failure(String),
}

/// Source that always answers with the same response.
#[derive(Debug)]
pub struct StaticSource {
    response: Mutex<StaticResponse>,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(report: PerformanceReport) -> Self {
        Self::from_response(StaticResponse::Report(report))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_response(StaticResponse::Failure(message.into()))
    }

    pub fn from_response(response: StaticResponse) -> Self {
        Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the response served by later fetches.
    pub fn set_response(&self, response: StaticResponse) {
        *self.response.lock() = response;
    }

    /// Number of fetches performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for StaticSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn fetch(&self) -> Result<PerformanceReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.response.lock() {
            StaticResponse::Report(report) => Ok(report.clone()),
            StaticResponse::Failure(message) => Err(Error::other(message.clone())),
        }
    }
}
