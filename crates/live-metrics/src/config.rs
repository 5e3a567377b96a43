//! Poller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default refresh interval (10 seconds).
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

/// Default endpoint path.
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/model-performance";

/// Default request timeout (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for a [`MetricsPoller`](crate::MetricsPoller) and its HTTP source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Time between two ticks.
    #[serde(rename = "interval_ms", with = "duration_ms")]
    pub interval: Duration,
    /// Path of the performance endpoint, relative to the base URL.
    pub endpoint_path: String,
    /// Timeout applied to each request.
    #[serde(rename = "request_timeout_secs", with = "duration_secs")]
    pub request_timeout: Duration,
    /// User agent sent with each request.
    pub user_agent: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: concat!("live-metrics/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl PollerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check that the configuration can drive a poller.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(Error::config("interval must be greater than zero"));
        }
        if !self.endpoint_path.starts_with('/') {
            return Err(Error::config(format!(
                "endpoint path must start with '/', got {:?}",
                self.endpoint_path
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::config("request timeout must be greater than zero"));
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
