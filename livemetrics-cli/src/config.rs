use std::path::{Path, PathBuf};
use std::time::Duration;

use live_metrics::PollerConfig;
use live_metrics::config::{
    DEFAULT_ENDPOINT_PATH, DEFAULT_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::Args;
use crate::error::{AppError, Result};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub endpoint_path: String,
    pub interval_ms: u64,
    pub request_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Card identifiers that are not displayed.
    pub hidden: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            interval_ms: DEFAULT_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: None,
            hidden: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("livemetrics").join("config.toml"))
    }

    /// Load from `path`, or from the default location if it exists.
    ///
    /// An explicitly given file must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No configuration file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply command line overrides on top of the file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(base_url) = &args.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(path) = &args.endpoint_path {
            self.endpoint_path = path.clone();
        }
        if let Some(interval_ms) = args.interval_ms {
            self.interval_ms = interval_ms;
        }
        if let Some(timeout) = args.timeout {
            self.request_timeout_secs = timeout;
        }
        self.hidden.extend(args.hidden.iter().cloned());
    }

    pub fn to_poller_config(&self) -> Result<PollerConfig> {
        let mut config = PollerConfig::default()
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_endpoint_path(self.endpoint_path.clone())
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs));
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the hidden card identifiers.
    pub fn hidden_targets(&self) -> Result<Vec<live_metrics::DisplayTarget>> {
        self.hidden
            .iter()
            .map(|id| {
                live_metrics::DisplayTarget::from_id(id)
                    .ok_or_else(|| AppError::InvalidInput(format!("unknown metric card {:?}", id)))
            })
            .collect()
    }

    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
