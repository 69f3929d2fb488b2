//! Client configuration.
//!
//! Defaults target the public PurpleAir v1 API. `from_env` lets deployments
//! and tests point the client elsewhere without code changes.

use std::time::Duration;

use crate::error::{ApiError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.purpleair.com/v1/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_BASE_URL: &str = "PURPLEAIR_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "PURPLEAIR_TIMEOUT_SECS";

/// Settings shared by every facade of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    // Always ends in exactly one `/`; only set through `normalize_base_url`.
    api_base_url: String,
    /// Per-request timeout applied by the transport, covering both the cloud
    /// API and local sensors.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(api_base_url: &str, timeout: Duration) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url),
            timeout,
        }
    }

    /// Read overrides from `PURPLEAIR_API_BASE_URL` and
    /// `PURPLEAIR_TIMEOUT_SECS`, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var(ENV_API_BASE_URL) {
            if !base_url.trim().is_empty() {
                config.api_base_url = normalize_base_url(base_url.trim());
            }
        }

        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Base of every cloud API URL, ending in `/`.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Join `path` onto the API base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}
