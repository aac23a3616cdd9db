//! Configuration management for randimg

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RANDIMG_";

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the random.org service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where the PNG image is written
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Per-request timeout in seconds (0 = wait indefinitely)
    #[serde(default)]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_path: default_output_path(),
            request_timeout_secs: 0,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of `(name, value)` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.output_path.as_os_str().is_empty() {
            return Err(Error::Config("output_path cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Parsed base URL, always ending in `/` so routes can be joined onto it
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        let url = Url::parse(&raw)
            .map_err(|e| Error::Config(format!("Invalid base_url '{}': {}", self.base_url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!(
                "base_url must use http or https, got '{}'",
                other
            ))),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs > 0 {
            Some(Duration::from_secs(self.request_timeout_secs))
        } else {
            None
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    crate::DEFAULT_BASE_URL.to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from(crate::DEFAULT_OUTPUT_PATH)
}
