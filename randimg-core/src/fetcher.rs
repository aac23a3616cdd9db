// SPDX-License-Identifier: MIT
//
// randimg: Random Noise Images from random.org
// Copyright (c) 2025 randimg Contributors

//! HTTP client for the random.org plain-text API
//!
//! Covers the two routes the tool needs: `quota/` to read how many random bits the
//! caller may still request, and `integers/` to generate a batch of integers. Failures
//! are returned to the caller as-is; nothing here retries.

use crate::{
    config::ClientConfig,
    metrics::Metrics,
    protocol::{self, IntegerRequest},
    Error, Result,
};
use reqwest::{Client, ClientBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

const QUOTA_ROUTE: &str = "quota/";
const INTEGERS_ROUTE: &str = "integers/";

/// Configuration for the random.org client
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Base URL of the service, ending in `/`
    pub base_url: Url,
    /// Request timeout (`None` = wait indefinitely)
    pub timeout: Option<Duration>,
}

impl FetcherConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
        }
    }

    /// Derive the fetcher settings from the loaded client configuration
    pub fn from_client_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url()?,
            timeout: config.request_timeout(),
        })
    }
}

/// HTTP client for random.org
#[derive(Clone)]
pub struct RandomOrgClient {
    client: Client,
    config: FetcherConfig,
    metrics: Metrics,
}

impl RandomOrgClient {
    /// Create a new client with configuration
    pub fn new(config: FetcherConfig) -> Result<Self> {
        Self::with_metrics(config, Metrics::new())
    }

    /// Create a client that records integer requests into `metrics`
    pub fn with_metrics(config: FetcherConfig, metrics: Metrics) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .user_agent(concat!("randimg/", env!("CARGO_PKG_VERSION")))
            .tcp_keepalive(Duration::from_secs(60))
            .use_rustls_tls();

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(Error::Network)?;

        Ok(Self {
            client,
            config,
            metrics,
        })
    }

    /// Remaining random-bit quota for the calling address
    #[instrument(skip(self))]
    pub async fn get_quota(&self) -> Result<i64> {
        let url = self.route_url(QUOTA_ROUTE, &[("format", IntegerRequest::FORMAT.to_string())])?;
        let body = self.get_text(url).await?;
        let quota = protocol::parse_quota(&body)?;

        debug!("Quota is {} bits", quota);
        Ok(quota)
    }

    /// Fetch one batch of integers
    ///
    /// The response must contain exactly `request.num` values.
    pub async fn fetch_integers(&self, request: &IntegerRequest) -> Result<Vec<i32>> {
        request.validate()?;

        let url = self.route_url(INTEGERS_ROUTE, &request.query_pairs())?;
        debug!("Requesting {} integers from {}", request.num, url);

        let started = Instant::now();
        let values = match self.fetch_integers_once(url, request.num).await {
            Ok(values) => values,
            Err(e) => {
                self.metrics.record_request_failure();
                return Err(e);
            }
        };

        self.metrics
            .record_request(values.len(), started.elapsed().as_micros() as u64);
        debug!("Received {} integers", values.len());
        Ok(values)
    }

    async fn fetch_integers_once(&self, url: Url, expected: usize) -> Result<Vec<i32>> {
        let body = self.get_text(url).await?;
        let values = protocol::parse_plain_integers(&body)?;

        if values.len() != expected {
            warn!("Received {} integers, expected {}", values.len(), expected);
            return Err(Error::Parse(format!(
                "expected {} integers, response contained {}",
                expected,
                values.len()
            )));
        }

        Ok(values)
    }

    /// GET a URL and return the body of a successful response
    async fn get_text(&self, url: Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to fetch from {}: {}", url, e);
                Error::Network(e)
            })?;

        // Check HTTP status
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("HTTP error {}: {}", status, body.trim());
            return Err(Error::Service {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        response.text().await.map_err(Error::Network)
    }

    /// Build a route URL with query parameters
    fn route_url(&self, route: &str, pairs: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .config
            .base_url
            .join(route)
            .map_err(|e| Error::Config(format!("Invalid route '{}': {}", route, e)))?;

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Get client configuration
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Counters for the integer requests made through this client
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
