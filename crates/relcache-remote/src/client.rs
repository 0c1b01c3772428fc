//! HTTP client for release origins.
//!
//! The [`RemoteOrigin`] trait is the seam between the update protocol and
//! the network: the protocol only ever performs the two fetches below.

use async_trait::async_trait;
use reqwest::header::ACCEPT;

use crate::config::OriginConfig;
use crate::error::OriginError;

/// Transport for manifest and archive downloads.
#[async_trait]
pub trait RemoteOrigin: Send + Sync {
    /// Fetches and parses a JSON manifest document.
    async fn fetch_manifest(&self, url: &str) -> Result<serde_json::Value, OriginError>;

    /// Fetches a `.tar.gz` archive.
    async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>, OriginError>;
}

/// [`RemoteOrigin`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    config: OriginConfig,
    http: reqwest::Client,
}

impl HttpOrigin {
    /// Creates a new HTTP origin client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use relcache_remote::{HttpOrigin, OriginConfig};
    ///
    /// let origin = HttpOrigin::new(OriginConfig::default())?;
    /// # Ok::<(), relcache_remote::OriginError>(())
    /// ```
    pub fn new(config: OriginConfig) -> Result<Self, OriginError> {
        config.validate()?;
        let http = Self::build_http_client(&config)?;
        Ok(Self { config, http })
    }

    /// Returns the origin configuration.
    #[must_use]
    pub const fn config(&self) -> &OriginConfig {
        &self.config
    }

    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response, OriginError> {
        tracing::debug!(url, "Fetching from origin");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| OriginError::from_reqwest(url, e))?;

        if !response.status().is_success() {
            return Err(OriginError::HttpError {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// Builds the HTTP client with proper configuration.
    fn build_http_client(config: &OriginConfig) -> Result<reqwest::Client, OriginError> {
        reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| OriginError::Client {
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl RemoteOrigin for HttpOrigin {
    async fn fetch_manifest(&self, url: &str) -> Result<serde_json::Value, OriginError> {
        let response = self.get(url, "application/json").await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| OriginError::from_reqwest(url, e))?;

        serde_json::from_slice(&body).map_err(|e| OriginError::InvalidManifest {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>, OriginError> {
        let response = self.get(url, "application/octet-stream").await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| OriginError::from_reqwest(url, e))?;

        tracing::debug!(url, bytes = body.len(), "Downloaded archive");
        Ok(body.to_vec())
    }
}
