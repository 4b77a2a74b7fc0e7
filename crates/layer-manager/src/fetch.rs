//! Capabilities retrieval and load state.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::instrument;

use wmts_common::{CrsCode, ViewerError, ViewerResult};
use wmts_protocol::Capabilities;

use crate::config::ViewerConfig;
use crate::translate::{translate_capabilities, SkippedLayer, TranslationReport};

/// Progress of the one-shot capabilities load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LoadState {
    Pending,
    Loaded {
        layers: usize,
        skipped: Vec<SkippedLayer>,
    },
    Failed {
        message: String,
    },
}

impl LoadState {
    pub fn failed(err: &ViewerError) -> Self {
        LoadState::Failed {
            message: err.to_string(),
        }
    }
}

/// HTTP client for capabilities documents.
#[derive(Debug, Clone)]
pub struct CapabilitiesClient {
    client: Client,
}

impl CapabilitiesClient {
    pub fn new(timeout: Duration) -> ViewerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| ViewerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &ViewerConfig) -> ViewerResult<Self> {
        Self::new(Duration::from_secs(config.fetch_timeout_secs))
    }

    /// GET and parse a capabilities document.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> ViewerResult<Capabilities> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ViewerError::Timeout
            } else {
                ViewerError::Fetch(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ViewerError::Timeout
            } else {
                ViewerError::Fetch(e.to_string())
            }
        })?;
        tracing::debug!(bytes = body.len(), "Fetched capabilities");

        Ok(Capabilities::parse(&body)?)
    }

    /// Fetch the configured capabilities document and translate it for the
    /// configured projection.
    pub async fn discover(&self, config: &ViewerConfig) -> ViewerResult<TranslationReport> {
        let projection: CrsCode = config.crs()?;
        let url = config.resolved_capabilities_url()?;
        let caps = self.fetch(&url).await?;
        Ok(translate_capabilities(&caps, config, projection))
    }
}
