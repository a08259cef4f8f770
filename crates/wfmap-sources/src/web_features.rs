//! web-features release fetcher.
//!
//! The catalog is published as a GitHub release asset. The latest release
//! is looked up through the releases API, the named asset is downloaded
//! (GitHub redirects to a CDN), and the payload is checked to carry a
//! `features` object before it is handed back.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use wfmap_core::defaults::{HTTP_TIMEOUT_SECS, USER_AGENT, WEB_FEATURES_ASSET, WEB_FEATURES_RELEASES_URL};
use wfmap_core::{Error, Result};

/// Configuration for the web-features release fetcher.
#[derive(Debug, Clone)]
pub struct WebFeaturesConfig {
    /// Releases API endpoint; `/latest` is appended.
    pub releases_url: String,
    /// Name of the release asset to download.
    pub asset_name: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for WebFeaturesConfig {
    fn default() -> Self {
        Self {
            releases_url: WEB_FEATURES_RELEASES_URL.to_string(),
            asset_name: WEB_FEATURES_ASSET.to_string(),
            timeout_seconds: HTTP_TIMEOUT_SECS,
        }
    }
}

impl WebFeaturesConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            releases_url: std::env::var("WEB_FEATURES_RELEASES_URL")
                .unwrap_or_else(|_| WEB_FEATURES_RELEASES_URL.to_string()),
            asset_name: std::env::var("WEB_FEATURES_ASSET")
                .unwrap_or_else(|_| WEB_FEATURES_ASSET.to_string()),
            timeout_seconds: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_TIMEOUT_SECS),
        }
    }
}

/// A GitHub release, as far as the fetcher cares.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Client for web-features releases.
pub struct WebFeaturesClient {
    client: Client,
    config: WebFeaturesConfig,
}

impl WebFeaturesClient {
    /// Create a new client with the given configuration.
    pub fn new(config: WebFeaturesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(WebFeaturesConfig::from_env())
    }

    pub fn config(&self) -> &WebFeaturesConfig {
        &self.config
    }

    /// Look up the latest release.
    pub async fn latest_release(&self) -> Result<Release> {
        let url = format!("{}/latest", self.config.releases_url.trim_end_matches('/'));
        debug!(subsystem = "sources", component = "web_features", op = "latest_release", url = %url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| Error::Request(format!("Release lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "Release lookup returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Protocol(format!("Malformed release metadata: {}", e)))
    }

    /// Download the configured asset of `release` and decode it.
    pub async fn download_asset(&self, release: &Release) -> Result<JsonValue> {
        let asset = release.asset(&self.config.asset_name).ok_or_else(|| {
            Error::NotFound(format!(
                "No {} asset for web-features {}",
                self.config.asset_name, release.tag_name
            ))
        })?;

        info!(
            subsystem = "sources",
            component = "web_features",
            op = "download_asset",
            asset = %asset.name,
            tag = %release.tag_name,
            "Fetching {} for web-features {}",
            asset.name,
            release.tag_name
        );

        let response = self
            .client
            .get(&asset.browser_download_url)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Asset download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "Asset download returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Request(format!("Failed to read asset: {}", e)))?;
        let data: JsonValue = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Protocol(format!("Asset {} is not JSON: {}", asset.name, e)))?;

        if !data.get("features").is_some_and(JsonValue::is_object) {
            return Err(Error::Protocol(format!(
                "Asset {} has no features object",
                asset.name
            )));
        }
        Ok(data)
    }

    /// Fetch the latest release payload, returning its tag and data.
    pub async fn fetch_latest(&self) -> Result<(String, JsonValue)> {
        let release = self.latest_release().await?;
        let data = self.download_asset(&release).await?;
        Ok((release.tag_name, data))
    }
}
