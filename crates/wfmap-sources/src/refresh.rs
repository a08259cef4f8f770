//! Refresh step: re-download both upstream snapshots.
//!
//! The chromestatus listing and the web-features release are fetched
//! concurrently. The first failure cancels the other fetch and is returned
//! before anything is written, so a failed refresh leaves both snapshot
//! files as they were. Writes start only once both payloads are in hand.

use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::info;

use wfmap_core::defaults::{CHROMESTATUS_FILE, WEB_FEATURES_FILE};
use wfmap_core::Result;
use wfmap_store::FilesystemBackend;

use crate::chromestatus::{ChromestatusClient, ChromestatusConfig};
use crate::web_features::{WebFeaturesClient, WebFeaturesConfig};

/// Configuration for a refresh run.
#[derive(Debug, Clone, Default)]
pub struct RefreshConfig {
    pub chromestatus: ChromestatusConfig,
    pub web_features: WebFeaturesConfig,
}

impl RefreshConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            chromestatus: ChromestatusConfig::from_env(),
            web_features: WebFeaturesConfig::from_env(),
        }
    }
}

/// What a refresh run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub chromestatus_entries: usize,
    pub web_features_tag: String,
    pub web_features_count: usize,
}

fn feature_count(data: &JsonValue) -> usize {
    data.get("features")
        .and_then(JsonValue::as_object)
        .map_or(0, |features| features.len())
}

/// Refresh both snapshots in the backend's data directory.
pub async fn refresh(config: &RefreshConfig, backend: &FilesystemBackend) -> Result<RefreshReport> {
    let start = Instant::now();
    let chromestatus = ChromestatusClient::new(config.chromestatus.clone())?;
    let web_features = WebFeaturesClient::new(config.web_features.clone())?;

    let (entries, (web_features_tag, data)) =
        tokio::try_join!(chromestatus.fetch_all(), web_features.fetch_latest())?;

    backend.write_json(CHROMESTATUS_FILE, &entries).await?;
    info!(
        subsystem = "sources",
        component = "refresh",
        op = "write_chromestatus",
        entry_count = entries.len(),
        path = %backend.full_path(CHROMESTATUS_FILE).display(),
        "Wrote chromestatus snapshot"
    );

    let web_features_count = feature_count(&data);
    backend.write_json(WEB_FEATURES_FILE, &data).await?;
    info!(
        subsystem = "sources",
        component = "refresh",
        op = "write_web_features",
        tag = %web_features_tag,
        feature_count = web_features_count,
        path = %backend.full_path(WEB_FEATURES_FILE).display(),
        "Wrote web-features snapshot"
    );

    info!(
        subsystem = "sources",
        component = "refresh",
        op = "refresh",
        duration_ms = start.elapsed().as_millis() as u64,
        "Refresh complete"
    );
    Ok(RefreshReport {
        chromestatus_entries: entries.len(),
        web_features_tag,
        web_features_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_count() {
        assert_eq!(feature_count(&json!({"features": {"a": {}, "b": {}}})), 2);
        assert_eq!(feature_count(&json!({"browsers": {}})), 0);
    }
}
