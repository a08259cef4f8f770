//! Refresh step against mock chromestatus and GitHub endpoints.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wfmap_core::Error;
use wfmap_sources::{refresh, ChromestatusConfig, RefreshConfig, WebFeaturesConfig};
use wfmap_store::{FilesystemBackend, WebFeaturesCatalog};

fn config(server: &MockServer) -> RefreshConfig {
    RefreshConfig {
        chromestatus: ChromestatusConfig {
            url: format!("{}/api/v0/features", server.uri()),
            page_size: 2,
            timeout_seconds: 5,
        },
        web_features: WebFeaturesConfig {
            releases_url: format!("{}/repos/web-platform-dx/web-features/releases", server.uri()),
            asset_name: "data.extended.json".to_string(),
            timeout_seconds: 5,
        },
    }
}

async fn mount_listing(server: &MockServer) {
    let pages = [("0", json!([{"id": 2}, {"id": 1}])), ("2", json!([{"id": 1}])), ("4", json!([]))];
    for (start, features) in pages {
        Mock::given(method("GET"))
            .and(path("/api/v0/features"))
            .and(query_param("start", start))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(")]}}'\n{}", json!({ "features": features }))),
            )
            .mount(server)
            .await;
    }
}

async fn mount_release(server: &MockServer, asset_name: &str) {
    Mock::given(method("GET"))
        .and(path("/repos/web-platform-dx/web-features/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tag_name": "v2.1.0",
            "assets": [{
                "name": asset_name,
                "browser_download_url": format!("{}/download/{}", server.uri(), asset_name)
            }]
        })))
        .mount(server)
        .await;
    // GitHub answers asset downloads with a redirect to its CDN.
    Mock::given(method("GET"))
        .and(path(format!("/download/{}", asset_name)))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/cdn/asset", server.uri())),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cdn/asset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "browsers": {},
            "features": {
                "abbr": {"kind": "feature", "name": "<abbr>", "description": "d"},
                "aborting": {"kind": "feature", "name": "AbortController", "description": "d"}
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_refresh_writes_both_snapshots() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    mount_release(&server, "data.extended.json").await;

    let dir = tempfile::tempdir().unwrap();
    let backend = FilesystemBackend::new(dir.path());
    let report = refresh(&config(&server), &backend).await.unwrap();

    assert_eq!(report.chromestatus_entries, 2);
    assert_eq!(report.web_features_tag, "v2.1.0");
    assert_eq!(report.web_features_count, 2);

    let listing: Value = backend.read_json("chromestatus.json").await.unwrap().unwrap();
    assert_eq!(listing, json!([{"id": 1}, {"id": 2}]));

    let catalog = WebFeaturesCatalog::load(&dir.path().join("web-features.json")).unwrap();
    assert_eq!(catalog.candidates().len(), 2);
}

#[tokio::test]
async fn test_missing_asset_fails_refresh() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    mount_release(&server, "data.json").await;

    let dir = tempfile::tempdir().unwrap();
    let backend = FilesystemBackend::new(dir.path());
    let result = refresh(&config(&server), &backend).await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(!dir.path().join("web-features.json").exists());
}

#[tokio::test]
async fn test_listing_failure_fails_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v0/features"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_release(&server, "data.extended.json").await;

    let dir = tempfile::tempdir().unwrap();
    let backend = FilesystemBackend::new(dir.path());
    let result = refresh(&config(&server), &backend).await;

    assert!(matches!(result, Err(Error::Request(_))));
    assert!(!dir.path().join("chromestatus.json").exists());
}

#[tokio::test]
async fn test_late_release_failure_writes_neither_snapshot() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    // The listing finishes well before the release lookup fails.
    Mock::given(method("GET"))
        .and(path("/repos/web-platform-dx/web-features/releases/latest"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let backend = FilesystemBackend::new(dir.path());
    let result = refresh(&config(&server), &backend).await;

    assert!(result.is_err());
    assert!(!dir.path().join("chromestatus.json").exists());
    assert!(!dir.path().join("web-features.json").exists());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshots() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/web-platform-dx/web-features/releases/latest"))
        .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("chromestatus.json"), "[{\"id\": 7}]").unwrap();
    let backend = FilesystemBackend::new(dir.path());

    assert!(refresh(&config(&server), &backend).await.is_err());
    let kept = std::fs::read_to_string(dir.path().join("chromestatus.json")).unwrap();
    assert_eq!(kept, "[{\"id\": 7}]");
}
