//! Full classification run: mock chromestatus listing, mock model,
//! on-disk mapping store.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wfmap_core::{Candidate, CandidateSet, Outcome};
use wfmap_inference::mock::MockGenerationBackend;
use wfmap_inference::Classifier;
use wfmap_jobs::{ClassificationPipeline, PipelineConfig};
use wfmap_sources::{ChromestatusClient, ChromestatusConfig};
use wfmap_store::{FilesystemBackend, MappingStore};

async fn mount_listing(server: &MockServer) {
    let pages = [
        ("0", json!([{"id": 1}, {"id": 2}, {"id": 3}])),
        ("3", json!([{"id": 3}, {"id": 4}, {"id": 5}])),
        ("6", json!([])),
    ];
    for (start, features) in pages {
        Mock::given(method("GET"))
            .and(query_param("start", start))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(")]}}'\n{}", json!({ "features": features }))),
            )
            .mount(server)
            .await;
    }
}

/// Answers `abbr` for every subject id found in the prompt's input block.
fn answer_everything(prompt: &str) -> String {
    let input = prompt
        .split_once("User input to classify:\n```json\n")
        .and_then(|(_, rest)| rest.split_once("\n```"))
        .map(|(json, _)| json)
        .unwrap_or("{}");
    let batch: Map<String, Value> = serde_json::from_str(input).unwrap_or_default();
    let answer: Map<String, Value> = batch
        .keys()
        .map(|id| (id.clone(), json!({"id": "abbr", "confidence": 80, "notes": "test"})))
        .collect();
    format!("```json\n{}\n```", Value::Object(answer))
}

fn candidates() -> Arc<CandidateSet> {
    let mut set = CandidateSet::new();
    set.insert("abbr", Candidate::default());
    Arc::new(set)
}

#[tokio::test]
async fn test_overlapping_pages_classified_once_each() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    let source = ChromestatusClient::new(ChromestatusConfig {
        url: server.uri(),
        page_size: 3,
        timeout_seconds: 5,
    })
    .unwrap();

    let backend = MockGenerationBackend::new().with_responder(answer_everything);
    let oracle = Classifier::new(Arc::new(backend.clone()), candidates());

    let dir = tempfile::tempdir().unwrap();
    let mut store = MappingStore::load(FilesystemBackend::new(dir.path()), "mapping.json")
        .await
        .unwrap();
    let pipeline = ClassificationPipeline::new(PipelineConfig::default().with_batch_size(2));
    let report = pipeline.run(&source, &oracle, &mut store).await.unwrap();

    assert_eq!(report.seen, 6);
    assert_eq!(report.submitted, 5);
    assert_eq!(report.batches, 3);
    assert_eq!(backend.call_count(), 3);

    let ids: Vec<&str> = store.entries().keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(store.get("4"), Some(&Outcome::success("abbr", 80, "test")));
}

#[tokio::test]
async fn test_second_run_is_free() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    let source = ChromestatusClient::new(ChromestatusConfig {
        url: server.uri(),
        page_size: 3,
        timeout_seconds: 5,
    })
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ClassificationPipeline::default();

    let first = MockGenerationBackend::new().with_responder(answer_everything);
    let mut store = MappingStore::load(FilesystemBackend::new(dir.path()), "mapping.json")
        .await
        .unwrap();
    pipeline
        .run(&source, &Classifier::new(Arc::new(first), candidates()), &mut store)
        .await
        .unwrap();

    let second = MockGenerationBackend::new().with_responder(answer_everything);
    let mut reloaded = MappingStore::load(FilesystemBackend::new(dir.path()), "mapping.json")
        .await
        .unwrap();
    let report = pipeline
        .run(&source, &Classifier::new(Arc::new(second.clone()), candidates()), &mut reloaded)
        .await
        .unwrap();

    assert_eq!(second.call_count(), 0);
    assert_eq!(report.already_mapped, 6);
}

#[tokio::test]
async fn test_unparseable_batch_stays_unmapped() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    let source = ChromestatusClient::new(ChromestatusConfig {
        url: server.uri(),
        page_size: 3,
        timeout_seconds: 5,
    })
    .unwrap();

    // First batch gets prose, the rest get real answers.
    let backend = MockGenerationBackend::new().with_responder(answer_everything);
    backend.push_response("Sorry, I could not produce JSON.");
    let oracle = Classifier::new(Arc::new(backend), candidates());

    let dir = tempfile::tempdir().unwrap();
    let mut store = MappingStore::load(FilesystemBackend::new(dir.path()), "mapping.json")
        .await
        .unwrap();
    let pipeline = ClassificationPipeline::new(PipelineConfig::default().with_batch_size(2));
    let report = pipeline.run(&source, &oracle, &mut store).await.unwrap();

    assert_eq!(report.batches, 3);
    assert_eq!(report.merged, 3);
    assert!(!store.contains("1"));
    assert!(!store.contains("2"));
    assert!(store.contains("5"));
}
