//! Gemini backend and classifier against a mock Generative Language API.

#![cfg(feature = "gemini")]

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wfmap_core::{
    Candidate, CandidateSet, ClassificationOracle, Error, GenerationBackend, Outcome, Subject,
    SubjectBatch,
};
use wfmap_inference::{Classifier, GeminiBackend, GeminiConfig, SYSTEM_PROMPT};

fn backend(server: &MockServer) -> GeminiBackend {
    GeminiBackend::new(GeminiConfig {
        base_url: format!("{}/v1beta", server.uri()),
        api_key: "test-key".to_string(),
        model: "gemini-test".to_string(),
        timeout_seconds: 5,
    })
    .expect("Failed to create backend")
}

fn text_response(parts: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": parts},
            "finishReason": "STOP"
        }]
    }))
}

#[tokio::test]
async fn test_generate_sends_key_and_system_instruction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "system text"}]},
            "contents": [{"role": "user", "parts": [{"text": "user text"}]}]
        })))
        .respond_with(text_response(json!([{"text": "hello "}, {"text": "world"}])))
        .expect(1)
        .mount(&server)
        .await;

    let text = backend(&server)
        .generate_with_system("system text", "user text")
        .await
        .unwrap();
    assert_eq!(text, "hello world");
}

#[tokio::test]
async fn test_thought_parts_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response(json!([
            {"text": "Let me think about this...", "thought": true},
            {"text": "{}"}
        ])))
        .mount(&server)
        .await;

    assert_eq!(backend(&server).generate("p").await.unwrap(), "{}");
}

#[tokio::test]
async fn test_http_error_is_inference_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let err = backend(&server).generate("p").await.unwrap_err();
    match err {
        Error::Inference(msg) => assert!(msg.contains("API key not valid")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_no_candidates_is_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "OTHER"}
        })))
        .mount(&server)
        .await;

    assert_eq!(backend(&server).generate("p").await.unwrap(), "");
}

#[tokio::test]
async fn test_classifier_end_to_end() {
    let server = MockServer::start().await;
    let answer = "```json\n{\n  \"1234\": {\"id\": \"NOT_FOUND\", \"confidence\": 0, \"notes\": \"new API\"},\n  \
                  \"1984\": {\"id\": \"aborting\", \"confidence\": 90, \"notes\": \"signal\"}\n}\n```";
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": SYSTEM_PROMPT}]}
        })))
        .respond_with(text_response(json!([{"text": answer}])))
        .expect(1)
        .mount(&server)
        .await;

    let mut candidates = CandidateSet::new();
    candidates.insert("aborting", Candidate::default());
    let classifier = Classifier::new(Arc::new(backend(&server)), Arc::new(candidates));

    let batch: SubjectBatch = [
        Subject::new("1234").with_field("name", "Abbreviator API"),
        Subject::new("1984").with_field("name", "Deprecate controller.signal"),
    ]
    .into_iter()
    .collect();

    let outcomes = classifier.classify(&batch).await.unwrap();
    assert_eq!(outcomes["1234"], Outcome::failure("new API"));
    assert_eq!(outcomes["1984"], Outcome::success("aborting", 90, "signal"));
}
