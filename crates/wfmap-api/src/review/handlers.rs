//! Review API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use wfmap_core::{ReviewCounts, ReviewItem, ReviewStatus};

use super::error::ApiError;
use super::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "chromestatus_entries": state.chromestatus.len(),
        "candidates": state.candidates.len(),
    }))
}

/// The whole review queue, reviewed and pending, in queue order.
pub async fn get_queue(State(state): State<AppState>) -> Json<Vec<ReviewItem>> {
    let queue = state.queue.lock().await;
    Json(queue.items().to_vec())
}

#[derive(Debug, Serialize)]
pub struct QueueStats {
    #[serde(flatten)]
    pub counts: ReviewCounts,
    pub total: usize,
}

pub async fn get_stats(State(state): State<AppState>) -> Json<QueueStats> {
    let counts = state.queue.lock().await.counts();
    Json(QueueStats {
        counts,
        total: counts.total(),
    })
}

/// Body of `POST /api/save`. Every field is required; they are optional
/// here so a missing one is reported as a 400 rather than a rejection.
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(alias = "chromestatus_id")]
    pub subject_id: Option<String>,
    #[serde(alias = "web_features_id")]
    pub target_id: Option<String>,
    pub review_status: Option<String>,
}

/// Record a review decision and rewrite the queue file.
///
/// # Returns
/// - 200 OK with `{"success": true}`
/// - 400 Bad Request on malformed body, missing field, unknown status, or
///   a proposal that is not in the queue
pub async fn save_review(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<JsonValue>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::BadRequest(format!("Invalid data: {}", e.body_text())))?;
    let (Some(subject_id), Some(target_id), Some(status)) =
        (request.subject_id, request.target_id, request.review_status)
    else {
        return Err(ApiError::BadRequest("Invalid data".to_string()));
    };
    let status: ReviewStatus = status.parse()?;

    let mut queue = state.queue.lock().await;
    let previous = queue
        .items()
        .iter()
        .find(|item| item.matches(&subject_id, &target_id))
        .map(|item| item.review_status)
        .ok_or_else(|| ApiError::BadRequest("Item not found in review queue".to_string()))?;

    queue.decide(&subject_id, &target_id, status)?;
    if let Err(e) = state.store.save(&queue).await {
        // Keep memory and disk in agreement.
        queue.decide(&subject_id, &target_id, previous)?;
        return Err(e.into());
    }

    info!(
        subsystem = "api",
        component = "review",
        op = "save",
        subject_id = %subject_id,
        target_id = %target_id,
        review_status = %status,
        previous = %previous,
        "Saved review decision"
    );
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Raw chromestatus entry for a subject id.
pub async fn chromestatus_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    match state.chromestatus.get(&id) {
        Some(entry) => Ok(Json(entry.clone())),
        None => {
            debug!(subject_id = %id, "chromestatus entry lookup missed");
            Err(ApiError::NotFound(format!("Entry not found: {}", id)))
        }
    }
}

/// Raw web-features record for a feature id.
pub async fn web_feature(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    state
        .web_features
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Feature not found: {}", id)))
}
