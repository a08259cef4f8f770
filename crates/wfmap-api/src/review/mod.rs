//! HTTP review server.
//!
//! Routes:
//! - `GET /health`
//! - `GET /api/queue`, `GET /api/stats`
//! - `POST /api/save`
//! - `GET /api/chromestatus/:id`, `GET /api/web-features/:id`
//! - optional static UI at `/` and `/static`

mod error;
mod handlers;
mod state;

use std::path::Path;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use uuid::Uuid;

use wfmap_core::defaults::MAX_BODY_SIZE_BYTES;

pub use error::ApiError;
pub use handlers::{QueueStats, SaveRequest};
pub use state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the review router. When `static_dir` is given, its `index.html`
/// is served at `/` and the directory itself under `/static`.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/queue", get(handlers::get_queue))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/save", post(handlers::save_review))
        .route("/api/chromestatus/:id", get(handlers::chromestatus_entry))
        .route("/api/web-features/:id", get(handlers::web_feature));

    if let Some(dir) = static_dir {
        app = app
            .route_service("/", ServeFile::new(dir.join("index.html")))
            .nest_service("/static", ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE_BYTES))
        .with_state(state)
}
