use axum::{http::StatusCode, response::IntoResponse, Json};

/// Errors returned by review API handlers, rendered as
/// `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(wfmap_core::Error),
}

impl From<wfmap_core::Error> for ApiError {
    fn from(err: wfmap_core::Error) -> Self {
        match &err {
            wfmap_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            wfmap_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(err) => {
                tracing::error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
