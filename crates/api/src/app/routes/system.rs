use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;

/// Liveness: never touches the model.
pub async fn health() -> impl IntoResponse {
    Json(dto::health_to_json())
}

/// Readiness: 200 only once a model is installed and not demoted.
pub async fn ready(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match (services.not_ready_reason(), services.loaded()) {
        (None, Some(loaded)) => Json(serde_json::json!({
            "status": "ready",
            "model": {
                "name": loaded.artifact.metadata().name,
                "version": loaded.artifact.metadata().version,
                "classifier": loaded.artifact.classifier_kind(),
            },
            "loaded_at": loaded.loaded_at.to_rfc3339(),
        }))
        .into_response(),
        (reason, _) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "reason": reason.map(|r| r.as_str()).unwrap_or("model_not_loaded"),
            })),
        )
            .into_response(),
    }
}

pub async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "Endpoint not found")
}

pub async fn method_not_allowed() -> axum::response::Response {
    errors::json_error(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "Method not allowed")
}
