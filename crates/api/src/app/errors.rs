use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use irisserve_ai::{BatchError, PredictError};
use irisserve_core::ValidationError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Error object for a rejected sample (body of a 400, or one batch element).
pub fn validation_error_json(err: &ValidationError) -> serde_json::Value {
    json!({
        "error": "validation_error",
        "message": err.to_string(),
        "fields": err.fields(),
    })
}

/// Error object for a failed prediction, as embedded in batch output.
pub fn predict_error_json(err: &PredictError) -> serde_json::Value {
    match err {
        PredictError::Validation(e) => validation_error_json(e),
        PredictError::Inference(e) => json!({
            "error": "inference_error",
            "message": e.to_string(),
        }),
    }
}

pub fn validation_error_to_response(err: &ValidationError) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, axum::Json(validation_error_json(err))).into_response()
}

pub fn batch_error_to_response(err: BatchError) -> axum::response::Response {
    match err {
        BatchError::Empty => json_error(StatusCode::BAD_REQUEST, "no_samples", "No samples provided"),
        BatchError::TooLarge { .. } => json_error(StatusCode::BAD_REQUEST, "batch_too_large", err.to_string()),
    }
}

pub fn model_not_ready() -> axum::response::Response {
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "model_not_ready",
        "model artifact is not loaded yet",
    )
}

/// A body that is not JSON is `invalid_json`; JSON of the wrong shape is a
/// `validation_error` with no per-field detail.
pub fn body_error_to_response(err: serde_json::Error) -> axum::response::Response {
    if err.is_data() {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": err.to_string(),
                "fields": [],
            })),
        )
            .into_response()
    } else {
        json_error(StatusCode::BAD_REQUEST, "invalid_json", err.to_string())
    }
}

pub fn body_rejection_to_response(rejection: BytesRejection) -> axum::response::Response {
    let status = rejection.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        json_error(status, "payload_too_large", "request body exceeds the configured limit")
    } else {
        json_error(status, "invalid_body", rejection.body_text())
    }
}

/// Rewrites the bare 408 produced by the timeout layer into the JSON error shape.
pub async fn timeout_to_json(res: axum::response::Response) -> axum::response::Response {
    if res.status() == StatusCode::REQUEST_TIMEOUT {
        json_error(StatusCode::REQUEST_TIMEOUT, "request_timeout", "request did not complete in time")
    } else {
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn wrong_shape_is_a_validation_error() {
        let err = serde_json::from_str::<Vec<u8>>("5").unwrap_err();
        let res = body_error_to_response(err);

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["fields"], json!([]));
    }

    #[tokio::test]
    async fn syntax_errors_are_invalid_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let body = body_json(body_error_to_response(err)).await;
        assert_eq!(body["error"], "invalid_json");
    }

    #[tokio::test]
    async fn bare_timeouts_become_json() {
        let bare = StatusCode::REQUEST_TIMEOUT.into_response();
        let res = timeout_to_json(bare).await;

        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body_json(res).await["error"], "request_timeout");
    }

    #[tokio::test]
    async fn other_responses_pass_through() {
        let res = timeout_to_json(StatusCode::NO_CONTENT.into_response()).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
}
