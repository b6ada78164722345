use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value as JsonValue;

use irisserve_ai::PredictError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn predict(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Bytes, BytesRejection>,
) -> axum::response::Response {
    let Some(model) = services.model() else {
        return errors::model_not_ready();
    };
    let body = match body {
        Ok(b) => b,
        Err(rejection) => return errors::body_rejection_to_response(rejection),
    };

    let raw: JsonValue = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match model.predict_value(&raw) {
        Ok(result) => {
            services.record_success();
            Json(dto::prediction_to_json(&result)).into_response()
        }
        Err(PredictError::Validation(e)) => {
            tracing::debug!(error = %e, "rejected prediction input");
            errors::validation_error_to_response(&e)
        }
        Err(PredictError::Inference(e)) => {
            services.record_inference_failure(&e);
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "inference_error", e.to_string())
        }
    }
}

pub async fn predict_multiple(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Bytes, BytesRejection>,
) -> axum::response::Response {
    let Some(model) = services.model() else {
        return errors::model_not_ready();
    };
    let body = match body {
        Ok(b) => b,
        Err(rejection) => return errors::body_rejection_to_response(rejection),
    };

    let req: dto::PredictMultipleRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let samples = req.samples.unwrap_or_default();
    let outcome = match model.predict_batch(&samples, services.max_batch_size()) {
        Ok(o) => o,
        Err(e) => {
            tracing::debug!(error = %e, "rejected batch");
            return errors::batch_error_to_response(e);
        }
    };

    for r in &outcome {
        match r {
            Ok(_) => services.record_success(),
            Err(PredictError::Inference(e)) => services.record_inference_failure(e),
            Err(PredictError::Validation(_)) => {}
        }
    }

    Json(serde_json::json!({
        "total_samples": outcome.len(),
        "predictions": outcome
            .iter()
            .enumerate()
            .map(|(i, r)| dto::batch_element_to_json(i, r))
            .collect::<Vec<_>>(),
    }))
    .into_response()
}
