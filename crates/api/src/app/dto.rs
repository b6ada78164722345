use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use irisserve_ai::{PredictError, PredictionResult};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /predict_multiple`.
///
/// Samples stay raw so each one is validated (and may fail) on its own.
/// A missing or `null` list is treated as empty.
#[derive(Debug, Deserialize)]
pub struct PredictMultipleRequest {
    #[serde(default)]
    pub samples: Option<Vec<JsonValue>>,
}

pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, axum::response::Response> {
    serde_json::from_slice(body).map_err(errors::body_error_to_response)
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn health_to_json() -> JsonValue {
    serde_json::json!({
        "status": "healthy",
        "message": "Iris Classification API is running!",
        "version": env!("CARGO_PKG_VERSION"),
    })
}

pub fn prediction_to_json(r: &PredictionResult) -> JsonValue {
    let mut body = serde_json::json!({
        "predicted_species": r.predicted_species,
        "confidence": r.confidence,
        "probabilities": r.probabilities,
        "measurements": r.measurements,
    });
    if let Some(warning) = &r.warning {
        body["warning"] = JsonValue::from(warning.as_str());
    }
    body
}

/// One entry of the batch response, tagged with its input index.
pub fn batch_element_to_json(sample_id: usize, outcome: &Result<PredictionResult, PredictError>) -> JsonValue {
    let mut body = match outcome {
        Ok(r) => prediction_to_json(r),
        Err(e) => errors::predict_error_json(e),
    };
    body["sample_id"] = JsonValue::from(sample_id);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use irisserve_core::{FeatureVector, ValidationError};

    fn result() -> PredictionResult {
        PredictionResult::from_distribution(FeatureVector::new(5.1, 3.5, 1.4, 0.2).unwrap(), [0.96, 0.04, 0.0]).unwrap()
    }

    #[test]
    fn prediction_json_has_the_public_shape() {
        let json = prediction_to_json(&result());

        assert_eq!(json["predicted_species"], "setosa");
        assert_eq!(json["confidence"], 0.96);
        assert_eq!(json["probabilities"]["virginica"], 0.0);
        assert_eq!(json["measurements"]["sepal_length"], 5.1);
        assert!(json.get("warning").is_none());
    }

    #[test]
    fn warning_is_included_when_present() {
        let json = prediction_to_json(&result().with_warning("odd"));
        assert_eq!(json["warning"], "odd");
    }

    #[test]
    fn batch_elements_carry_sample_ids() {
        let ok = batch_element_to_json(0, &Ok(result()));
        assert_eq!(ok["sample_id"], 0);
        assert_eq!(ok["predicted_species"], "setosa");

        let err = batch_element_to_json(3, &Err(PredictError::Validation(ValidationError::NotAnObject)));
        assert_eq!(err["sample_id"], 3);
        assert_eq!(err["error"], "validation_error");
        assert_eq!(err["fields"], serde_json::json!([]));
    }

    #[test]
    fn missing_or_null_samples_are_absent() {
        let req: PredictMultipleRequest = parse_body(b"{}").unwrap();
        assert!(req.samples.is_none());

        let req: PredictMultipleRequest = parse_body(br#"{"samples": null}"#).unwrap();
        assert!(req.samples.is_none());
    }

    #[test]
    fn non_array_samples_are_rejected() {
        let res = parse_body::<PredictMultipleRequest>(br#"{"samples": 5}"#).unwrap_err();
        assert_eq!(res.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
