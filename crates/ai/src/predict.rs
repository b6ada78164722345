//! `Predict` and `PredictBatch` over a loaded [`ModelArtifact`].

use serde_json::Value as JsonValue;

use irisserve_core::FeatureVector;

use crate::artifact::ModelArtifact;
use crate::result::{BatchError, InferenceError, PredictError, PredictionResult};

/// Per-element outcomes of a batch, in input order.
pub type BatchOutcome = Vec<Result<PredictionResult, PredictError>>;

const ATYPICAL_WARNING: &str = "measurements outside typical iris range";

impl ModelArtifact {
    /// Scale, classify and summarize a validated feature vector.
    ///
    /// Read-only with respect to the artifact.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, InferenceError> {
        let scaled = self.scaler().transform(features)?;
        let distribution = self.classifier().predict_proba(&scaled)?;
        let result = PredictionResult::from_distribution(*features, distribution)?;

        if features.atypical_fields().is_empty() {
            Ok(result)
        } else {
            Ok(result.with_warning(ATYPICAL_WARNING))
        }
    }

    /// Validate a raw JSON sample, then predict.
    ///
    /// The classifier is never invoked for input that fails validation.
    pub fn predict_value(&self, raw: &JsonValue) -> Result<PredictionResult, PredictError> {
        let features = FeatureVector::from_json(raw)?;
        Ok(self.predict(&features)?)
    }

    /// Evaluate every sample independently, preserving order.
    ///
    /// The batch is rejected as a whole, before any element runs, when it is
    /// empty or longer than `max_batch_size`.
    pub fn predict_batch(&self, samples: &[JsonValue], max_batch_size: usize) -> Result<BatchOutcome, BatchError> {
        if samples.is_empty() {
            return Err(BatchError::Empty);
        }
        if samples.len() > max_batch_size {
            return Err(BatchError::TooLarge {
                size: samples.len(),
                max: max_batch_size,
            });
        }

        let outcome: BatchOutcome = samples.iter().map(|s| self.predict_value(s)).collect();

        let failed = outcome.iter().filter(|r| r.is_err()).count();
        tracing::debug!(samples = samples.len(), failed, "batch evaluated");

        Ok(outcome)
    }
}
