use serde::Deserialize;

use irisserve_core::FEATURE_COUNT;

use crate::forest::{RandomForest, RandomForestSpec};
use crate::logistic::{LogisticRegression, LogisticRegressionSpec};
use crate::result::InferenceError;
use crate::species::CLASS_COUNT;

/// A probabilistic classifier over standardized features.
///
/// Implementations are immutable after construction and must not hold any
/// interior mutable state: one instance serves every request concurrently.
pub trait Classifier: Send + Sync + 'static {
    /// Short identifier for logs and readiness output.
    fn kind(&self) -> &'static str;

    /// Per-class probabilities, in [`crate::Species::ALL`] order.
    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> Result<[f64; CLASS_COUNT], InferenceError>;
}

/// Serialized classifier, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    RandomForest(RandomForestSpec),
    LogisticRegression(LogisticRegressionSpec),
}

impl ClassifierSpec {
    /// Validate and build the runtime classifier.
    pub fn build(self) -> Result<Box<dyn Classifier>, String> {
        let classifier: Box<dyn Classifier> = match self {
            ClassifierSpec::RandomForest(spec) => Box::new(RandomForest::try_from(spec)?),
            ClassifierSpec::LogisticRegression(spec) => Box::new(LogisticRegression::try_from(spec)?),
        };
        Ok(classifier)
    }
}
