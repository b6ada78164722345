//! `irisserve-ai`
//!
//! **Responsibility:** the model artifact and inference over it.
//!
//! - The artifact is loaded once and is immutable afterwards.
//! - Inference is synchronous, read-only, and safe to call from any number of
//!   threads through a shared reference.
//! - Input validation happens before any model code runs.

pub mod artifact;
pub mod classifier;
pub mod forest;
pub mod logistic;
pub mod predict;
pub mod result;
pub mod scaler;
pub mod species;

pub use artifact::{ARTIFACT_FORMAT_VERSION, ModelArtifact, ModelMetadata, StartupError};
pub use classifier::Classifier;
pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use predict::BatchOutcome;
pub use result::{BatchError, InferenceError, PredictError, PredictionResult};
pub use scaler::StandardScaler;
pub use species::{CLASS_COUNT, Species};

#[cfg(test)]
pub(crate) mod testing {
    use crate::ModelArtifact;

    pub const BUNDLED_MODEL: &str = include_str!("../../../deploy/iris-model.json");

    pub fn bundled_model() -> ModelArtifact {
        ModelArtifact::from_json_str(BUNDLED_MODEL, "deploy/iris-model.json").expect("bundled model loads")
    }
}
