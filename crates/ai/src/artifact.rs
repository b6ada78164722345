//! Model artifact loading.
//!
//! ## Responsibility
//! Read a JSON artifact from disk, check it against the expected schema, and
//! produce an immutable [`ModelArtifact`]. Any failure here is fatal to the
//! process: there is no fallback model.
//!
//! ## Guarantees
//! - A successfully loaded artifact has a valid scaler and classifier
//! - I/O, parse and schema errors are distinguished in [`StartupError`]
//! - The artifact path is included in every error message

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{Classifier, ClassifierSpec};
use crate::scaler::{ScalerSpec, StandardScaler};
use crate::species::Species;

/// Artifact schema version this build understands.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model artifact {path} has format_version {found}, expected {expected}")]
    UnsupportedVersion { path: String, found: u32, expected: u32 },

    #[error("model artifact {path} does not match the expected schema: {reason}")]
    Schema { path: String, reason: String },
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    format_version: u32,
    name: String,
    version: String,
    classes: Vec<String>,
    scaler: ScalerSpec,
    classifier: ClassifierSpec,
}

/// Descriptive metadata carried by the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelMetadata {
    pub name: String,
    pub version: String,
}

/// The loaded scaler + classifier pair.
///
/// Immutable after construction; share it by reference (or `Arc`) across
/// request handlers.
pub struct ModelArtifact {
    metadata: ModelMetadata,
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
}

impl ModelArtifact {
    /// Load and validate an artifact file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StartupError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_json_str(&content, &path.display().to_string())
    }

    /// Parse and validate an artifact from a JSON string.
    ///
    /// `source_name` is only used in error messages.
    pub fn from_json_str(content: &str, source_name: &str) -> Result<Self, StartupError> {
        let file: ArtifactFile = serde_json::from_str(content).map_err(|e| StartupError::Parse {
            path: source_name.to_string(),
            source: e,
        })?;

        let schema = |reason: String| StartupError::Schema {
            path: source_name.to_string(),
            reason,
        };

        if file.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(StartupError::UnsupportedVersion {
                path: source_name.to_string(),
                found: file.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        let expected: Vec<&str> = Species::ALL.iter().map(Species::as_str).collect();
        if file.classes != expected {
            return Err(schema(format!(
                "classes {:?} do not match {:?}",
                file.classes, expected
            )));
        }

        let scaler = StandardScaler::try_from(file.scaler).map_err(schema)?;
        let classifier = file.classifier.build().map_err(schema)?;

        Ok(Self {
            metadata: ModelMetadata {
                name: file.name,
                version: file.version,
            },
            scaler,
            classifier,
        })
    }

    /// Assemble an artifact from already-validated parts.
    pub fn from_parts(metadata: ModelMetadata, scaler: StandardScaler, classifier: impl Classifier) -> Self {
        Self {
            metadata,
            scaler,
            classifier: Box::new(classifier),
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn classifier_kind(&self) -> &'static str {
        self.classifier.kind()
    }

    pub(crate) fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub(crate) fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("metadata", &self.metadata)
            .field("scaler", &self.scaler)
            .field("classifier", &self.classifier.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BUNDLED_MODEL;
    use serde_json::{Value, json};

    fn bundled_json() -> Value {
        serde_json::from_str(BUNDLED_MODEL).unwrap()
    }

    fn load_value(value: &Value) -> Result<ModelArtifact, StartupError> {
        ModelArtifact::from_json_str(&value.to_string(), "test.json")
    }

    #[test]
    fn bundled_artifact_loads_from_disk() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../deploy/iris-model.json");
        let model = ModelArtifact::load(path).unwrap();

        assert_eq!(model.metadata().name, "iris-random-forest");
        assert_eq!(model.metadata().version, "1.0.0");
        assert_eq!(model.classifier_kind(), "random_forest");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ModelArtifact::load("/definitely/not/here/model.json").unwrap_err();
        assert!(matches!(err, StartupError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here/model.json"));
    }

    #[test]
    fn corrupt_json_is_a_parse_error() {
        let err = ModelArtifact::from_json_str("{ not json", "corrupt.json").unwrap_err();
        assert!(matches!(err, StartupError::Parse { .. }));
        assert!(err.to_string().contains("corrupt.json"));
    }

    #[test]
    fn missing_classifier_is_a_parse_error() {
        let mut value = bundled_json();
        value.as_object_mut().unwrap().remove("classifier");

        assert!(matches!(load_value(&value), Err(StartupError::Parse { .. })));
    }

    #[test]
    fn unknown_classifier_kind_is_a_parse_error() {
        let mut value = bundled_json();
        value["classifier"] = json!({ "kind": "svm", "support_vectors": [] });

        assert!(matches!(load_value(&value), Err(StartupError::Parse { .. })));
    }

    #[test]
    fn future_format_version_is_rejected() {
        let mut value = bundled_json();
        value["format_version"] = json!(2);

        assert!(matches!(
            load_value(&value),
            Err(StartupError::UnsupportedVersion { found: 2, expected: 1, .. })
        ));
    }

    #[test]
    fn reordered_classes_are_a_schema_mismatch() {
        let mut value = bundled_json();
        value["classes"] = json!(["virginica", "versicolor", "setosa"]);

        assert!(matches!(load_value(&value), Err(StartupError::Schema { .. })));
    }

    #[test]
    fn bad_scaler_is_a_schema_mismatch() {
        let mut value = bundled_json();
        value["scaler"]["scale"] = json!([1.0, 0.0, 1.0, 1.0]);

        let err = load_value(&value).unwrap_err();
        assert!(matches!(err, StartupError::Schema { .. }));
        assert!(err.to_string().contains("non-zero"));
    }

    #[test]
    fn bad_tree_is_a_schema_mismatch() {
        let mut value = bundled_json();
        value["classifier"]["trees"][0]["nodes"][0]["left"] = json!(99);

        assert!(matches!(load_value(&value), Err(StartupError::Schema { .. })));
    }

    #[test]
    fn logistic_regression_artifacts_load() {
        let mut value = bundled_json();
        value["classifier"] = json!({
            "kind": "logistic_regression",
            "coefficients": [[0.0, 0.0, -3.0, -3.0], [0.0, 0.0, 0.5, 0.0], [0.0, 0.0, 3.0, 3.0]],
            "intercepts": [0.0, 1.0, 0.0]
        });

        let model = load_value(&value).unwrap();
        assert_eq!(model.classifier_kind(), "logistic_regression");
    }

    #[test]
    fn artifact_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ModelArtifact>();
    }
}
