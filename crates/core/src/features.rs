//! Iris measurements (the model's feature vector).

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{FieldError, FieldProblem, ValidationError, ValidationResult};
use crate::value_object::ValueObject;

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 4;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// Inclusive ranges (cm) covering typical iris specimens, in feature order.
const TYPICAL_RANGES: [(f64, f64); FEATURE_COUNT] = [(4.0, 8.0), (2.0, 4.5), (1.0, 7.0), (0.1, 2.5)];

/// Four validated, finite measurements in centimetres.
///
/// Only constructible through validation, so holding a `FeatureVector` means
/// every field is present and finite.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    sepal_length: f64,
    sepal_width: f64,
    petal_length: f64,
    petal_width: f64,
}

impl ValueObject for FeatureVector {}

impl FeatureVector {
    pub fn new(
        sepal_length: f64,
        sepal_width: f64,
        petal_length: f64,
        petal_width: f64,
    ) -> ValidationResult<Self> {
        Self::from_array([sepal_length, sepal_width, petal_length, petal_width])
    }

    /// Build from values in [`FEATURE_NAMES`] order.
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> ValidationResult<Self> {
        let errors: Vec<FieldError> = FEATURE_NAMES
            .iter()
            .zip(values.iter())
            .filter(|(_, v)| !v.is_finite())
            .map(|(name, _)| FieldError::new(*name, FieldProblem::NotFinite))
            .collect();

        if !errors.is_empty() {
            return Err(ValidationError::Fields(errors));
        }

        let [sepal_length, sepal_width, petal_length, petal_width] = values;
        Ok(Self {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
        })
    }

    /// Strict parse of a JSON sample.
    ///
    /// Every required field must be a JSON number; strings are not coerced and
    /// unknown fields are ignored. All offending fields are reported at once.
    pub fn from_json(value: &JsonValue) -> ValidationResult<Self> {
        let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let mut values = [0.0; FEATURE_COUNT];
        let mut errors = Vec::new();

        for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
            match obj.get(name) {
                None | Some(JsonValue::Null) => errors.push(FieldError::new(name, FieldProblem::Missing)),
                Some(JsonValue::Number(n)) => match n.as_f64() {
                    Some(v) if v.is_finite() => *slot = v,
                    _ => errors.push(FieldError::new(name, FieldProblem::NotFinite)),
                },
                Some(_) => errors.push(FieldError::new(name, FieldProblem::NotANumber)),
            }
        }

        if !errors.is_empty() {
            return Err(ValidationError::Fields(errors));
        }

        Self::from_array(values)
    }

    /// Values in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }

    /// Names of measurements that fall outside the typical iris range.
    ///
    /// Such inputs are still valid; callers may attach a warning.
    pub fn atypical_fields(&self) -> Vec<&'static str> {
        FEATURE_NAMES
            .iter()
            .zip(self.to_array())
            .zip(TYPICAL_RANGES)
            .filter(|((_, v), (lo, hi))| *v < *lo || *v > *hi)
            .map(|((name, _), _)| *name)
            .collect()
    }
}
