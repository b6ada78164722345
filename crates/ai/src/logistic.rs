//! Multinomial logistic regression (softmax over linear scores).

use serde::Deserialize;

use irisserve_core::FEATURE_COUNT;

use crate::classifier::Classifier;
use crate::result::InferenceError;
use crate::species::CLASS_COUNT;

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegressionSpec {
    /// One row of feature weights per class.
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    coefficients: [[f64; FEATURE_COUNT]; CLASS_COUNT],
    intercepts: [f64; CLASS_COUNT],
}

impl LogisticRegression {
    pub fn new(
        coefficients: [[f64; FEATURE_COUNT]; CLASS_COUNT],
        intercepts: [f64; CLASS_COUNT],
    ) -> Result<Self, String> {
        if coefficients.iter().flatten().chain(intercepts.iter()).any(|w| !w.is_finite()) {
            return Err("logistic regression weights must be finite".to_string());
        }
        Ok(Self {
            coefficients,
            intercepts,
        })
    }
}

impl TryFrom<LogisticRegressionSpec> for LogisticRegression {
    type Error = String;

    fn try_from(spec: LogisticRegressionSpec) -> Result<Self, Self::Error> {
        let rows = spec.coefficients.len();
        let rows: [Vec<f64>; CLASS_COUNT] = spec
            .coefficients
            .try_into()
            .map_err(|_| format!("expected {CLASS_COUNT} coefficient rows, found {rows}"))?;

        let mut coefficients = [[0.0; FEATURE_COUNT]; CLASS_COUNT];
        for (class, (dst, row)) in coefficients.iter_mut().zip(rows).enumerate() {
            *dst = row.try_into().map_err(|r: Vec<f64>| {
                format!("coefficient row {class} has {} entries, expected {FEATURE_COUNT}", r.len())
            })?;
        }

        let intercepts: [f64; CLASS_COUNT] = spec.intercepts.try_into().map_err(|v: Vec<f64>| {
            format!("expected {CLASS_COUNT} intercepts, found {}", v.len())
        })?;

        Self::new(coefficients, intercepts)
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> Result<[f64; CLASS_COUNT], InferenceError> {
        let mut scores = self.intercepts;
        for (score, row) in scores.iter_mut().zip(&self.coefficients) {
            *score += row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
        }

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(InferenceError::InvalidDistribution("non-finite class score".to_string()));
        }

        let exp = scores.map(|s| (s - max).exp());
        let total: f64 = exp.iter().sum();
        Ok(exp.map(|e| e / total))
    }
}
