use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use irisserve_core::{FeatureVector, ValidationError};

use crate::species::{CLASS_COUNT, Species};

/// Allowed deviation of the probability sum from 1.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// Outcome of a single inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_species: Species,

    /// Probability of the arg-max class.
    pub confidence: f64,

    /// Full per-class distribution.
    pub probabilities: BTreeMap<Species, f64>,

    /// The validated input, echoed back.
    pub measurements: FeatureVector,

    /// Set when the input lies outside the typical iris range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl PredictionResult {
    /// Build a result from a classifier distribution.
    ///
    /// Ties resolve to the lowest class index.
    pub fn from_distribution(
        measurements: FeatureVector,
        distribution: [f64; CLASS_COUNT],
    ) -> Result<Self, InferenceError> {
        check_distribution(&distribution)?;

        let mut best = 0;
        for (i, p) in distribution.iter().enumerate().skip(1) {
            if *p > distribution[best] {
                best = i;
            }
        }

        let probabilities = Species::ALL.into_iter().zip(distribution).collect();

        Ok(Self {
            predicted_species: Species::ALL[best],
            confidence: distribution[best],
            probabilities,
            measurements,
            warning: None,
        })
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn probability(&self, species: Species) -> f64 {
        self.probabilities.get(&species).copied().unwrap_or(0.0)
    }
}

fn check_distribution(distribution: &[f64; CLASS_COUNT]) -> Result<(), InferenceError> {
    if let Some(p) = distribution
        .iter()
        .find(|p| !p.is_finite() || **p < -1e-9 || **p > 1.0 + 1e-9)
    {
        return Err(InferenceError::InvalidDistribution(format!(
            "probability {p} outside [0, 1]"
        )));
    }

    let sum: f64 = distribution.iter().sum();
    if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(InferenceError::InvalidDistribution(format!(
            "probabilities sum to {sum}"
        )));
    }

    Ok(())
}

/// Model-side failure while predicting a validated input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("scaled feature {feature} is not finite")]
    NonFiniteFeature { feature: &'static str },

    #[error("malformed model: {0}")]
    MalformedModel(String),

    #[error("invalid probability distribution: {0}")]
    InvalidDistribution(String),
}

/// Per-request (or per-batch-element) prediction failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Whole-batch rejection, raised before any element is evaluated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("no samples provided")]
    Empty,

    #[error("batch of {size} samples exceeds the limit of {max}")]
    TooLarge { size: usize, max: usize },
}
