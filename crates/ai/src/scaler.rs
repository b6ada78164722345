use serde::Deserialize;

use irisserve_core::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};

use crate::result::InferenceError;

/// Serialized form of a [`StandardScaler`].
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerSpec {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Per-feature standardization: `z = (x - mean) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    pub fn new(mean: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Result<Self, String> {
        if mean.iter().any(|m| !m.is_finite()) {
            return Err("scaler mean must be finite".to_string());
        }
        if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err("scaler scale must be finite and non-zero".to_string());
        }
        Ok(Self { mean, scale })
    }

    /// Standardize a validated feature vector.
    pub fn transform(&self, features: &FeatureVector) -> Result<[f64; FEATURE_COUNT], InferenceError> {
        let mut out = features.to_array();
        for (i, x) in out.iter_mut().enumerate() {
            *x = (*x - self.mean[i]) / self.scale[i];
            if !x.is_finite() {
                return Err(InferenceError::NonFiniteFeature {
                    feature: FEATURE_NAMES[i],
                });
            }
        }
        Ok(out)
    }
}

impl TryFrom<ScalerSpec> for StandardScaler {
    type Error = String;

    fn try_from(spec: ScalerSpec) -> Result<Self, Self::Error> {
        let mean: [f64; FEATURE_COUNT] = spec.mean.try_into().map_err(|v: Vec<f64>| {
            format!("scaler mean has {} entries, expected {FEATURE_COUNT}", v.len())
        })?;
        let scale: [f64; FEATURE_COUNT] = spec.scale.try_into().map_err(|v: Vec<f64>| {
            format!("scaler scale has {} entries, expected {FEATURE_COUNT}", v.len())
        })?;
        Self::new(mean, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_each_feature() {
        let scaler = StandardScaler::new([1.0, 2.0, 3.0, 4.0], [2.0, 2.0, 0.5, 1.0]).unwrap();
        let fv = FeatureVector::new(3.0, 2.0, 4.0, 2.0).unwrap();

        assert_eq!(scaler.transform(&fv).unwrap(), [1.0, 0.0, 2.0, -2.0]);
    }

    #[test]
    fn zero_scale_is_rejected() {
        assert!(StandardScaler::new([0.0; 4], [1.0, 0.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let err = StandardScaler::try_from(ScalerSpec {
            mean: vec![0.0; 3],
            scale: vec![1.0; 4],
        })
        .unwrap_err();
        assert!(err.contains("3 entries"));
    }

    #[test]
    fn overflow_is_an_inference_error() {
        let scaler = StandardScaler::new([0.0; 4], [1e-300, 1.0, 1.0, 1.0]).unwrap();
        let fv = FeatureVector::new(1e300, 1.0, 1.0, 1.0).unwrap();

        assert_eq!(
            scaler.transform(&fv),
            Err(InferenceError::NonFiniteFeature { feature: "sepal_length" })
        );
    }
}
