//! `irisserve-core`: request-scoped domain values for the iris classifier.
//!
//! This crate contains **pure domain** primitives (no I/O, no model access).

pub mod error;
pub mod features;
pub mod value_object;

pub use error::{FieldError, FieldProblem, ValidationError, ValidationResult};
pub use features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
pub use value_object::ValueObject;
