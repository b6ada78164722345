//! Input validation error model.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type used at the request boundary.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// What was wrong with a single input field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProblem {
    /// The field was absent (or `null`).
    Missing,
    /// The field was present but not a JSON number.
    NotANumber,
    /// The field was numeric but NaN or infinite.
    NotFinite,
}

impl FieldProblem {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldProblem::Missing => "missing",
            FieldProblem::NotANumber => "not_a_number",
            FieldProblem::NotFinite => "not_finite",
        }
    }
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub problem: FieldProblem,
}

impl FieldError {
    pub fn new(field: &'static str, problem: FieldProblem) -> Self {
        Self { field, problem }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is {}", self.field, self.problem.as_str().replace('_', " "))
    }
}

/// Rejected input. Raised before any model invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The sample was not a JSON object.
    #[error("measurements must be a JSON object")]
    NotAnObject,

    /// One or more of the required fields were missing or malformed.
    #[error("invalid measurements: {}", join_fields(.0))]
    Fields(Vec<FieldError>),
}

impl ValidationError {
    /// Field-level details (empty for [`ValidationError::NotAnObject`]).
    pub fn fields(&self) -> &[FieldError] {
        match self {
            ValidationError::NotAnObject => &[],
            ValidationError::Fields(fields) => fields,
        }
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
