//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. Request-scoped
/// inputs such as [`crate::FeatureVector`] are value objects: two vectors with the
/// same measurements are interchangeable and are safe to share across threads.
///
/// The trait requires:
/// - **Clone**: value objects are cheap to copy
/// - **PartialEq**: compared by attribute values
/// - **Debug**: debuggable for logging and tests
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
