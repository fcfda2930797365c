//! Error types for the tellus-perturb crate.

use tellus_field::FieldError;

/// Error type for all fallible operations in the tellus-perturb crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PerturbError {
    /// Returned when the field to perturb has no values.
    #[error("input field is empty")]
    EmptyField,

    /// Returned when a noise standard deviation is negative or infinite.
    #[error("invalid noise sigma: {value} (must be finite and >= 0)")]
    InvalidSigma {
        /// The offending value.
        value: f64,
    },

    /// Wrapped error from the tellus-field crate.
    #[error(transparent)]
    Field(#[from] FieldError),
}
