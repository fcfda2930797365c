//! Evaluation error types.

use tellus_field::FieldError;
use tellus_io::IoError;

/// Errors that can occur during evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    /// Too few common valid timestamps to compute a score.
    #[error("insufficient overlap: {got} common point(s), need at least {required}")]
    InsufficientOverlap { got: usize, required: usize },

    /// A denominator of the score is zero.
    #[error("{metric} undefined: {reason}")]
    DegenerateStatistic {
        metric: &'static str,
        reason: String,
    },

    /// Two inputs that must be parallel have different lengths.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// An ensemble score was requested with too few members.
    #[error("{metric} needs at least {required} ensemble member(s), got {got}")]
    EnsembleTooSmall {
        metric: &'static str,
        required: usize,
        got: usize,
    },

    /// An input value lies outside the domain of the score.
    #[error("{metric}: invalid input {value}: {reason}")]
    InvalidValue {
        metric: &'static str,
        value: f64,
        reason: String,
    },

    /// One or more validation checks failed.
    #[error("{count} validation error(s): {details}")]
    Validation { count: usize, details: String },

    /// A required site was not found.
    #[error("site '{site}' not found in {location}")]
    MissingSite { site: String, location: String },

    /// JSON serialization failed.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A gridded input was malformed.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A derived series broke a series invariant.
    #[error(transparent)]
    Series(#[from] IoError),
}
