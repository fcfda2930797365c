//! Error types for the tellus-field crate.

/// Error type for all fallible operations in the tellus-field crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// Returned when two fields combined in one operation disagree on an axis.
    #[error("misaligned axis '{axis}': {reason}")]
    Misaligned {
        /// Name of the offending axis.
        axis: String,
        /// What differed.
        reason: String,
    },

    /// Returned when a named axis does not exist on a field.
    #[error("axis '{axis}' not found (available: {available:?})")]
    MissingAxis {
        /// Requested axis name.
        axis: String,
        /// Axis names present on the field.
        available: Vec<String>,
    },

    /// Returned when an axis name appears twice.
    #[error("duplicate axis '{axis}'")]
    DuplicateAxis {
        /// The repeated name.
        axis: String,
    },

    /// Returned when data shape and coordinate lengths disagree.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Shape implied by the axes.
        expected: Vec<usize>,
        /// Shape of the data.
        got: Vec<usize>,
    },

    /// Returned when requested axis names are not a permutation of the field's axes.
    #[error("{requested:?} is not a permutation of {available:?}")]
    NotPermutation {
        /// Requested order.
        requested: Vec<String>,
        /// Axis names present on the field.
        available: Vec<String>,
    },

    /// Returned when a coordinate label is not present on an axis.
    #[error("label {label} not found on axis '{axis}'")]
    MissingLabel {
        /// Axis searched.
        axis: String,
        /// The missing label, formatted.
        label: String,
    },

    /// Returned when a positional index is past the end of an axis.
    #[error("index {index} out of bounds for axis '{axis}' of length {len}")]
    IndexOutOfBounds {
        /// Axis indexed.
        axis: String,
        /// Requested index.
        index: usize,
        /// Axis length.
        len: usize,
    },

    /// Returned when an operation needs at least one input field or label.
    #[error("empty input: {what}")]
    Empty {
        /// What was empty.
        what: String,
    },

    /// Returned when coordinates of the wrong kind are used.
    #[error("axis '{axis}' has {got} coordinates, expected {expected}")]
    CoordKind {
        /// Axis name.
        axis: String,
        /// Expected kind.
        expected: &'static str,
        /// Actual kind.
        got: &'static str,
    },
}
