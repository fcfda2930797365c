//! Error types for the tellus-calendar crate.

/// Error type for all fallible operations in the tellus-calendar crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    /// Returned when the number of model steps per day does not divide a day.
    #[error("invalid steps per day: {steps} (must be >= 1 and divide 86400)")]
    InvalidStepsPerDay {
        /// The rejected step count.
        steps: u32,
    },

    /// Returned when a state stamp cannot be parsed.
    #[error("invalid state stamp '{stamp}': {reason}")]
    InvalidStamp {
        /// The offending stamp.
        stamp: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Returned when a time range is empty or reversed.
    #[error("invalid time range: {start} is not before {end}")]
    InvalidRange {
        /// Range start.
        start: String,
        /// Range end.
        end: String,
    },
}
