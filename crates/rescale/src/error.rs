//! Error types for the tellus-rescale crate.

use tellus_field::FieldError;

/// Error type for all fallible operations in the tellus-rescale crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RescaleError {
    /// Returned when a configuration parameter is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned under [`ZeroSpreadPolicy::Reject`](crate::ZeroSpreadPolicy::Reject)
    /// when truth cells have no temporal spread.
    #[error("{cells} cell(s) have zero temporal spread in the truth series")]
    ZeroSpread {
        /// Number of affected cells.
        cells: usize,
    },

    /// Returned when a static soil parameter is physically invalid.
    #[error("invalid soil parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// What was wrong.
        reason: String,
    },

    /// Wrapped error from the tellus-field crate.
    #[error(transparent)]
    Field(#[from] FieldError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_zero_spread() {
        let e = RescaleError::ZeroSpread { cells: 3 };
        assert_eq!(
            e.to_string(),
            "3 cell(s) have zero temporal spread in the truth series"
        );
    }

    #[test]
    fn display_invalid_parameter() {
        let e = RescaleError::InvalidParameter {
            name: "soil_dens".to_string(),
            reason: "must be > 0".to_string(),
        };
        assert!(e.to_string().contains("soil_dens"));
    }

    #[test]
    fn from_field_error() {
        let e: RescaleError = FieldError::Empty {
            what: "x".to_string(),
        }
        .into();
        assert!(matches!(e, RescaleError::Field(_)));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<RescaleError>();
    }
}
