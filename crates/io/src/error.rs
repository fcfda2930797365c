//! Error types for tellus-io.

use std::path::PathBuf;

use tellus_field::FieldError;

/// Errors raised while reading or writing model files and flow tables.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A copy or create on disk failed.
    #[error("filesystem error at {}: {reason}", path.display())]
    Filesystem { path: PathBuf, reason: String },

    #[error("netcdf error: {reason}")]
    Netcdf { reason: String },

    /// Parquet or Arrow failure.
    #[error("parquet error: {reason}")]
    Parquet { reason: String },

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error("calendar error: {reason}")]
    Calendar { reason: String },

    /// One or more schema or content checks failed; `details` joins them
    /// with "; ".
    #[error("{count} validation error(s): {details}")]
    Validation { count: usize, details: String },

    #[error("variable '{name}' not found in {}", path.display())]
    MissingVariable { name: String, path: PathBuf },

    #[error("dimension '{name}' mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Undecodable time units or an out-of-range timestamp.
    #[error("invalid time: {reason}")]
    InvalidTime { reason: String },

    /// Snapshots are write-once.
    #[error("snapshot already exists: {}", path.display())]
    SnapshotExists { path: PathBuf },

    #[error(transparent)]
    Field(#[from] FieldError),
}

impl From<netcdf::Error> for IoError {
    fn from(e: netcdf::Error) -> Self {
        IoError::Netcdf {
            reason: e.to_string(),
        }
    }
}

impl From<parquet::errors::ParquetError> for IoError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<arrow::error::ArrowError> for IoError {
    fn from(e: arrow::error::ArrowError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<csv::Error> for IoError {
    fn from(e: csv::Error) -> Self {
        IoError::Csv {
            reason: e.to_string(),
        }
    }
}

impl From<tellus_calendar::CalendarError> for IoError {
    fn from(e: tellus_calendar::CalendarError) -> Self {
        IoError::Calendar {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_file_not_found() {
        let err = IoError::FileNotFound {
            path: PathBuf::from("/tmp/missing.nc"),
        };
        assert_eq!(err.to_string(), "file not found: /tmp/missing.nc");
    }

    #[test]
    fn display_validation() {
        let err = IoError::Validation {
            count: 2,
            details: "site a: duplicate time; site b: empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "2 validation error(s): site a: duplicate time; site b: empty"
        );
    }

    #[test]
    fn display_missing_variable() {
        let err = IoError::MissingVariable {
            name: "STATE_SOIL_MOISTURE".to_string(),
            path: PathBuf::from("/data/state.nc"),
        };
        assert_eq!(
            err.to_string(),
            "variable 'STATE_SOIL_MOISTURE' not found in /data/state.nc"
        );
    }

    #[test]
    fn display_dimension_mismatch() {
        let err = IoError::DimensionMismatch {
            name: "nlayer".to_string(),
            expected: 3,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "dimension 'nlayer' mismatch: expected 3, got 2"
        );
    }

    #[test]
    fn display_snapshot_exists() {
        let err = IoError::SnapshotExists {
            path: PathBuf::from("/out/rescaled.state.20170101_00000.nc"),
        };
        assert_eq!(
            err.to_string(),
            "snapshot already exists: /out/rescaled.state.20170101_00000.nc"
        );
    }

    #[test]
    fn from_netcdf_error() {
        let nc_err = netcdf::Error::Str("test nc error".to_string());
        let err: IoError = nc_err.into();
        assert!(matches!(err, IoError::Netcdf { .. }));
        assert!(err.to_string().contains("test nc error"));
    }

    #[test]
    fn from_parquet_error() {
        let pq_err = parquet::errors::ParquetError::General("test pq error".to_string());
        let err: IoError = pq_err.into();
        assert!(matches!(err, IoError::Parquet { .. }));
        assert!(err.to_string().contains("test pq error"));
    }

    #[test]
    fn from_calendar_error() {
        let cal_err = tellus_calendar::CalendarError::InvalidStepsPerDay { steps: 0 };
        let err: IoError = cal_err.into();
        assert!(matches!(err, IoError::Calendar { .. }));
        assert!(err.to_string().contains("calendar error"));
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<IoError>();
    }
}
