//! Error types for tellus-driver.

use std::path::PathBuf;

use tellus_calendar::CalendarError;

/// Errors that can occur while preparing or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The request is inconsistent (time range, assigned states).
    #[error("invalid simulation request: {reason}")]
    InvalidRequest {
        /// Description of the problem.
        reason: String,
    },

    /// The driver configuration is invalid.
    #[error("invalid driver config: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// A template placeholder was left unresolved.
    #[error("unresolved template placeholder '{placeholder}'")]
    Template {
        /// The placeholder text, braces included.
        placeholder: String,
    },

    /// The simulator process could not be started.
    #[error("failed to launch '{}': {reason}", program.display())]
    Launch {
        /// Program that failed to start.
        program: PathBuf,
        /// OS-level reason.
        reason: String,
    },

    /// The simulator finished with a non-zero status.
    #[error("simulation segment {segment} failed with {status}; see {}", log.display())]
    SimulationFailed {
        /// Zero-based segment index.
        segment: usize,
        /// Exit status description.
        status: String,
        /// Captured output of the failed segment.
        log: PathBuf,
    },

    /// A segment finished but left no history file behind.
    #[error("simulation segment {segment} wrote no history matching '{prefix}' in {}", dir.display())]
    MissingHistory {
        /// Zero-based segment index.
        segment: usize,
        /// History file prefix searched for.
        prefix: String,
        /// Directory searched.
        dir: PathBuf,
    },

    /// A filesystem operation failed.
    #[error("i/o error at {}: {reason}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Model-time arithmetic failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

impl DriverError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}
