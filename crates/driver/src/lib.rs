//! # tellus-driver
//!
//! The land-surface simulator is an external program. This crate fixes the
//! contract for running it ([`SimulationDriver`]) and provides the adapter
//! that launches it as a child process ([`CommandDriver`]).
//!
//! ```mermaid
//! flowchart LR
//!     REQ[SimulationRequest] --> SEG[segments]
//!     SEG --> GP[render global file]
//!     GP --> L[Launcher]
//!     L --> H[HistoryProducts]
//! ```
//!
//! A run is split at every assigned-state time; each segment restarts from
//! its assigned state. Any failed segment aborts the whole run.

mod command;
mod config;
mod error;
mod launch;
mod request;
mod template;

pub use command::CommandDriver;
pub use config::{CommandDriverConfig, MpiLauncher};
pub use error::DriverError;
pub use launch::{Completion, Launcher, ProcessLauncher};
pub use request::{HistoryProducts, OutputDirs, Segment, SimulationRequest};

/// Runs the simulator for a request and hands back its history products.
///
/// Implementations block until the simulation has finished.
pub trait SimulationDriver {
    /// Runs the whole request.
    ///
    /// # Errors
    ///
    /// Any failure is fatal for the run; nothing is retried.
    fn run(&self, request: &SimulationRequest) -> Result<HistoryProducts, DriverError>;
}
