//! Configuration of the external-process driver.

use std::path::{Path, PathBuf};

use crate::error::DriverError;

/// Placeholder in [`CommandDriverConfig::args`] replaced by the rendered
/// global parameter file path.
pub const GLOBAL_PLACEHOLDER: &str = "{{global}}";

/// Runs the simulator through an MPI launcher, e.g. `mpiexec -np 8 <exe>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpiLauncher {
    program: PathBuf,
    nprocs: u32,
}

impl MpiLauncher {
    pub fn new(program: impl Into<PathBuf>, nprocs: u32) -> Self {
        Self {
            program: program.into(),
            nprocs,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn nprocs(&self) -> u32 {
        self.nprocs
    }
}

/// Configuration for [`CommandDriver`](crate::CommandDriver).
///
/// The template is the text of a simulator global parameter file with
/// `{{start_year}}`, `{{start_month}}`, `{{start_day}}`, `{{start_sec}}`,
/// the matching `{{end_*}}` keys, `{{init_state}}`, `{{forcing}}`,
/// `{{steps_per_day}}`, `{{history_prefix}}` and `{{history_dir}}`.
#[derive(Debug, Clone)]
pub struct CommandDriverConfig {
    executable: PathBuf,
    args: Vec<String>,
    template: String,
    mpi: Option<MpiLauncher>,
    history_prefix: String,
}

impl CommandDriverConfig {
    /// Creates a config invoking `executable -g {{global}}`.
    pub fn new(executable: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            args: vec!["-g".to_string(), GLOBAL_PLACEHOLDER.to_string()],
            template: template.into(),
            mpi: None,
            history_prefix: "history".to_string(),
        }
    }

    /// Sets the simulator arguments; one must be `{{global}}`.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Launches through MPI.
    pub fn with_mpi(mut self, mpi: MpiLauncher) -> Self {
        self.mpi = Some(mpi);
        self
    }

    /// Sets the prefix history files are written under.
    pub fn with_history_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.history_prefix = prefix.into();
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn mpi(&self) -> Option<&MpiLauncher> {
        self.mpi.as_ref()
    }

    pub fn history_prefix(&self) -> &str {
        &self.history_prefix
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidConfig`] for an empty template or
    /// history prefix, arguments without `{{global}}`, or zero MPI processes.
    pub fn validate(&self) -> Result<(), DriverError> {
        let mut problems = Vec::new();
        if self.template.trim().is_empty() {
            problems.push("template is empty".to_string());
        }
        if self.history_prefix.is_empty() || self.history_prefix.contains('/') {
            problems.push(format!(
                "history prefix '{}' must be a non-empty file name",
                self.history_prefix
            ));
        }
        if !self.args.iter().any(|a| a.contains(GLOBAL_PLACEHOLDER)) {
            problems.push(format!("arguments must contain {GLOBAL_PLACEHOLDER}"));
        }
        if let Some(mpi) = &self.mpi
            && mpi.nprocs == 0
        {
            problems.push("mpi nprocs must be at least 1".to_string());
        }
        if !problems.is_empty() {
            return Err(DriverError::InvalidConfig {
                reason: problems.join("; "),
            });
        }
        Ok(())
    }
}
