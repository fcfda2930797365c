//! Launching the simulator process.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::DriverError;

/// How a launched simulator finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Exit code; `None` if the process was killed by a signal.
    pub code: Option<i32>,
}

impl Completion {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub(crate) fn describe(&self) -> String {
        match self.code {
            Some(c) => format!("exit code {c}"),
            None => "termination by signal".to_string(),
        }
    }
}

/// Starts a program and waits for it to finish.
///
/// Separates process handling from segment bookkeeping so the driver can be
/// exercised without a simulator binary.
pub trait Launcher {
    /// Runs `program args..`, sending stdout and stderr to `log`.
    fn launch(&self, program: &Path, args: &[String], log: &Path)
    -> Result<Completion, DriverError>;
}

/// [`Launcher`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(
        &self,
        program: &Path,
        args: &[String],
        log: &Path,
    ) -> Result<Completion, DriverError> {
        let stdout = File::create(log).map_err(|e| DriverError::io(log, e))?;
        let stderr = stdout.try_clone().map_err(|e| DriverError::io(log, e))?;

        debug!(program = %program.display(), ?args, log = %log.display(), "launching");
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status()
            .map_err(|e| DriverError::Launch {
                program: PathBuf::from(program),
                reason: e.to_string(),
            })?;
        Ok(Completion {
            code: status.code(),
        })
    }
}
