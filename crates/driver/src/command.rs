//! The external-process [`SimulationDriver`].

use std::path::{Path, PathBuf};

use tracing::{info, info_span};

use crate::SimulationDriver;
use crate::config::{CommandDriverConfig, GLOBAL_PLACEHOLDER};
use crate::error::DriverError;
use crate::launch::{Launcher, ProcessLauncher};
use crate::request::{HistoryProducts, Segment, SimulationRequest};
use crate::template::{render, time_vars};

/// Runs the simulator binary once per segment of a request.
///
/// For each segment a global parameter file is rendered from the template
/// into the `global` dir, the simulator is launched with its output captured
/// under `logs`, and the history files it wrote under
/// `{history_prefix}.{segment:03}.` are collected.
#[derive(Debug, Clone)]
pub struct CommandDriver<L = ProcessLauncher> {
    config: CommandDriverConfig,
    launcher: L,
}

impl CommandDriver<ProcessLauncher> {
    pub fn new(config: CommandDriverConfig) -> Self {
        Self {
            config,
            launcher: ProcessLauncher,
        }
    }
}

impl<L: Launcher> CommandDriver<L> {
    /// Uses `launcher` in place of spawning processes directly.
    pub fn with_launcher(config: CommandDriverConfig, launcher: L) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &CommandDriverConfig {
        &self.config
    }

    fn segment_prefix(&self, segment: &Segment) -> String {
        format!("{}.{:03}", self.config.history_prefix(), segment.index)
    }

    fn render_global(
        &self,
        request: &SimulationRequest,
        segment: &Segment,
    ) -> Result<PathBuf, DriverError> {
        let dirs = request.output();
        let mut vars: Vec<(String, String)> = Vec::new();
        vars.extend(time_vars("start", segment.start));
        vars.extend(time_vars("end", segment.end));
        vars.push((
            "init_state".to_string(),
            segment.init_state.display().to_string(),
        ));
        vars.push(("forcing".to_string(), request.forcing_pattern().to_string()));
        vars.push((
            "steps_per_day".to_string(),
            request.steps_per_day().to_string(),
        ));
        vars.push(("history_prefix".to_string(), self.segment_prefix(segment)));
        vars.push((
            "history_dir".to_string(),
            dirs.history.display().to_string(),
        ));

        let text = render(self.config.template(), &vars)?;
        let path = dirs
            .global
            .join(format!("global.{:03}.txt", segment.index));
        std::fs::write(&path, text).map_err(|e| DriverError::io(&path, e))?;
        Ok(path)
    }

    fn command_line(&self, global: &Path) -> (PathBuf, Vec<String>) {
        let global = global.display().to_string();
        let sim_args = self
            .config
            .args()
            .iter()
            .map(|a| a.replace(GLOBAL_PLACEHOLDER, &global));
        match self.config.mpi() {
            Some(mpi) => {
                let mut args = vec![
                    "-np".to_string(),
                    mpi.nprocs().to_string(),
                    self.config.executable().display().to_string(),
                ];
                args.extend(sim_args);
                (mpi.program().to_path_buf(), args)
            }
            None => (self.config.executable().to_path_buf(), sim_args.collect()),
        }
    }

    fn run_segment(
        &self,
        request: &SimulationRequest,
        segment: &Segment,
    ) -> Result<Vec<PathBuf>, DriverError> {
        let _span = info_span!("segment", index = segment.index).entered();
        let history_dir = &request.output().history;
        let prefix = self.segment_prefix(segment);

        let stale = history_files(history_dir, &prefix)?;
        if !stale.is_empty() {
            return Err(DriverError::InvalidRequest {
                reason: format!(
                    "{} already holds {} history file(s) for '{prefix}'",
                    history_dir.display(),
                    stale.len()
                ),
            });
        }

        let global = self.render_global(request, segment)?;
        let (program, args) = self.command_line(&global);
        let log = request
            .output()
            .logs
            .join(format!("segment_{:03}.log", segment.index));

        info!(
            start = %segment.start,
            end = %segment.end,
            init_state = %segment.init_state.display(),
            "running simulation segment"
        );
        let done = self.launcher.launch(&program, &args, &log)?;
        if !done.success() {
            return Err(DriverError::SimulationFailed {
                segment: segment.index,
                status: done.describe(),
                log,
            });
        }

        let files = history_files(history_dir, &prefix)?;
        if files.is_empty() {
            return Err(DriverError::MissingHistory {
                segment: segment.index,
                prefix,
                dir: history_dir.clone(),
            });
        }
        Ok(files)
    }
}

impl<L: Launcher> SimulationDriver for CommandDriver<L> {
    #[tracing::instrument(skip_all, fields(start = %request.start(), end = %request.end()))]
    fn run(&self, request: &SimulationRequest) -> Result<HistoryProducts, DriverError> {
        self.config.validate()?;
        let segments = request.segments()?;
        request.output().create()?;

        let mut files = Vec::new();
        for segment in &segments {
            files.extend(self.run_segment(request, segment)?);
        }
        info!(
            segments = segments.len(),
            history_files = files.len(),
            "simulation finished"
        );
        Ok(HistoryProducts::new(files))
    }
}

/// `.nc` files in `dir` named `{prefix}.*`, sorted by name.
fn history_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, DriverError> {
    let lead = format!("{prefix}.");
    let entries = std::fs::read_dir(dir).map_err(|e| DriverError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DriverError::io(dir, e))?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&lead) && n.ends_with(".nc"));
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
