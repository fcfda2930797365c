//! Simulation requests, their segments, and the history products a run
//! leaves behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tellus_calendar::step_length;

use crate::error::DriverError;

/// Output directory layout of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    /// Rendered global parameter files.
    pub global: PathBuf,
    /// History products.
    pub history: PathBuf,
    /// Captured simulator output.
    pub logs: PathBuf,
}

impl OutputDirs {
    /// The conventional `global/`, `history/`, `logs/` layout under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            global: root.join("global"),
            history: root.join("history"),
            logs: root.join("logs"),
        }
    }

    pub(crate) fn create(&self) -> Result<(), DriverError> {
        for dir in [&self.global, &self.history, &self.logs] {
            std::fs::create_dir_all(dir).map_err(|e| DriverError::io(dir, e))?;
        }
        Ok(())
    }
}

/// One simulation run: a time range, a starting state, and states that
/// replace the simulated state at given instants.
///
/// `start` and `end` are the first and last model step of the run.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    start: NaiveDateTime,
    end: NaiveDateTime,
    initial_state: PathBuf,
    assigned_states: BTreeMap<NaiveDateTime, PathBuf>,
    forcing_pattern: String,
    steps_per_day: u32,
    output: OutputDirs,
}

/// A stretch of the run between two state assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Zero-based position in the run.
    pub index: usize,
    /// First model step.
    pub start: NaiveDateTime,
    /// Last model step.
    pub end: NaiveDateTime,
    /// State the segment starts from.
    pub init_state: PathBuf,
}

impl SimulationRequest {
    /// Creates a request with no assigned states.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        initial_state: impl Into<PathBuf>,
        forcing_pattern: impl Into<String>,
        steps_per_day: u32,
        output: OutputDirs,
    ) -> Self {
        Self {
            start,
            end,
            initial_state: initial_state.into(),
            assigned_states: BTreeMap::new(),
            forcing_pattern: forcing_pattern.into(),
            steps_per_day,
            output,
        }
    }

    /// Sets the state files to restart from, keyed by instant.
    pub fn with_assigned_states(mut self, states: BTreeMap<NaiveDateTime, PathBuf>) -> Self {
        self.assigned_states = states;
        self
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn initial_state(&self) -> &Path {
        &self.initial_state
    }

    pub fn assigned_states(&self) -> &BTreeMap<NaiveDateTime, PathBuf> {
        &self.assigned_states
    }

    pub fn forcing_pattern(&self) -> &str {
        &self.forcing_pattern
    }

    pub fn steps_per_day(&self) -> u32 {
        self.steps_per_day
    }

    pub fn output(&self) -> &OutputDirs {
        &self.output
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// - [`DriverError::Calendar`] if `steps_per_day` is not a divisor of a day.
    /// - [`DriverError::InvalidRequest`] if `start >= end`, or an assigned
    ///   time lies outside `(start, end]` or off the model step grid.
    pub fn validate(&self) -> Result<(), DriverError> {
        let step = step_length(self.steps_per_day)?;
        if self.start >= self.end {
            return Err(DriverError::InvalidRequest {
                reason: format!("start {} is not before end {}", self.start, self.end),
            });
        }
        if self.forcing_pattern.is_empty() {
            return Err(DriverError::InvalidRequest {
                reason: "forcing pattern is empty".to_string(),
            });
        }
        let step_secs = step.num_seconds();
        for &t in self.assigned_states.keys() {
            if t <= self.start || t > self.end {
                return Err(DriverError::InvalidRequest {
                    reason: format!(
                        "assigned state at {t} outside ({}, {}]",
                        self.start, self.end
                    ),
                });
            }
            if (t - self.start).num_seconds() % step_secs != 0 {
                return Err(DriverError::InvalidRequest {
                    reason: format!("assigned state at {t} is not on the model step grid"),
                });
            }
        }
        Ok(())
    }

    /// Splits the run at each assigned-state time.
    ///
    /// Segment `k > 0` starts at the `k`-th assigned time from that state and
    /// ends one model step before the next assigned time (or at `end`).
    pub fn segments(&self) -> Result<Vec<Segment>, DriverError> {
        self.validate()?;
        let step = step_length(self.steps_per_day)?;

        let mut starts: Vec<(NaiveDateTime, &Path)> = vec![(self.start, &self.initial_state)];
        starts.extend(self.assigned_states.iter().map(|(t, p)| (*t, p.as_path())));

        let segments = starts
            .iter()
            .enumerate()
            .map(|(index, &(start, init))| {
                let end = starts.get(index + 1).map_or(self.end, |(next, _)| *next - step);
                Segment {
                    index,
                    start,
                    end,
                    init_state: init.to_path_buf(),
                }
            })
            .collect();
        Ok(segments)
    }
}

/// History files written by a run, in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryProducts {
    files: Vec<PathBuf>,
}

impl HistoryProducts {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn into_files(self) -> Vec<PathBuf> {
        self.files
    }
}
