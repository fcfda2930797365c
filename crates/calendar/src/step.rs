//! Model step length and history-time alignment.

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::CalendarError;

const SECONDS_PER_DAY: u32 = 86_400;

/// Duration of one model step.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidStepsPerDay`] unless `steps_per_day` is at
/// least 1 and divides a day into whole seconds.
pub fn step_length(steps_per_day: u32) -> Result<TimeDelta, CalendarError> {
    if steps_per_day == 0 || SECONDS_PER_DAY % steps_per_day != 0 {
        return Err(CalendarError::InvalidStepsPerDay {
            steps: steps_per_day,
        });
    }
    Ok(TimeDelta::seconds(i64::from(SECONDS_PER_DAY / steps_per_day)))
}

/// Relabels history records so they line up with state snapshot times.
///
/// History records carry the timestep-beginning label; each label is moved
/// back by one model step.
pub fn align_history_times(
    times: &[NaiveDateTime],
    steps_per_day: u32,
) -> Result<Vec<NaiveDateTime>, CalendarError> {
    let step = step_length(steps_per_day)?;
    Ok(times.iter().map(|&t| t - step).collect())
}
