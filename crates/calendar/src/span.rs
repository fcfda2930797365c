//! Calendar years covered by a simulation run.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDateTime};

use crate::error::CalendarError;

/// Inclusive range of calendar years touched by `[start, end]`.
///
/// The simulator writes one history product per year in this range.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidRange`] if `start` is after `end`.
pub fn year_span(
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<RangeInclusive<i32>, CalendarError> {
    if start > end {
        return Err(CalendarError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(start.year()..=end.year())
}
