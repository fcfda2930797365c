//! Preprocessing of routed flow before scoring: time-zone shift, daily
//! averaging, truncation, ensemble mean.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use ndarray::{Array2, Axis};
use tellus_io::{EnsembleSeries, SiteSeries};
use tellus_stats::nanmean;

use crate::error::EvaluateError;

/// Moves every timestamp by `-lag_hours`; a routed series in UTC becomes
/// local time for a site at UTC-`lag_hours`.
pub fn shift_to_local(series: &SiteSeries, lag_hours: i64) -> Result<SiteSeries, EvaluateError> {
    let lag = TimeDelta::hours(lag_hours);
    let times = series.times().iter().map(|&t| t - lag).collect();
    Ok(SiteSeries::new(times, series.values().to_vec())?)
}

/// [`shift_to_local`] for every member.
pub fn shift_ensemble_to_local(
    series: &EnsembleSeries,
    lag_hours: i64,
) -> Result<EnsembleSeries, EvaluateError> {
    let lag = TimeDelta::hours(lag_hours);
    let times = series.times().iter().map(|&t| t - lag).collect();
    Ok(EnsembleSeries::new(times, series.values().clone())?)
}

/// Row ranges of consecutive timestamps sharing a calendar day, labelled
/// with every midnight from the first to the last day. Days without rows
/// get an empty range.
fn day_groups(times: &[NaiveDateTime]) -> Vec<(NaiveDateTime, std::ops::Range<usize>)> {
    let (Some(first), Some(last)) = (times.first(), times.last()) else {
        return Vec::new();
    };
    let mut groups = Vec::new();
    let mut day = first.date();
    let mut i = 0;
    while day <= last.date() {
        let start = i;
        while i < times.len() && times[i].date() == day {
            i += 1;
        }
        groups.push((day.and_time(NaiveTime::MIN), start..i));
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }
    groups
}

/// Daily NaN-aware mean, labelled at midnight. Days with no valid value
/// are NaN.
pub fn daily_mean(series: &SiteSeries) -> Result<SiteSeries, EvaluateError> {
    let groups = day_groups(series.times());
    let values = groups
        .iter()
        .map(|(_, r)| nanmean(&series.values()[r.clone()]))
        .collect();
    let times = groups.into_iter().map(|(t, _)| t).collect();
    Ok(SiteSeries::new(times, values)?)
}

/// [`daily_mean`] for every member.
pub fn daily_mean_ensemble(series: &EnsembleSeries) -> Result<EnsembleSeries, EvaluateError> {
    let groups = day_groups(series.times());
    let mut out = Array2::from_elem((groups.len(), series.n_members()), f64::NAN);
    for (row, (_, r)) in out.rows_mut().into_iter().zip(&groups) {
        let block = series.values().slice(ndarray::s![r.clone(), ..]);
        for (v, member) in row.into_iter().zip(block.axis_iter(Axis(1))) {
            *v = nanmean(&member.to_vec());
        }
    }
    let times = groups.into_iter().map(|(t, _)| t).collect();
    Ok(EnsembleSeries::new(times, out)?)
}

fn within(times: &[NaiveDateTime], start: NaiveDateTime, end: NaiveDateTime) -> Vec<usize> {
    times
        .iter()
        .enumerate()
        .filter(|(_, t)| **t >= start && **t <= end)
        .map(|(i, _)| i)
        .collect()
}

/// Keeps `start <= t <= end`.
pub fn truncate(
    series: &SiteSeries,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<SiteSeries, EvaluateError> {
    let keep = within(series.times(), start, end);
    Ok(SiteSeries::new(
        keep.iter().map(|&i| series.times()[i]).collect(),
        keep.iter().map(|&i| series.values()[i]).collect(),
    )?)
}

/// Keeps `start <= t <= end` for every member.
pub fn truncate_ensemble(
    series: &EnsembleSeries,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<EnsembleSeries, EvaluateError> {
    let keep = within(series.times(), start, end);
    Ok(EnsembleSeries::new(
        keep.iter().map(|&i| series.times()[i]).collect(),
        series.values().select(Axis(0), &keep),
    )?)
}

/// NaN-aware mean across members at each timestamp.
pub fn ensemble_mean(series: &EnsembleSeries) -> Result<SiteSeries, EvaluateError> {
    let values = series
        .values()
        .rows()
        .into_iter()
        .map(|row| nanmean(&row.to_vec()))
        .collect();
    Ok(SiteSeries::new(series.times().to_vec(), values)?)
}
