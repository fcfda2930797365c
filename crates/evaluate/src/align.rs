//! Restricting series to their common valid timestamps.

use chrono::NaiveDateTime;
use ndarray::Array2;
use tellus_io::{EnsembleSeries, SiteSeries};

use crate::error::EvaluateError;

/// Fewest common points any score accepts.
pub const MIN_OVERLAP: usize = 2;

/// Observed and simulated values on their common valid timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub times: Vec<NaiveDateTime>,
    pub observed: Vec<f64>,
    pub simulated: Vec<f64>,
}

/// Observations and ensemble members on their common valid timestamps,
/// members stored `[time, member]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedEnsemble {
    pub times: Vec<NaiveDateTime>,
    pub observed: Vec<f64>,
    pub members: Array2<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl AlignedEnsemble {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Index pairs `(i, j)` with `a[i] == b[j]`, in time order. Both inputs are
/// strictly increasing.
fn common_indices(a: &[NaiveDateTime], b: &[NaiveDateTime]) -> Vec<(usize, usize)> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push((i, j));
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn check_overlap(n: usize) -> Result<(), EvaluateError> {
    if n < MIN_OVERLAP {
        return Err(EvaluateError::InsufficientOverlap {
            got: n,
            required: MIN_OVERLAP,
        });
    }
    Ok(())
}

/// Keeps the timestamps present in both series where both values are
/// finite.
///
/// # Errors
///
/// Returns [`EvaluateError::InsufficientOverlap`] if fewer than
/// [`MIN_OVERLAP`] timestamps remain.
pub fn align_pair(
    observed: &SiteSeries,
    simulated: &SiteSeries,
) -> Result<AlignedPair, EvaluateError> {
    let mut aligned = AlignedPair {
        times: Vec::new(),
        observed: Vec::new(),
        simulated: Vec::new(),
    };
    for (i, j) in common_indices(observed.times(), simulated.times()) {
        let (o, s) = (observed.values()[i], simulated.values()[j]);
        if o.is_finite() && s.is_finite() {
            aligned.times.push(observed.times()[i]);
            aligned.observed.push(o);
            aligned.simulated.push(s);
        }
    }
    check_overlap(aligned.len())?;
    Ok(aligned)
}

/// Keeps the timestamps present in both where the observation and every
/// member are finite.
///
/// # Errors
///
/// Returns [`EvaluateError::InsufficientOverlap`] if fewer than
/// [`MIN_OVERLAP`] timestamps remain.
pub fn align_ensemble(
    observed: &SiteSeries,
    ensemble: &EnsembleSeries,
) -> Result<AlignedEnsemble, EvaluateError> {
    let mut times = Vec::new();
    let mut obs = Vec::new();
    let mut rows = Vec::new();
    for (i, j) in common_indices(observed.times(), ensemble.times()) {
        let o = observed.values()[i];
        let row = ensemble.row(j);
        if o.is_finite() && row.iter().all(|v| v.is_finite()) {
            times.push(observed.times()[i]);
            obs.push(o);
            rows.push(j);
        }
    }
    check_overlap(times.len())?;

    let members = ensemble.values().select(ndarray::Axis(0), &rows);
    Ok(AlignedEnsemble {
        times,
        observed: obs,
        members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn day(d: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::days(d)
    }

    fn series(days: &[i64], values: &[f64]) -> SiteSeries {
        SiteSeries::new(days.iter().map(|&d| day(d)).collect(), values.to_vec()).unwrap()
    }

    #[test]
    fn intersection_drops_unmatched_timestamps() {
        let obs = series(&[1, 2, 3, 5], &[10.0, 20.0, 30.0, 50.0]);
        let sim = series(&[1, 2, 4, 5], &[11.0, 21.0, 41.0, 51.0]);
        let a = align_pair(&obs, &sim).unwrap();
        assert_eq!(a.times, vec![day(1), day(2), day(5)]);
        assert_eq!(a.observed, vec![10.0, 20.0, 50.0]);
        assert_eq!(a.simulated, vec![11.0, 21.0, 51.0]);
    }

    #[test]
    fn missing_values_are_not_common() {
        let obs = series(&[1, 2, 3], &[1.0, f64::NAN, 3.0]);
        let sim = series(&[1, 2, 3], &[1.0, 2.0, f64::NAN]);
        let err = align_pair(&obs, &sim).unwrap_err();
        assert!(matches!(
            err,
            EvaluateError::InsufficientOverlap { got: 1, required: 2 }
        ));
    }

    #[test]
    fn ensemble_rows_follow_common_times() {
        let obs = series(&[1, 2, 3], &[1.0, 2.0, 3.0]);
        let ens = EnsembleSeries::from_members(
            vec![day(0), day(1), day(2), day(3)],
            &[vec![0.0, 1.1, f64::NAN, 3.1], vec![0.0, 0.9, 2.0, 2.9]],
        )
        .unwrap();
        let a = align_ensemble(&obs, &ens).unwrap();
        assert_eq!(a.times, vec![day(1), day(3)]);
        assert_eq!(a.members.row(1).to_vec(), vec![3.1, 2.9]);
    }
}
