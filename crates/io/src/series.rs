//! Site-indexed time series containers.

use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayView1};

use crate::error::IoError;

fn check_increasing(times: &[NaiveDateTime], what: &str) -> Result<(), IoError> {
    if let Some(w) = times.windows(2).find(|w| w[1] <= w[0]) {
        return Err(IoError::Validation {
            count: 1,
            details: format!("{what}: times not strictly increasing at {}", w[1]),
        });
    }
    Ok(())
}

/// A single series of (timestamp, value) pairs. NaN marks a missing value.
///
/// # Invariants
///
/// - `times.len() == values.len()`
/// - `times` is strictly increasing
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSeries {
    times: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl SiteSeries {
    /// Creates a series, validating the invariants.
    pub fn new(times: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self, IoError> {
        if times.len() != values.len() {
            return Err(IoError::DimensionMismatch {
                name: "time".to_string(),
                expected: times.len(),
                got: values.len(),
            });
        }
        check_increasing(&times, "site series")?;
        Ok(Self { times, values })
    }

    /// Timestamps.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Values, NaN where missing.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of timestamps.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns `true` if the series has no timestamps.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterates `(time, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}

/// An ensemble of series on a shared time axis, stored `[time, member]`.
///
/// The member count is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleSeries {
    times: Vec<NaiveDateTime>,
    values: Array2<f64>,
}

impl EnsembleSeries {
    /// Creates an ensemble series. Needs at least one member.
    pub fn new(times: Vec<NaiveDateTime>, values: Array2<f64>) -> Result<Self, IoError> {
        let (nt, nm) = values.dim();
        if nt != times.len() {
            return Err(IoError::DimensionMismatch {
                name: "time".to_string(),
                expected: times.len(),
                got: nt,
            });
        }
        if nm == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "ensemble has no members".to_string(),
            });
        }
        check_increasing(&times, "ensemble series")?;
        Ok(Self { times, values })
    }

    /// Builds an ensemble from per-member series on the same time axis.
    pub fn from_members(
        times: Vec<NaiveDateTime>,
        members: &[Vec<f64>],
    ) -> Result<Self, IoError> {
        let nt = times.len();
        let mut values = Array2::from_elem((nt, members.len()), f64::NAN);
        for (m, series) in members.iter().enumerate() {
            if series.len() != nt {
                return Err(IoError::DimensionMismatch {
                    name: format!("member {m}"),
                    expected: nt,
                    got: series.len(),
                });
            }
            for (t, &v) in series.iter().enumerate() {
                values[[t, m]] = v;
            }
        }
        Self::new(times, values)
    }

    /// Timestamps.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Values as `[time, member]`.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of members.
    pub fn n_members(&self) -> usize {
        self.values.ncols()
    }

    /// Number of timestamps.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns `true` if the series has no timestamps.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// All member values at time index `t`.
    pub fn row(&self, t: usize) -> ArrayView1<'_, f64> {
        self.values.row(t)
    }

    /// One member's series.
    pub fn member(&self, m: usize) -> Vec<f64> {
        self.values.column(m).to_vec()
    }
}
