//! Temporal mean and spread per grid location.

use tellus_field::Field;

use crate::error::RescaleError;

/// Temporal mean and population standard deviation of a series, one value
/// per combination of the non-time axes.
///
/// Missing values are skipped; locations with no valid values get NaN for
/// both statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Climatology {
    mean: Field,
    std: Field,
}

impl Climatology {
    /// Reduces `series` over `time_axis`.
    pub fn from_series(series: &Field, time_axis: &str) -> Result<Self, RescaleError> {
        let mean = series.nanmean_along(time_axis)?;
        let std = series.nanstd_along(time_axis)?;
        Ok(Self { mean, std })
    }

    /// Temporal mean.
    pub fn mean(&self) -> &Field {
        &self.mean
    }

    /// Temporal standard deviation (ddof = 0).
    pub fn std(&self) -> &Field {
        &self.std
    }
}
