//! Reducing gridded simulator output to per-basin quantities.

use tellus_field::{Field, FieldError};
use tellus_io::SiteSeries;
use tellus_stats::nanmean;
use tracing::debug;

use crate::error::EvaluateError;

const GRID: [&str; 2] = ["lat", "lon"];

/// Square kilometres per square mile (1.60934 km per statute mile, squared).
pub const KM2_PER_MI2: f64 = 1.60934 * 1.60934;

/// Converts a gauge drainage area from square miles to square kilometres.
pub fn mi2_to_km2(area_mi2: f64) -> f64 {
    area_mi2 * KM2_PER_MI2
}
const SERIES: [&str; 3] = ["time", "lat", "lon"];

/// How a cell's contributing fraction weights it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Weighting {
    /// Any cell with a positive fraction counts with its full area.
    #[default]
    Membership,
    /// Each cell counts with `fraction * area`.
    Fractional,
}

/// Fraction of each grid cell draining to one site, on `[lat, lon]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BasinMask {
    fraction: Field,
}

impl BasinMask {
    /// Wraps a fraction field whose axes are exactly `lat` and `lon`.
    pub fn new(fraction: Field) -> Result<Self, EvaluateError> {
        if fraction.axes().len() != GRID.len() {
            return Err(FieldError::Misaligned {
                axis: "lat/lon".to_string(),
                reason: format!("basin mask has axes {:?}", fraction.names()),
            }
            .into());
        }
        let fraction = fraction.transpose_to(&GRID)?;
        Ok(Self { fraction })
    }

    pub fn fraction(&self) -> &Field {
        &self.fraction
    }

    /// Per-cell weight in m² (`[lat, lon]` row-major), zero outside the basin.
    fn cell_weights(&self, area: &Field, weighting: Weighting) -> Result<Vec<f64>, EvaluateError> {
        area.check_aligned(&self.fraction)?;
        let area = area.transpose_to(&GRID)?;
        Ok(self
            .fraction
            .values()
            .into_iter()
            .zip(area.values())
            .map(|(f, a)| {
                if f.is_nan() || f <= 0.0 || !a.is_finite() {
                    return 0.0;
                }
                match weighting {
                    Weighting::Membership => a,
                    Weighting::Fractional => f * a,
                }
            })
            .collect())
    }
}

/// Basin area in km².
///
/// `area` holds cell areas in m² on the mask's grid.
pub fn basin_area_km2(
    mask: &BasinMask,
    area: &Field,
    weighting: Weighting,
) -> Result<f64, EvaluateError> {
    let total: f64 = mask.cell_weights(area, weighting)?.iter().sum();
    Ok(total / 1.0e6)
}

/// Area-weighted basin sum of a `[time, lat, lon]` field at each time.
///
/// Missing cells are skipped; a time with no valid basin cell is NaN.
pub fn basin_total(
    field: &Field,
    mask: &BasinMask,
    area: &Field,
    weighting: Weighting,
) -> Result<SiteSeries, EvaluateError> {
    let ordered = field.transpose_to(&SERIES)?;
    for name in GRID {
        if ordered.axis(name)? != mask.fraction.axis(name)? {
            return Err(FieldError::Misaligned {
                axis: name.to_string(),
                reason: "field grid differs from basin mask".to_string(),
            }
            .into());
        }
    }
    let weights = mask.cell_weights(area, weighting)?;
    let values = ordered.values();
    let totals = values
        .chunks(weights.len().max(1))
        .map(|step| {
            let mut sum = 0.0;
            let mut valid = 0usize;
            for (v, w) in step.iter().zip(&weights) {
                if *w > 0.0 && v.is_finite() {
                    sum += v * w;
                    valid += 1;
                }
            }
            if valid == 0 { f64::NAN } else { sum }
        })
        .collect();
    Ok(SiteSeries::new(ordered.times("time")?.to_vec(), totals)?)
}

/// Time-mean basin baseflow divided by time-mean basin total runoff
/// (`runoff + baseflow`).
///
/// # Errors
///
/// Returns [`EvaluateError::DegenerateStatistic`] if the basin produced no
/// runoff.
pub fn baseflow_fraction(
    baseflow: &Field,
    runoff: &Field,
    mask: &BasinMask,
    area: &Field,
    weighting: Weighting,
) -> Result<f64, EvaluateError> {
    baseflow.check_aligned(runoff)?;
    let runoff = runoff.transpose_to(&baseflow.names())?;
    let total = baseflow.with_data(baseflow.data() + runoff.data())?;

    let base = nanmean(basin_total(baseflow, mask, area, weighting)?.values());
    let all = nanmean(basin_total(&total, mask, area, weighting)?.values());
    if all == 0.0 || all.is_nan() {
        return Err(EvaluateError::DegenerateStatistic {
            metric: "baseflow fraction",
            reason: format!("mean basin total runoff is {all}"),
        });
    }
    debug!(base, all, "baseflow fraction");
    Ok(base / all)
}
