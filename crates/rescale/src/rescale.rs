//! Cell-level mean/variance matching with tile anomalies restored.

use ndarray::Zip;
use tellus_field::Field;
use tracing::{debug, info, warn};

use crate::climatology::Climatology;
use crate::config::{RescaleConfig, ZeroSpreadPolicy};
use crate::error::RescaleError;
use crate::result::RescaleResult;

/// Rescales a truth state series to the reference climatology.
///
/// `truth` carries the time axis, the configured sub-unit axes and any
/// spatial/layer axes. `reference` must carry exactly the truth's axes minus
/// the sub-unit axes, with identical labels (order may differ).
///
/// Per cell (every combination of the non-time, non-sub-unit axes):
///
/// ```text
/// cell          = nanmean over sub-units of truth
/// rescaled_cell = (cell - mean_t(cell)) * (std_t(ref) / std_t(cell)) + mean_t(ref)
/// rescaled_tile = truth_tile - cell + rescaled_cell
/// ```
///
/// Cells with missing reference statistics come out as NaN on every tile.
/// Cells whose truth spread is within the configured tolerance of zero
/// follow [`ZeroSpreadPolicy`].
///
/// # Errors
///
/// - [`RescaleError::Field`] if an axis is missing or the reference is
///   misaligned with the collapsed truth.
/// - [`RescaleError::ZeroSpread`] under [`ZeroSpreadPolicy::Reject`].
#[tracing::instrument(skip(truth, reference, config), fields(shape = ?truth.shape()))]
pub fn rescale_two_level(
    truth: &Field,
    reference: &Field,
    config: &RescaleConfig,
) -> Result<RescaleResult, RescaleError> {
    config.validate()?;
    let time = config.time_axis();
    truth.axis_index(time)?;
    let subunits: Vec<&str> = config.subunit_axes().iter().map(String::as_str).collect();
    for s in &subunits {
        truth.axis_index(s)?;
    }

    let cell = truth.nanmean_over(&subunits)?;
    cell.check_aligned(reference)?;

    let truth_clim = Climatology::from_series(&cell, time)?;
    let ref_clim = Climatology::from_series(reference, time)?;

    let stat_axes = truth_clim.std().axes().to_vec();
    let ref_std = ref_clim.std().broadcast_values(&stat_axes)?;
    let ref_mean = ref_clim.mean().broadcast_values(&stat_axes)?;

    let tol = config.spread_tolerance();
    let mut zero_spread = 0usize;
    let mut missing_reference = 0usize;
    let mut ratio = truth_clim.std().data().clone();
    Zip::from(&mut ratio)
        .and(&ref_std)
        .and(&ref_mean)
        .for_each(|r, &rs, &rm| {
            if rs.is_nan() || rm.is_nan() {
                missing_reference += 1;
                *r = f64::NAN;
            } else if r.abs() <= tol {
                zero_spread += 1;
                *r = 1.0;
            } else {
                *r = rs / *r;
            }
        });

    if zero_spread > 0 {
        match config.zero_spread() {
            ZeroSpreadPolicy::Reject => {
                return Err(RescaleError::ZeroSpread { cells: zero_spread });
            }
            ZeroSpreadPolicy::UnitRatio => {
                warn!(cells = zero_spread, "zero truth spread, using unit ratio");
            }
        }
    }
    if missing_reference > 0 {
        warn!(
            cells = missing_reference,
            "reference statistics missing, cells left as NaN"
        );
    }

    let ratio = truth_clim.std().with_data(ratio)?;
    let cell_axes = cell.axes().to_vec();
    let ratio_c = ratio.broadcast_values(&cell_axes)?;
    let truth_mean_c = truth_clim.mean().broadcast_values(&cell_axes)?;
    let ref_mean_c = ref_clim.mean().broadcast_values(&cell_axes)?;

    let mut rescaled_cell = cell.data().clone();
    Zip::from(&mut rescaled_cell)
        .and(&truth_mean_c)
        .and(&ratio_c)
        .and(&ref_mean_c)
        .for_each(|c, &m, &k, &rm| *c = (*c - m) * k + rm);
    let rescaled_cell = cell.with_data(rescaled_cell)?;
    debug!(cells = ratio.len(), "cell series rescaled");

    let tile_axes = truth.axes().to_vec();
    let cell_t = cell.broadcast_values(&tile_axes)?;
    let rescaled_t = rescaled_cell.broadcast_values(&tile_axes)?;
    let mut tiles = truth.data().clone();
    Zip::from(&mut tiles)
        .and(&cell_t)
        .and(&rescaled_t)
        .for_each(|v, &c, &rc| *v = (*v - c) + rc);
    let field = truth.with_data(tiles)?;

    info!(
        cells = ratio.len(),
        zero_spread, missing_reference, "two-level rescale complete"
    );

    Ok(RescaleResult::new(
        field,
        rescaled_cell,
        truth_clim,
        ref_clim,
        zero_spread,
        missing_reference,
    ))
}
