//! Physical bounds on soil moisture.
//!
//! Rescaled values are clipped to `[0, max_moist]`. This is a clip, not a
//! reflection: out-of-range values land exactly on the nearest bound.

use ndarray::Zip;
use tellus_field::Field;
use tracing::{debug, info};

use crate::error::RescaleError;

/// How many values [`enforce_bounds`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundReport {
    /// Values raised to zero.
    pub clipped_low: usize,
    /// Values lowered to the per-location bound.
    pub clipped_high: usize,
}

impl BoundReport {
    /// Total number of clipped values.
    pub fn total(&self) -> usize {
        self.clipped_low + self.clipped_high
    }
}

/// Clips every value of `field` to `[0, bound]`.
///
/// `bound` is typically indexed by `{nlayer, lat, lon}` and is broadcast
/// over the remaining axes of `field` (time, sub-units). Its labels must
/// match `field` exactly. NaN values stay NaN; a NaN bound leaves the upper
/// side unconstrained.
///
/// # Errors
///
/// Returns [`RescaleError::Field`] if `bound` has an axis that `field` lacks
/// or its labels differ.
pub fn enforce_bounds(field: &Field, bound: &Field) -> Result<(Field, BoundReport), RescaleError> {
    let cap = bound.broadcast_values(field.axes())?;
    let mut report = BoundReport::default();
    let mut data = field.data().clone();
    Zip::from(&mut data).and(&cap).for_each(|v, &b| {
        if *v < 0.0 {
            *v = 0.0;
            report.clipped_low += 1;
        } else if *v > b {
            *v = b;
            report.clipped_high += 1;
        }
    });

    if report.total() > 0 {
        info!(
            low = report.clipped_low,
            high = report.clipped_high,
            "values clipped to physical bounds"
        );
    } else {
        debug!("all values within bounds");
    }
    Ok((field.with_data(data)?, report))
}

/// Maximum soil moisture per location, in mm.
///
/// `max_moist = depth * (1 - bulk_density / soil_density) * 1000`, with
/// depth in metres. All three inputs must share axes and labels.
///
/// # Errors
///
/// - [`RescaleError::Field`] if the inputs are misaligned.
/// - [`RescaleError::InvalidParameter`] if any soil density is not positive.
pub fn max_soil_moisture(
    depth: &Field,
    bulk_density: &Field,
    soil_density: &Field,
) -> Result<Field, RescaleError> {
    depth.check_aligned(bulk_density)?;
    depth.check_aligned(soil_density)?;
    let bulk = bulk_density.broadcast_values(depth.axes())?;
    let soil = soil_density.broadcast_values(depth.axes())?;

    if let Some(&bad) = soil.iter().find(|&&s| s <= 0.0) {
        return Err(RescaleError::InvalidParameter {
            name: "soil_density".to_string(),
            reason: format!("must be > 0, got {bad}"),
        });
    }

    let mut data = depth.data().clone();
    Zip::from(&mut data)
        .and(&bulk)
        .and(&soil)
        .for_each(|d, &b, &s| *d = *d * (1.0 - b / s) * 1000.0);
    Ok(depth.with_data(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tellus_field::Axis;

    fn layers(values: Vec<f64>) -> Field {
        Field::from_vec(vec![Axis::range("nlayer", values.len())], values).unwrap()
    }

    fn series(values: Vec<f64>) -> Field {
        // time(2) x nlayer(2)
        Field::from_vec(vec![Axis::range("time", 2), Axis::range("nlayer", 2)], values).unwrap()
    }

    #[test]
    fn negatives_go_to_zero() {
        let (f, r) = enforce_bounds(&series(vec![-1.0, 5.0, -0.1, 3.0]), &layers(vec![10.0, 10.0]))
            .unwrap();
        assert_eq!(f.values(), vec![0.0, 5.0, 0.0, 3.0]);
        assert_eq!(r.clipped_low, 2);
        assert_eq!(r.clipped_high, 0);
    }

    #[test]
    fn excess_lands_exactly_on_bound() {
        let (f, r) = enforce_bounds(&series(vec![12.0, 5.0, 8.0, 40.0]), &layers(vec![10.0, 30.0]))
            .unwrap();
        assert_eq!(f.values(), vec![10.0, 5.0, 8.0, 30.0]);
        assert_eq!(r.clipped_high, 2);
    }

    #[test]
    fn in_range_values_unchanged() {
        let s = series(vec![0.0, 5.0, 10.0, 29.9]);
        let (f, r) = enforce_bounds(&s, &layers(vec![10.0, 30.0])).unwrap();
        assert_eq!(f, s);
        assert_eq!(r.total(), 0);
    }

    #[test]
    fn nan_passes_through() {
        let (f, _) = enforce_bounds(
            &series(vec![f64::NAN, 5.0, 1.0, 3.0]),
            &layers(vec![10.0, 10.0]),
        )
        .unwrap();
        assert!(f.values()[0].is_nan());
    }

    #[test]
    fn bound_on_unknown_axis_is_error() {
        let bound = Field::filled(vec![Axis::range("lat", 2)], 10.0).unwrap();
        assert!(enforce_bounds(&series(vec![1.0; 4]), &bound).is_err());
    }

    #[test]
    fn max_moist_formula() {
        let m = max_soil_moisture(
            &layers(vec![0.1, 0.5]),
            &layers(vec![1325.0, 1500.0]),
            &layers(vec![2650.0, 2500.0]),
        )
        .unwrap();
        let v = m.values();
        assert_relative_eq!(v[0], 50.0, epsilon = 1e-9);
        assert_relative_eq!(v[1], 200.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_soil_density_rejected() {
        let err = max_soil_moisture(
            &layers(vec![0.1]),
            &layers(vec![1300.0]),
            &layers(vec![0.0]),
        );
        assert!(matches!(err, Err(RescaleError::InvalidParameter { .. })));
    }
}
