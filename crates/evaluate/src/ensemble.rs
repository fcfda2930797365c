//! Probabilistic ensemble scores.
//!
//! Members are given as a `[time, member]` matrix whose rows are parallel
//! to the observations, normally from
//! [`align_ensemble`](crate::align_ensemble).

use ndarray::ArrayView2;
use tellus_stats::{mean, variance};

use crate::align::MIN_OVERLAP;
use crate::error::EvaluateError;

fn check_ensemble(
    metric: &'static str,
    observed: &[f64],
    members: &ArrayView2<'_, f64>,
    min_members: usize,
) -> Result<(), EvaluateError> {
    if members.nrows() != observed.len() {
        return Err(EvaluateError::LengthMismatch {
            expected: observed.len(),
            got: members.nrows(),
        });
    }
    if observed.len() < MIN_OVERLAP {
        return Err(EvaluateError::InsufficientOverlap {
            got: observed.len(),
            required: MIN_OVERLAP,
        });
    }
    if members.ncols() < min_members {
        return Err(EvaluateError::EnsembleTooSmall {
            metric,
            required: min_members,
            got: members.ncols(),
        });
    }
    Ok(())
}

/// CRPS of one ensemble forecast against one observation:
/// `mean_i |x_i - y| - 0.5 * mean_ij |x_i - x_j|`.
pub fn crps_step(observation: f64, forecast: &[f64]) -> f64 {
    let n = forecast.len() as f64;
    let skill = forecast.iter().map(|x| (x - observation).abs()).sum::<f64>() / n;
    let spread = forecast
        .iter()
        .map(|xi| forecast.iter().map(|xj| (xi - xj).abs()).sum::<f64>())
        .sum::<f64>()
        / (n * n);
    skill - 0.5 * spread
}

/// Continuous Ranked Probability Score averaged over time. Range: [0, inf),
/// 0 = every member equals the observation.
///
/// A single-member ensemble reduces to the mean absolute error.
pub fn crps(observed: &[f64], members: ArrayView2<'_, f64>) -> Result<f64, EvaluateError> {
    check_ensemble("CRPS", observed, &members, 1)?;
    let per_step: Vec<f64> = observed
        .iter()
        .zip(members.rows())
        .map(|(&y, row)| crps_step(y, &row.to_vec()))
        .collect();
    Ok(mean(&per_step))
}

/// Normalized ensemble skill: mean squared error of the ensemble mean
/// divided by the mean ensemble variance (N-1 denominator).
///
/// Near 1 for a well-spread ensemble; above 1 when the ensemble is
/// under-dispersed.
///
/// # Errors
///
/// - [`EvaluateError::EnsembleTooSmall`] with fewer than 2 members.
/// - [`EvaluateError::DegenerateStatistic`] if the ensemble has no spread.
pub fn nensk(observed: &[f64], members: ArrayView2<'_, f64>) -> Result<f64, EvaluateError> {
    check_ensemble("NENSK", observed, &members, 2)?;
    let mut sq_err = Vec::with_capacity(observed.len());
    let mut spread = Vec::with_capacity(observed.len());
    for (&y, row) in observed.iter().zip(members.rows()) {
        let row = row.to_vec();
        sq_err.push((mean(&row) - y).powi(2));
        spread.push(variance(&row));
    }
    let mean_spread = mean(&spread);
    if mean_spread == 0.0 {
        return Err(EvaluateError::DegenerateStatistic {
            metric: "NENSK",
            reason: "ensemble spread is zero".to_string(),
        });
    }
    Ok(mean(&sq_err) / mean_spread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    #[test]
    fn crps_zero_for_exact_ensemble() {
        let obs = [1.0, 2.0, 3.0];
        let members = Array2::from_shape_fn((3, 4), |(t, _)| obs[t]);
        assert_relative_eq!(crps(&obs, members.view()).unwrap(), 0.0);
    }

    #[test]
    fn crps_single_member_is_mae() {
        let obs = [1.0, 2.0];
        let members = array![[2.0], [0.0]];
        assert_relative_eq!(crps(&obs, members.view()).unwrap(), 1.5);
    }

    #[test]
    fn crps_two_member_known_value() {
        // |0-1| and |2-1| average 1; spread term 0.5 * (0+2+2+0)/4 = 0.5
        assert_relative_eq!(crps_step(1.0, &[0.0, 2.0]), 0.5);
    }

    #[test]
    fn crps_wider_miss_scores_worse() {
        let near = crps_step(1.0, &[0.9, 1.1, 1.0]);
        let far = crps_step(1.0, &[1.9, 2.1, 2.0]);
        assert!(far > near);
    }

    #[test]
    fn nensk_known_value() {
        // ensemble mean equals obs + 1 everywhere; member variance 2 (ddof 1)
        let obs = [0.0, 0.0];
        let members = array![[0.0, 2.0], [0.0, 2.0]];
        assert_relative_eq!(nensk(&obs, members.view()).unwrap(), 0.5);
    }

    #[test]
    fn nensk_rejects_single_member_and_no_spread() {
        let obs = [1.0, 2.0];
        assert!(matches!(
            nensk(&obs, array![[1.0], [2.0]].view()),
            Err(EvaluateError::EnsembleTooSmall { required: 2, .. })
        ));
        assert!(matches!(
            nensk(&obs, array![[1.0, 1.0], [2.0, 2.0]].view()),
            Err(EvaluateError::DegenerateStatistic { .. })
        ));
    }

    #[test]
    fn rows_must_match_observations() {
        let members = array![[1.0, 2.0]];
        assert!(matches!(
            crps(&[1.0, 2.0], members.view()),
            Err(EvaluateError::LengthMismatch { .. })
        ));
    }
}
