//! Deterministic skill scores.
//!
//! Every score takes observed and simulated slices of equal length, at least
//! [`MIN_OVERLAP`](crate::MIN_OVERLAP) long, normally produced by
//! [`align_pair`](crate::align_pair).

use tellus_stats::{mean, pearson_correlation, population_sd};
use tracing::debug;

use crate::align::MIN_OVERLAP;
use crate::error::EvaluateError;

pub(crate) fn check_pair(observed: &[f64], simulated: &[f64]) -> Result<(), EvaluateError> {
    if observed.len() != simulated.len() {
        return Err(EvaluateError::LengthMismatch {
            expected: observed.len(),
            got: simulated.len(),
        });
    }
    if observed.len() < MIN_OVERLAP {
        return Err(EvaluateError::InsufficientOverlap {
            got: observed.len(),
            required: MIN_OVERLAP,
        });
    }
    Ok(())
}

/// The three parts of the Kling-Gupta efficiency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KgeComponents {
    /// Pearson correlation.
    pub r: f64,
    /// Variability ratio `std(sim) / std(obs)`.
    pub alpha: f64,
    /// Bias ratio `mean(sim) / mean(obs)`.
    pub beta: f64,
}

impl KgeComponents {
    /// `1 - sqrt((r-1)^2 + (alpha-1)^2 + (beta-1)^2)`.
    pub fn kge(&self) -> f64 {
        1.0 - ((self.r - 1.0).powi(2) + (self.alpha - 1.0).powi(2) + (self.beta - 1.0).powi(2))
            .sqrt()
    }
}

/// Correlation, variability ratio and bias ratio.
///
/// Standard deviations are population (N denominator). A constant series
/// gives `r = 0`; zero observed spread gives `alpha = 0`; zero observed mean
/// gives `beta = 0`.
pub fn kge_components(observed: &[f64], simulated: &[f64]) -> Result<KgeComponents, EvaluateError> {
    check_pair(observed, simulated)?;
    let (mean_o, mean_s) = (mean(observed), mean(simulated));
    let (std_o, std_s) = (population_sd(observed), population_sd(simulated));

    let r = pearson_correlation(observed, simulated).unwrap_or_else(|| {
        debug!("constant series in KGE, correlation taken as 0");
        0.0
    });
    let alpha = if std_o == 0.0 { 0.0 } else { std_s / std_o };
    let beta = if mean_o == 0.0 { 0.0 } else { mean_s / mean_o };
    Ok(KgeComponents { r, alpha, beta })
}

/// Kling-Gupta Efficiency. Range: (-inf, 1], 1 = perfect.
pub fn kge(observed: &[f64], simulated: &[f64]) -> Result<f64, EvaluateError> {
    Ok(kge_components(observed, simulated)?.kge())
}

/// Nash-Sutcliffe Efficiency. Range: (-inf, 1], 1 = perfect.
///
/// # Errors
///
/// Returns [`EvaluateError::DegenerateStatistic`] if the observations are
/// constant.
pub fn nse(observed: &[f64], simulated: &[f64]) -> Result<f64, EvaluateError> {
    check_pair(observed, simulated)?;
    let mean_obs = mean(observed);
    let numerator: f64 = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum();
    let denominator: f64 = observed.iter().map(|o| (o - mean_obs).powi(2)).sum();
    if denominator == 0.0 {
        return Err(EvaluateError::DegenerateStatistic {
            metric: "NSE",
            reason: "observed variance is zero".to_string(),
        });
    }
    Ok(1.0 - numerator / denominator)
}

/// Root Mean Square Error. Range: [0, inf), 0 = perfect.
pub fn rmse(observed: &[f64], simulated: &[f64]) -> Result<f64, EvaluateError> {
    check_pair(observed, simulated)?;
    let mse = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum::<f64>()
        / observed.len() as f64;
    Ok(mse.sqrt())
}

/// RMSE of `ln(x + 1)`.
///
/// # Errors
///
/// Returns [`EvaluateError::InvalidValue`] for any input `<= -1`.
pub fn rmse_log(observed: &[f64], simulated: &[f64]) -> Result<f64, EvaluateError> {
    check_pair(observed, simulated)?;
    let log1p = |x: f64| {
        if x <= -1.0 {
            return Err(EvaluateError::InvalidValue {
                metric: "log-RMSE",
                value: x,
                reason: "ln(x + 1) needs x > -1".to_string(),
            });
        }
        Ok(x.ln_1p())
    };
    let lo = observed.iter().map(|&x| log1p(x)).collect::<Result<Vec<_>, _>>()?;
    let ls = simulated.iter().map(|&x| log1p(x)).collect::<Result<Vec<_>, _>>()?;
    rmse(&lo, &ls)
}

/// Mean Absolute Error. Range: [0, inf), 0 = perfect.
pub fn mae(observed: &[f64], simulated: &[f64]) -> Result<f64, EvaluateError> {
    check_pair(observed, simulated)?;
    Ok(observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).abs())
        .sum::<f64>()
        / observed.len() as f64)
}

/// Percent Bias. Optimal = 0. Positive = overestimation.
///
/// # Errors
///
/// Returns [`EvaluateError::DegenerateStatistic`] if the observations sum to
/// zero.
pub fn pbias(observed: &[f64], simulated: &[f64]) -> Result<f64, EvaluateError> {
    check_pair(observed, simulated)?;
    let sum_obs: f64 = observed.iter().sum();
    if sum_obs == 0.0 {
        return Err(EvaluateError::DegenerateStatistic {
            metric: "PBIAS",
            reason: "observations sum to zero".to_string(),
        });
    }
    let diff_sum: f64 = simulated.iter().zip(observed).map(|(s, o)| s - o).sum();
    Ok(100.0 * diff_sum / sum_obs)
}
