//! Tellus evaluation: score routed streamflow against observed streamflow.
//!
//! For every observed site the open-loop series and the ensemble mean get the
//! deterministic scores (KGE, NSE, RMSE, log-RMSE, MAE, PBIAS) and the
//! ensemble gets the probabilistic ones (CRPS, NENSK). Routed flow is first
//! shifted to local time, averaged to days and cut to the evaluation window.
//!
//! A score that cannot be computed for a site is reported as skipped with
//! its reason; it never stops the other scores or sites.

mod align;
mod basin;
mod config;
mod ensemble;
mod error;
mod metrics;
mod output;
mod transform;

use std::collections::BTreeMap;

use tellus_field::Field;
use tellus_io::{EnsembleSeries, SiteSeries};
use tellus_stats::nanmean;
use tracing::{info, warn};

pub use align::{AlignedEnsemble, AlignedPair, MIN_OVERLAP, align_ensemble, align_pair};
pub use basin::{
    BasinMask, KM2_PER_MI2, Weighting, baseflow_fraction, basin_area_km2, basin_total, mi2_to_km2,
};
pub use config::EvaluateConfig;
pub use ensemble::{crps, crps_step, nensk};
pub use error::EvaluateError;
pub use metrics::{KgeComponents, kge, kge_components, mae, nse, pbias, rmse, rmse_log};
pub use output::{
    BasinSummary, ConfigSummary, EvaluationOutput, MetricEntry, SiteReport, to_json,
};
pub use transform::{
    daily_mean, daily_mean_ensemble, ensemble_mean, shift_ensemble_to_local, shift_to_local,
    truncate, truncate_ensemble,
};

/// Gridded simulator output and per-site masks for basin diagnostics.
#[derive(Debug, Clone)]
pub struct BasinInputs {
    /// Site id -> contributing fraction.
    pub masks: BTreeMap<String, BasinMask>,
    /// Cell area in m² on `[lat, lon]`.
    pub area: Field,
    /// Surface runoff on `[time, lat, lon]`.
    pub runoff: Field,
    /// Baseflow on `[time, lat, lon]`.
    pub baseflow: Field,
    /// Gauge-reported drainage area per site, km².
    pub observed_area_km2: BTreeMap<String, f64>,
}

/// Everything [`evaluate`] scores.
#[derive(Debug, Clone, Default)]
pub struct EvaluationInputs {
    /// Daily observed flow per site, local time.
    pub observed: BTreeMap<String, SiteSeries>,
    /// Routed open-loop flow per site, routing clock.
    pub open_loop: BTreeMap<String, SiteSeries>,
    /// Routed ensemble flow per site, routing clock.
    pub ensemble: BTreeMap<String, EnsembleSeries>,
    pub basins: Option<BasinInputs>,
}

const DETERMINISTIC: [(&str, fn(&[f64], &[f64]) -> Result<f64, EvaluateError>); 6] = [
    ("kge", kge),
    ("nse", nse),
    ("rmse", rmse),
    ("rmse_log", rmse_log),
    ("mae", mae),
    ("pbias", pbias),
];

fn deterministic_scores(
    observed: &SiteSeries,
    simulated: &SiteSeries,
) -> BTreeMap<String, MetricEntry> {
    let aligned = align_pair(observed, simulated);
    DETERMINISTIC
        .iter()
        .map(|(name, f)| {
            let entry: MetricEntry = match &aligned {
                Ok(a) => f(&a.observed, &a.simulated).into(),
                Err(e) => MetricEntry::Skipped {
                    reason: e.to_string(),
                },
            };
            (name.to_string(), entry)
        })
        .collect()
}

fn ensemble_scores(
    observed: &SiteSeries,
    ensemble: &EnsembleSeries,
) -> BTreeMap<String, MetricEntry> {
    let mut scores: BTreeMap<String, MetricEntry> = BTreeMap::new();
    match align_ensemble(observed, ensemble) {
        Ok(a) => {
            scores.insert("crps".to_string(), crps(&a.observed, a.members.view()).into());
            scores.insert("nensk".to_string(), nensk(&a.observed, a.members.view()).into());
        }
        Err(e) => {
            for name in ["crps", "nensk"] {
                scores.insert(
                    name.to_string(),
                    MetricEntry::Skipped {
                        reason: e.to_string(),
                    },
                );
            }
        }
    }
    scores
}

fn basin_summary(site: &str, basins: &BasinInputs, config: &EvaluateConfig) -> Option<BasinSummary> {
    let mask = basins.masks.get(site)?;
    Some(BasinSummary {
        area_km2: basin_area_km2(mask, &basins.area, config.weighting()).into(),
        observed_area_km2: basins.observed_area_km2.get(site).copied(),
        baseflow_fraction: baseflow_fraction(
            &basins.baseflow,
            &basins.runoff,
            mask,
            &basins.area,
            config.weighting(),
        )
        .into(),
    })
}

fn count_skipped(report: &SiteReport) -> usize {
    let basin = report
        .basin
        .iter()
        .flat_map(|b| [&b.area_km2, &b.baseflow_fraction]);
    report
        .open_loop
        .values()
        .chain(report.ensemble_mean.values())
        .chain(report.ensemble.values())
        .chain(basin)
        .filter(|e| e.value().is_none())
        .count()
}

/// Scores every observed site.
///
/// # Errors
///
/// - [`EvaluateError::Validation`] for an invalid config, no observed
///   sites, or ensembles of differing size.
/// - [`EvaluateError::MissingSite`] if an observed site has no open-loop or
///   ensemble series.
#[tracing::instrument(skip_all, fields(sites = inputs.observed.len()))]
pub fn evaluate(
    inputs: &EvaluationInputs,
    config: &EvaluateConfig,
) -> Result<EvaluationOutput, EvaluateError> {
    config.validate()?;
    if inputs.observed.is_empty() {
        return Err(EvaluateError::Validation {
            count: 1,
            details: "observed data contains no sites".to_string(),
        });
    }
    for site in inputs.observed.keys() {
        if !inputs.open_loop.contains_key(site) {
            return Err(EvaluateError::MissingSite {
                site: site.clone(),
                location: "open-loop routing".to_string(),
            });
        }
        if !inputs.ensemble.contains_key(site) {
            return Err(EvaluateError::MissingSite {
                site: site.clone(),
                location: "ensemble routing".to_string(),
            });
        }
    }
    let sizes: Vec<usize> = inputs.observed.keys().map(|s| inputs.ensemble[s].n_members()).collect();
    let n_members = sizes.first().copied().unwrap_or_default();
    if sizes.iter().any(|&n| n != n_members) {
        return Err(EvaluateError::Validation {
            count: 1,
            details: format!("ensemble sizes differ across sites: {sizes:?}"),
        });
    }

    let lag = config.time_lag_hours();
    let mut sites = BTreeMap::new();
    for (site, observed) in &inputs.observed {
        let mut open_loop = daily_mean(&shift_to_local(&inputs.open_loop[site], lag)?)?;
        let mut ensemble =
            daily_mean_ensemble(&shift_ensemble_to_local(&inputs.ensemble[site], lag)?)?;
        let mut observed = observed.clone();
        if let (Some(start), Some(end)) = (config.start(), config.end()) {
            open_loop = truncate(&open_loop, start, end)?;
            ensemble = truncate_ensemble(&ensemble, start, end)?;
            observed = truncate(&observed, start, end)?;
        }
        let mean_series = ensemble_mean(&ensemble)?;

        let obs_mean = nanmean(observed.values());
        let report = SiteReport {
            observed_mean: obs_mean.is_finite().then_some(obs_mean),
            basin: inputs
                .basins
                .as_ref()
                .and_then(|b| basin_summary(site, b, config)),
            open_loop: deterministic_scores(&observed, &open_loop),
            ensemble_mean: deterministic_scores(&observed, &mean_series),
            ensemble: ensemble_scores(&observed, &ensemble),
        };

        let skipped = count_skipped(&report);
        if skipped > 0 {
            warn!(site = site.as_str(), skipped, "some scores were skipped");
        }
        info!(
            site = site.as_str(),
            kge_open_loop = ?report.open_loop.get("kge").and_then(MetricEntry::value),
            kge_ensemble_mean = ?report.ensemble_mean.get("kge").and_then(MetricEntry::value),
            crps = ?report.ensemble.get("crps").and_then(MetricEntry::value),
            "scored site"
        );
        sites.insert(site.clone(), report);
    }

    Ok(EvaluationOutput {
        config: ConfigSummary {
            time_lag_hours: lag,
            start: config.start().map(|t| t.to_string()),
            end: config.end().map(|t| t.to_string()),
            weighting: format!("{:?}", config.weighting()).to_lowercase(),
            n_sites: sites.len(),
            n_members,
        },
        sites,
    })
}
