//! JSON output structures for evaluation results.

use crate::error::EvaluateError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Top-level evaluation output.
#[derive(Debug, Serialize)]
pub struct EvaluationOutput {
    /// Configuration summary.
    pub config: ConfigSummary,
    /// Per-site scores, keyed by site id.
    pub sites: BTreeMap<String, SiteReport>,
}

/// Summary of the configuration used.
#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub time_lag_hours: i64,
    pub start: Option<String>,
    pub end: Option<String>,
    pub weighting: String,
    pub n_sites: usize,
    pub n_members: usize,
}

/// Outcome of one score: a value, or why it was not computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricEntry {
    Ok { value: f64 },
    Skipped { reason: String },
}

impl MetricEntry {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Ok { value } => Some(*value),
            Self::Skipped { .. } => None,
        }
    }
}

impl<E: std::fmt::Display> From<Result<f64, E>> for MetricEntry {
    fn from(result: Result<f64, E>) -> Self {
        match result {
            Ok(value) => Self::Ok { value },
            Err(e) => Self::Skipped {
                reason: e.to_string(),
            },
        }
    }
}

/// Basin properties derived from the simulator grid.
#[derive(Debug, Clone, Serialize)]
pub struct BasinSummary {
    pub area_km2: MetricEntry,
    /// Drainage area reported for the gauge, when known.
    pub observed_area_km2: Option<f64>,
    pub baseflow_fraction: MetricEntry,
}

/// Scores for one site.
#[derive(Debug, Clone, Serialize)]
pub struct SiteReport {
    /// Observed mean over the evaluation window.
    pub observed_mean: Option<f64>,
    pub basin: Option<BasinSummary>,
    /// metric -> score of the open-loop series.
    pub open_loop: BTreeMap<String, MetricEntry>,
    /// metric -> score of the ensemble mean.
    pub ensemble_mean: BTreeMap<String, MetricEntry>,
    /// metric -> probabilistic score of the whole ensemble.
    pub ensemble: BTreeMap<String, MetricEntry>,
}

/// Serialize evaluation output to a JSON string.
pub fn to_json(output: &EvaluationOutput) -> Result<String, EvaluateError> {
    serde_json::to_string_pretty(output).map_err(|e| EvaluateError::Serialization {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_roundtrip() {
        let mut open_loop = BTreeMap::new();
        open_loop.insert("kge".to_string(), MetricEntry::Ok { value: 0.5 });
        open_loop.insert(
            "nse".to_string(),
            MetricEntry::Skipped {
                reason: "NSE undefined: observed variance is zero".to_string(),
            },
        );
        let mut sites = BTreeMap::new();
        sites.insert(
            "07144100".to_string(),
            SiteReport {
                observed_mean: Some(12.5),
                basin: None,
                open_loop,
                ensemble_mean: BTreeMap::new(),
                ensemble: BTreeMap::new(),
            },
        );
        let output = EvaluationOutput {
            config: ConfigSummary {
                time_lag_hours: 6,
                start: None,
                end: None,
                weighting: "membership".to_string(),
                n_sites: 1,
                n_members: 32,
            },
            sites,
        };

        let json = to_json(&output).unwrap();
        assert!(json.contains("\"time_lag_hours\": 6"));
        assert!(json.contains("\"07144100\""));
        assert!(json.contains("\"status\": \"ok\""));
        assert!(json.contains("\"status\": \"skipped\""));
    }

    #[test]
    fn test_metric_entry_from_result() {
        let ok: MetricEntry = Ok::<f64, EvaluateError>(1.0).into();
        assert_eq!(ok.value(), Some(1.0));
        let skipped: MetricEntry = Err::<f64, _>(EvaluateError::InsufficientOverlap {
            got: 0,
            required: 2,
        })
        .into();
        assert_eq!(skipped.value(), None);
    }
}
