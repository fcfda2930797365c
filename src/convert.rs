//! Pure conversion functions: TOML config structs -> crate API config types.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};

use crate::config::*;

use tellus_driver::{CommandDriverConfig, MpiLauncher};
use tellus_evaluate::{EvaluateConfig, Weighting};
use tellus_perturb::{NoiseConfig, Sigma};
use tellus_rescale::{RescaleConfig, ZeroSpreadPolicy};

/// Parses a timestamp given as a date or a date and time.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
        Err(_) => bail!("invalid timestamp: {s:?}"),
    }
}

/// Parses the `[time]` section into `(start, end)`.
pub fn parse_period(time: &TimeToml) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let start = parse_datetime(&time.start).context("invalid [time].start")?;
    let end = parse_datetime(&time.end).context("invalid [time].end")?;
    if start >= end {
        bail!("[time].start {start} must be before [time].end {end}");
    }
    Ok((start, end))
}

/// Parses a zero-spread policy name into the corresponding enum variant.
pub fn parse_zero_spread(s: &str) -> Result<ZeroSpreadPolicy> {
    match s.to_lowercase().as_str() {
        "unit_ratio" => Ok(ZeroSpreadPolicy::UnitRatio),
        "reject" => Ok(ZeroSpreadPolicy::Reject),
        other => bail!("unknown zero-spread policy: {other:?}"),
    }
}

/// Parses a basin weighting name into the corresponding enum variant.
pub fn parse_weighting(s: &str) -> Result<Weighting> {
    match s.to_lowercase().as_str() {
        "membership" => Ok(Weighting::Membership),
        "fractional" => Ok(Weighting::Fractional),
        other => bail!("unknown basin weighting: {other:?}"),
    }
}

/// Resolves `path` against `root`; absolute paths are kept.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    root.join(path)
}

/// Resolves a required path option, naming the missing key on failure.
pub fn require(root: &Path, path: Option<&PathBuf>, key: &str) -> Result<PathBuf> {
    path.map(|p| resolve(root, p))
        .with_context(|| format!("missing required setting {key}"))
}

/// Builds a [`RescaleConfig`] from the TOML rescale configuration.
pub fn build_rescale_config(rescale: &RescaleToml) -> Result<RescaleConfig> {
    let policy = parse_zero_spread(&rescale.zero_spread)?;
    let cfg = RescaleConfig::new()
        .with_subunit_axes(rescale.subunit_axes.clone())
        .with_zero_spread(policy)
        .with_spread_tolerance(rescale.spread_tolerance);
    cfg.validate().context("invalid [rescale] settings")?;
    Ok(cfg)
}

/// Builds a [`NoiseConfig`] with a constant sigma from the TOML synthetic
/// configuration.
pub fn build_noise_config(synthetic: &SyntheticToml) -> Result<NoiseConfig> {
    let cfg = NoiseConfig::new(Sigma::Constant(synthetic.sigma))
        .with_adjust_negative(synthetic.adjust_negative);
    cfg.validate().context("invalid [synthetic] settings")?;
    Ok(cfg)
}

/// Builds a [`CommandDriverConfig`] from the TOML simulation configuration.
///
/// Reads the global parameter template from disk.
pub fn build_driver_config(sim: &SimulationToml, root: &Path) -> Result<CommandDriverConfig> {
    let exe = require(root, sim.executable.as_ref(), "[simulation].executable")?;
    let template_path = require(
        root,
        sim.global_template.as_ref(),
        "[simulation].global_template",
    )?;
    let template = std::fs::read_to_string(&template_path).with_context(|| {
        format!(
            "failed to read global template: {}",
            template_path.display()
        )
    })?;

    let mut cfg =
        CommandDriverConfig::new(exe, template).with_history_prefix(&sim.history_prefix);
    if let Some(ref args) = sim.args {
        cfg = cfg.with_args(args.clone());
    }
    if let Some(ref mpi) = sim.mpi_exe {
        cfg = cfg.with_mpi(MpiLauncher::new(mpi, sim.nprocs));
    }
    cfg.validate().context("invalid [simulation] settings")?;
    Ok(cfg)
}

/// Builds an [`EvaluateConfig`] from the TOML evaluate configuration.
pub fn build_evaluate_config(eval: &EvaluateToml) -> Result<EvaluateConfig> {
    let weighting = parse_weighting(&eval.weighting)?;
    let mut cfg = EvaluateConfig::default()
        .with_time_lag_hours(eval.time_lag_hours)
        .with_weighting(weighting);
    match (&eval.start, &eval.end) {
        (Some(s), Some(e)) => {
            cfg = cfg.with_window(
                parse_datetime(s).context("invalid [evaluate].start")?,
                parse_datetime(e).context("invalid [evaluate].end")?,
            );
        }
        (None, None) => {}
        _ => bail!("[evaluate] start and end must be set together"),
    }
    cfg.validate().context("invalid [evaluate] settings")?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_formats() {
        let a = parse_datetime("1980-01-02").unwrap();
        let b = parse_datetime("1980-01-02 00:00:00").unwrap();
        let c = parse_datetime("1980-01-02T03:00:00").unwrap();
        assert_eq!(a, b);
        assert_eq!((c - a).num_hours(), 3);
        assert!(parse_datetime("02/01/1980").is_err());
    }

    #[test]
    fn period_must_be_ordered() {
        let time = TimeToml {
            start: "1981-01-01".to_string(),
            end: "1980-01-01".to_string(),
        };
        assert!(parse_period(&time).is_err());
    }

    #[test]
    fn enum_names() {
        assert_eq!(parse_zero_spread("Reject").unwrap(), ZeroSpreadPolicy::Reject);
        assert_eq!(parse_weighting("fractional").unwrap(), Weighting::Fractional);
        assert!(parse_weighting("area").is_err());
    }

    #[test]
    fn evaluate_window_needs_both_ends() {
        let eval = EvaluateToml {
            start: Some("1980-01-01".to_string()),
            ..EvaluateToml::default()
        };
        assert!(build_evaluate_config(&eval).is_err());
    }

    #[test]
    fn driver_config_reads_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("global.tmpl"), "STARTYEAR {{start_year}}\n").unwrap();
        let sim = SimulationToml {
            executable: Some(PathBuf::from("vic_image.exe")),
            global_template: Some(PathBuf::from("global.tmpl")),
            mpi_exe: Some(PathBuf::from("mpiexec")),
            nprocs: 4,
            ..SimulationToml::default()
        };
        let cfg = build_driver_config(&sim, dir.path()).unwrap();
        assert!(cfg.template().contains("{{start_year}}"));
        assert_eq!(cfg.executable(), dir.path().join("vic_image.exe"));
        assert_eq!(cfg.mpi().map(|m| m.nprocs()), Some(4));
    }

    #[test]
    fn missing_executable_is_named() {
        let err = build_driver_config(&SimulationToml::default(), Path::new(".")).unwrap_err();
        assert!(format!("{err:#}").contains("[simulation].executable"));
    }
}
