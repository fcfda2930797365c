use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level Tellus configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TellusConfig {
    /// Global RNG seed for noise injection.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Run period.
    pub time: TimeToml,

    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsToml,

    /// Truth rescaling settings.
    #[serde(default)]
    pub rescale: RescaleToml,

    /// Simulator settings.
    #[serde(default)]
    pub simulation: SimulationToml,

    /// Synthetic measurement settings.
    #[serde(default)]
    pub synthetic: SyntheticToml,

    /// Evaluation settings.
    #[serde(default)]
    pub evaluate: EvaluateToml,
}

impl TellusConfig {
    /// Reads and parses a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&toml_str).context("failed to parse TOML config")
    }
}

/// Run period. Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or
/// `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeToml {
    pub start: String,
    pub end: String,
}

/// Relative paths are resolved against `root`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsToml {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Base output directory; `truth/` and `synthetic_meas/` live below it.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Prior synthetic product supplying the measurement times. Defaults to
    /// `synthetic_meas/synthetic_meas.{start}_{end}.nc` under `output_dir`.
    #[serde(default)]
    pub measurement_product: Option<PathBuf>,
    /// Open-loop history holding the reference soil moisture.
    #[serde(default)]
    pub openloop_history: Option<PathBuf>,
    /// Soil parameter file with layer depth and densities.
    #[serde(default)]
    pub params: Option<PathBuf>,
}

impl Default for PathsToml {
    fn default() -> Self {
        Self {
            root: default_root(),
            output_dir: default_output_dir(),
            measurement_product: None,
            openloop_history: None,
            params: None,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RescaleToml {
    #[serde(default = "default_truth_prefix")]
    pub truth_prefix: String,
    #[serde(default = "default_rescaled_prefix")]
    pub rescaled_prefix: String,
    #[serde(default = "default_state_var")]
    pub state_var: String,
    #[serde(default = "default_history_var")]
    pub history_var: String,
    #[serde(default = "default_subunit_axes")]
    pub subunit_axes: Vec<String>,
    /// `unit_ratio` or `reject`.
    #[serde(default = "default_zero_spread")]
    pub zero_spread: String,
    #[serde(default = "default_spread_tolerance")]
    pub spread_tolerance: f64,
    #[serde(default = "default_depth_var")]
    pub depth_var: String,
    #[serde(default = "default_bulk_density_var")]
    pub bulk_density_var: String,
    #[serde(default = "default_soil_density_var")]
    pub soil_density_var: String,
}

impl Default for RescaleToml {
    fn default() -> Self {
        Self {
            truth_prefix: default_truth_prefix(),
            rescaled_prefix: default_rescaled_prefix(),
            state_var: default_state_var(),
            history_var: default_history_var(),
            subunit_axes: default_subunit_axes(),
            zero_spread: default_zero_spread(),
            spread_tolerance: default_spread_tolerance(),
            depth_var: default_depth_var(),
            bulk_density_var: default_bulk_density_var(),
            soil_density_var: default_soil_density_var(),
        }
    }
}

fn default_truth_prefix() -> String {
    "perturbed".to_string()
}
fn default_rescaled_prefix() -> String {
    "rescaled".to_string()
}
fn default_state_var() -> String {
    "STATE_SOIL_MOISTURE".to_string()
}
fn default_history_var() -> String {
    "OUT_SOIL_MOIST".to_string()
}
fn default_subunit_axes() -> Vec<String> {
    vec!["veg_class".to_string(), "snow_band".to_string()]
}
fn default_zero_spread() -> String {
    "unit_ratio".to_string()
}
fn default_spread_tolerance() -> f64 {
    1e-12
}
fn default_depth_var() -> String {
    "depth".to_string()
}
fn default_bulk_density_var() -> String {
    "bulk_density".to_string()
}
fn default_soil_density_var() -> String {
    "soil_density".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationToml {
    pub executable: Option<PathBuf>,
    /// Global parameter file template with `{{...}}` placeholders.
    pub global_template: Option<PathBuf>,
    pub initial_state: Option<PathBuf>,
    /// Forcing file prefix; the simulator appends the year.
    pub forcing_pattern: Option<String>,
    #[serde(default = "default_steps_per_day")]
    pub steps_per_day: u32,
    /// Executable arguments; `{{global}}` is the rendered global file.
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub mpi_exe: Option<PathBuf>,
    #[serde(default = "default_nprocs")]
    pub nprocs: u32,
    #[serde(default = "default_history_prefix")]
    pub history_prefix: String,
}

impl Default for SimulationToml {
    fn default() -> Self {
        Self {
            executable: None,
            global_template: None,
            initial_state: None,
            forcing_pattern: None,
            steps_per_day: default_steps_per_day(),
            args: None,
            mpi_exe: None,
            nprocs: default_nprocs(),
            history_prefix: default_history_prefix(),
        }
    }
}

fn default_steps_per_day() -> u32 {
    1
}
fn default_nprocs() -> u32 {
    1
}
fn default_history_prefix() -> String {
    "history".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntheticToml {
    /// Noise standard deviation, mm.
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    #[serde(default = "default_true")]
    pub adjust_negative: bool,
    #[serde(default = "default_measurement_var")]
    pub measurement_var: String,
    #[serde(default = "default_tag")]
    pub tag: String,
}

impl Default for SyntheticToml {
    fn default() -> Self {
        Self {
            sigma: default_sigma(),
            adjust_negative: true,
            measurement_var: default_measurement_var(),
            tag: default_tag(),
        }
    }
}

fn default_sigma() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_measurement_var() -> String {
    "simulated_surface_sm".to_string()
}
fn default_tag() -> String {
    "rescaled_v1".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluateToml {
    /// Observed daily flow table (site, time, value).
    pub observed: Option<PathBuf>,
    /// Routed open-loop flow table (site, time, value).
    pub open_loop: Option<PathBuf>,
    /// Routed ensemble flow table (site, time, value, member).
    pub ensemble: Option<PathBuf>,
    #[serde(default = "default_time_lag_hours")]
    pub time_lag_hours: i64,
    /// Scoring window; defaults to the whole overlap.
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    /// `membership` or `fractional`.
    #[serde(default = "default_weighting")]
    pub weighting: String,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub basin: Option<BasinToml>,
}

impl Default for EvaluateToml {
    fn default() -> Self {
        Self {
            observed: None,
            open_loop: None,
            ensemble: None,
            time_lag_hours: default_time_lag_hours(),
            start: None,
            end: None,
            weighting: default_weighting(),
            output: None,
            basin: None,
        }
    }
}

fn default_time_lag_hours() -> i64 {
    6
}
fn default_weighting() -> String {
    "membership".to_string()
}

/// Gridded inputs for basin area and baseflow diagnostics.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasinToml {
    /// One `[lat, lon]` fraction variable per site, named by site id.
    pub mask_file: PathBuf,
    /// Domain file holding cell area in m².
    pub domain_file: PathBuf,
    #[serde(default = "default_area_var")]
    pub area_var: String,
    /// Simulator history files, in chronological order.
    pub history: Vec<PathBuf>,
    #[serde(default = "default_runoff_var")]
    pub runoff_var: String,
    #[serde(default = "default_baseflow_var")]
    pub baseflow_var: String,
    /// Gauge metadata CSV with `short_name` and `drain_area_va` (mi²).
    #[serde(default)]
    pub site_info: Option<PathBuf>,
}

fn default_area_var() -> String {
    "area".to_string()
}
fn default_runoff_var() -> String {
    "OUT_RUNOFF".to_string()
}
fn default_baseflow_var() -> String {
    "OUT_BASEFLOW".to_string()
}
