//! Rescale command: rescale truth states to the open-loop climatology,
//! re-run the simulator from them and write synthetic measurements.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDateTime};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, info_span, warn};

use tellus_calendar::{align_history_times, year_span};
use tellus_driver::{CommandDriver, OutputDirs, SimulationDriver, SimulationRequest};
use tellus_field::{Coords, Field};
use tellus_io::{
    read_field, read_history, read_state_series, read_times, save_updated_state, snapshot_path,
    synthetic_product_path, write_synthetic_product,
};
use tellus_perturb::add_gaussian_noise;
use tellus_rescale::{enforce_bounds, max_soil_moisture, rescale_two_level};

use crate::cli::RescaleArgs;
use crate::config::TellusConfig;
use crate::convert::{self, require, resolve};

/// Name of the vertical layer axis in state and history files.
const LAYER_AXIS: &str = "nlayer";

/// Run the truth rescaling pipeline.
pub fn run(args: RescaleArgs) -> Result<()> {
    let _cmd = info_span!("rescale").entered();
    let config = TellusConfig::load(&args.config)?;
    let driver_cfg = convert::build_driver_config(&config.simulation, &config.paths.root)?;
    let seed = noise_seed(args.seed.or(config.seed));
    execute(&config, seed, &CommandDriver::new(driver_cfg))?;
    Ok(())
}

/// The configured seed, or a fresh one. Either way it is logged so the run
/// can be repeated.
fn noise_seed(configured: Option<u64>) -> u64 {
    match configured {
        Some(seed) => {
            info!(seed, "noise seed");
            seed
        }
        None => {
            let seed = rand::random::<u64>();
            info!(seed, "noise seed drawn; pass --seed {seed} to repeat this run");
            seed
        }
    }
}

/// Runs every stage with `driver` standing in for the simulator and returns
/// the path of the synthetic product.
fn execute<D: SimulationDriver>(config: &TellusConfig, seed: u64, driver: &D) -> Result<PathBuf> {
    let (start, end) = convert::parse_period(&config.time)?;

    let rescale_cfg = convert::build_rescale_config(&config.rescale)?;
    let noise_cfg = convert::build_noise_config(&config.synthetic)?;
    let root = config.paths.root.as_path();
    let rc = &config.rescale;
    let sim = &config.simulation;

    let out_dir = resolve(root, &config.paths.output_dir);
    let truth_dir = out_dir.join("truth");
    let states_dir = truth_dir.join("states");
    let meas_dir = out_dir.join("synthetic_meas");

    // Seeded once; every noise draw of the run comes from this generator.
    let mut rng = StdRng::seed_from_u64(seed);

    // 1. Measurement times from the prior synthetic product
    let meas_path = match &config.paths.measurement_product {
        Some(p) => resolve(root, p),
        None => meas_dir.join(format!(
            "synthetic_meas.{}_{}.nc",
            start.format("%Y%m%d"),
            end.format("%Y%m%d")
        )),
    };
    let meas_times = measurement_times(&meas_path, start, end)?;
    info!(n = meas_times.len(), path = %meas_path.display(), "measurement times loaded");

    // 2. Truth states at the measurement times
    let truth_snapshots: Vec<(NaiveDateTime, PathBuf)> = meas_times
        .iter()
        .map(|&t| (t, snapshot_path(&states_dir, &rc.truth_prefix, t)))
        .collect();
    let truth = read_state_series(&truth_snapshots, &rc.state_var)
        .context("failed to read truth states")?;

    // 3. Open-loop reference on the same instants
    let openloop_path = require(
        root,
        config.paths.openloop_history.as_ref(),
        "[paths].openloop_history",
    )?;
    let reference = openloop_reference(
        &openloop_path,
        &rc.history_var,
        sim.steps_per_day,
        &meas_times,
    )?;

    // 4. Two-level rescaling
    let rescaled = rescale_two_level(&truth, &reference, &rescale_cfg)
        .context("two-level rescaling failed")?;
    if rescaled.zero_spread_cells() > 0 || rescaled.missing_reference_cells() > 0 {
        warn!(
            zero_spread = rescaled.zero_spread_cells(),
            missing_reference = rescaled.missing_reference_cells(),
            "rescaling fell back on some cells"
        );
    }

    // 5. Physical bounds
    let params = require(root, config.paths.params.as_ref(), "[paths].params")?;
    let read_param = |var: &str| {
        read_field(&params, var)
            .with_context(|| format!("failed to read '{var}' from {}", params.display()))
    };
    let max_moist = max_soil_moisture(
        &read_param(&rc.depth_var)?,
        &read_param(&rc.bulk_density_var)?,
        &read_param(&rc.soil_density_var)?,
    )
    .context("failed to derive maximum soil moisture")?;
    let (bounded, report) =
        enforce_bounds(rescaled.field(), &max_moist).context("bound enforcement failed")?;
    info!(
        clipped_low = report.clipped_low,
        clipped_high = report.clipped_high,
        "bounds enforced"
    );

    // 6. Simulation request, checked before any snapshot is written
    let assigned: BTreeMap<NaiveDateTime, PathBuf> = meas_times
        .iter()
        .map(|&t| (t, snapshot_path(&states_dir, &rc.rescaled_prefix, t)))
        .collect();
    let initial_state = require(
        root,
        sim.initial_state.as_ref(),
        "[simulation].initial_state",
    )?;
    let forcing = sim
        .forcing_pattern
        .as_deref()
        .context("missing required setting [simulation].forcing_pattern")?;
    let request = SimulationRequest::new(
        start,
        end,
        initial_state,
        resolve(root, Path::new(forcing)).to_string_lossy(),
        sim.steps_per_day,
        OutputDirs::under(&truth_dir),
    )
    .with_assigned_states(assigned);
    let segments = request
        .segments()
        .context("invalid simulation request for the rescaled states")?;
    info!(segments = segments.len(), "simulation request checked");

    // 7. Persist rescaled snapshots
    persist_rescaled(&bounded, &truth_snapshots, request.assigned_states(), &rc.state_var)?;

    // 8. Re-run the simulator from the rescaled states
    let products = driver
        .run(&request)
        .context("simulation from rescaled states failed")?;

    // 9. Join history products
    let history =
        read_history(products.files(), &rc.history_var).context("failed to read new history")?;

    // 10. Top-layer soil moisture at the measurement times
    let top = history
        .select_times("time", &meas_times)
        .and_then(|h| h.index_axis(LAYER_AXIS, 0))
        .context("failed to extract top-layer soil moisture")?;

    // 11. Noise
    let noisy =
        add_gaussian_noise(&top, &noise_cfg, &mut rng).context("noise injection failed")?;
    info!(reflected = noisy.n_reflected(), "synthetic measurements simulated");
    log_yearly_coverage(&meas_times, start, end)?;

    // 12. Synthetic observation product
    std::fs::create_dir_all(&meas_dir)
        .with_context(|| format!("failed to create {}", meas_dir.display()))?;
    let product =
        synthetic_product_path(&meas_dir, &config.synthetic.tag, start.date(), end.date());
    write_synthetic_product(&product, &config.synthetic.measurement_var, noisy.field())
        .with_context(|| format!("failed to write synthetic product: {}", product.display()))?;
    info!(path = %product.display(), "synthetic product written");

    Ok(product)
}

/// Time labels of the measurement product within `(start, end]`.
///
/// The state at `start` is the run's initial state and cannot be replaced,
/// so a measurement there is dropped.
fn measurement_times(
    path: &Path,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<NaiveDateTime>> {
    let times = read_times(path, "time")
        .with_context(|| format!("failed to read measurement times: {}", path.display()))?;
    if times.contains(&start) {
        warn!(%start, "measurement at the start of the run is not rescaled");
    }
    let selected: Vec<_> = times.into_iter().filter(|&t| t > start && t <= end).collect();
    if selected.is_empty() {
        bail!(
            "no measurement times after {start} up to {end} in {}",
            path.display()
        );
    }
    Ok(selected)
}

/// Open-loop soil moisture relabelled to state times and cut to `times`.
fn openloop_reference(
    path: &Path,
    var: &str,
    steps_per_day: u32,
    times: &[NaiveDateTime],
) -> Result<Field> {
    let history = read_field(path, var)
        .with_context(|| format!("failed to read open-loop history: {}", path.display()))?;
    let aligned = align_history_times(history.times("time")?, steps_per_day)?;
    history
        .with_coords("time", Coords::Time(aligned))
        .and_then(|h| h.select_times("time", times))
        .context("open-loop history does not cover the measurement times")
}

/// Writes one rescaled snapshot per truth snapshot, to the path assigned
/// to its instant.
fn persist_rescaled(
    rescaled: &Field,
    truth_snapshots: &[(NaiveDateTime, PathBuf)],
    assigned: &BTreeMap<NaiveDateTime, PathBuf>,
    var: &str,
) -> Result<()> {
    for (i, (t, template)) in truth_snapshots.iter().enumerate() {
        let out = assigned
            .get(t)
            .with_context(|| format!("no rescaled snapshot path for {t}"))?;
        let snapshot = rescaled.index_axis("time", i)?;
        save_updated_state(template, &snapshot, var, out)
            .with_context(|| format!("failed to save rescaled state {}", out.display()))?;
    }
    info!(n = assigned.len(), "rescaled states saved");
    Ok(())
}

fn log_yearly_coverage(
    times: &[NaiveDateTime],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<()> {
    for year in year_span(start, end)? {
        let n = times.iter().filter(|t| t.year() == year).count();
        if n == 0 {
            warn!(year, "no measurements in year");
        } else {
            info!(year, n, "measurements");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use chrono::{NaiveDate, TimeDelta};
    use tellus_driver::{DriverError, HistoryProducts};
    use tellus_field::Axis;
    use tellus_io::write_fields;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn measurement_times_are_cut_to_the_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meas.nc");
        let field = Field::filled(
            vec![
                Axis::time("time", (1..=5).map(day).collect()),
                Axis::float("lat", vec![35.0]),
                Axis::float("lon", vec![-97.0]),
            ],
            0.3,
        )
        .unwrap();
        write_fields(&path, &[("simulated_surface_sm", &field)]).unwrap();

        // The state at the start of the run is the initial state.
        let t = measurement_times(&path, day(2), day(4)).unwrap();
        assert_eq!(t, vec![day(3), day(4)]);
        assert!(measurement_times(&path, day(5), day(9)).is_err());
    }

    #[test]
    fn openloop_is_shifted_back_one_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openloop.nc");
        let labels: Vec<_> = (1..=4).map(day).collect();
        let field = Field::from_vec(
            vec![
                Axis::time("time", labels),
                Axis::range("nlayer", 1),
                Axis::float("lat", vec![35.0]),
                Axis::float("lon", vec![-97.0]),
            ],
            vec![10.0, 20.0, 30.0, 40.0],
        )
        .unwrap();
        write_fields(&path, &[("OUT_SOIL_MOIST", &field)]).unwrap();

        // Daily steps: the record labelled day 3 is the state at day 2.
        let r = openloop_reference(&path, "OUT_SOIL_MOIST", 1, &[day(2)]).unwrap();
        assert_eq!(r.values(), vec![30.0]);
        assert_eq!(r.times("time").unwrap(), [day(2)]);

        let missing = openloop_reference(&path, "OUT_SOIL_MOIST", 1, &[day(4)]);
        assert!(missing.is_err());
    }

    #[test]
    fn sub_daily_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openloop.nc");
        let labels: Vec<_> = (0..4).map(|h| day(1) + TimeDelta::hours(3 * h)).collect();
        let field = Field::from_vec(
            vec![Axis::time("time", labels), Axis::range("nlayer", 1)],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        write_fields(&path, &[("sm", &field)]).unwrap();
        let r = openloop_reference(&path, "sm", 8, &[day(1)]).unwrap();
        assert_eq!(r.values(), vec![2.0]);
    }

    fn grid() -> Vec<Axis> {
        vec![
            Axis::float("lat", vec![35.0, 35.5]),
            Axis::float("lon", vec![-97.0]),
        ]
    }

    fn with_grid(mut axes: Vec<Axis>) -> Vec<Axis> {
        axes.extend(grid());
        axes
    }

    /// Writes every input of a run over 2017-03-01..05 under `root`: a prior
    /// product labelled `product_times`, truth snapshots for each of those
    /// after the start, the open-loop history and soil parameters.
    fn write_inputs(root: &Path, product_times: &[NaiveDateTime]) -> TellusConfig {
        let meas_dir = root.join("output/synthetic_meas");
        let states = root.join("output/truth/states");
        std::fs::create_dir_all(&meas_dir).unwrap();
        std::fs::create_dir_all(&states).unwrap();

        let product = Field::filled(
            with_grid(vec![Axis::time("time", product_times.to_vec())]),
            0.3,
        )
        .unwrap();
        write_fields(
            &meas_dir.join("synthetic_meas.20170301_20170305.nc"),
            &[("simulated_surface_sm", &product)],
        )
        .unwrap();

        let state_times: Vec<_> = product_times.iter().copied().filter(|&t| t > day(1)).collect();
        for (k, &t) in state_times.iter().enumerate() {
            let axes = with_grid(vec![
                Axis::range("veg_class", 2),
                Axis::range("snow_band", 1),
                Axis::range("nlayer", 2),
            ]);
            let values = (0..8).map(|i| 20.0 + (k as f64 + 1.0) * (i as f64 + 1.0) * 0.5);
            let state = Field::from_vec(axes, values.collect()).unwrap();
            write_fields(
                &snapshot_path(&states, "perturbed", t),
                &[("STATE_SOIL_MOISTURE", &state)],
            )
            .unwrap();
        }

        // History labels sit one model step after the state they describe.
        let labels: Vec<_> = state_times.iter().map(|&t| t + TimeDelta::days(1)).collect();
        let n = labels.len();
        let openloop = Field::from_vec(
            with_grid(vec![Axis::time("time", labels), Axis::range("nlayer", 2)]),
            (0..n * 4).map(|i| 25.0 + (i % 7) as f64).collect(),
        )
        .unwrap();
        write_fields(&root.join("openloop.nc"), &[("OUT_SOIL_MOIST", &openloop)]).unwrap();

        let layer_grid = || with_grid(vec![Axis::range("nlayer", 2)]);
        write_fields(
            &root.join("params.nc"),
            &[
                ("depth", &Field::filled(layer_grid(), 0.1).unwrap()),
                ("bulk_density", &Field::filled(layer_grid(), 1300.0).unwrap()),
                ("soil_density", &Field::filled(layer_grid(), 2650.0).unwrap()),
            ],
        )
        .unwrap();

        toml::from_str(&format!(
            r#"
            [time]
            start = "2017-03-01"
            end = "2017-03-05"
            [paths]
            root = "{}"
            openloop_history = "openloop.nc"
            params = "params.nc"
            [simulation]
            initial_state = "init.state.nc"
            forcing_pattern = "forcing/force."
            "#,
            root.display()
        ))
        .unwrap()
    }

    /// Writes one daily history file with a dry top layer at the first
    /// latitude and records the request it was given.
    #[derive(Default)]
    struct FakeSimulator {
        runs: Cell<usize>,
        assigned: Cell<usize>,
    }

    impl SimulationDriver for FakeSimulator {
        fn run(&self, request: &SimulationRequest) -> Result<HistoryProducts, DriverError> {
            self.runs.set(self.runs.get() + 1);
            self.assigned.set(request.assigned_states().len());
            for path in request.assigned_states().values() {
                assert!(path.exists(), "{} not written before the run", path.display());
            }
            std::fs::create_dir_all(&request.output().history).unwrap();
            let history = Field::from_vec(
                with_grid(vec![
                    Axis::time("time", (1..=5).map(day).collect()),
                    Axis::range("nlayer", 2),
                ]),
                (0..20)
                    .map(|i| match i % 4 {
                        0 => 0.0,
                        1 => 30.0,
                        _ => 100.0,
                    })
                    .collect(),
            )
            .unwrap();
            let path = request.output().history.join("history.000.2017-03-01.nc");
            write_fields(&path, &[("OUT_SOIL_MOIST", &history)]).unwrap();
            Ok(HistoryProducts::new(vec![path]))
        }
    }

    #[test]
    fn pipeline_writes_reflected_product_at_measurement_times() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_inputs(dir.path(), &(1..=5).map(day).collect::<Vec<_>>());
        let sim = FakeSimulator::default();

        let product = execute(&config, 11, &sim).unwrap();

        assert_eq!(sim.runs.get(), 1);
        assert_eq!(sim.assigned.get(), 4);
        assert!(
            product.ends_with("output/synthetic_meas/synthetic_meas.rescaled_v1.20170301_20170305.nc")
        );
        let meas = read_field(&product, "simulated_surface_sm").unwrap();
        assert_eq!(meas.names(), ["time", "lat", "lon"]);
        assert_eq!(meas.shape(), &[4, 2, 1]);
        assert_eq!(meas.times("time").unwrap(), (2..=5).map(day).collect::<Vec<_>>());
        assert!(meas.values().iter().all(|&v| v >= 0.0));
        let wet = meas.index_axis("lat", 1).unwrap().values();
        assert!(wet.iter().all(|v| (v - 30.0).abs() < 10.0));

        // Same seed, fresh output tree: identical draws.
        let again = tempfile::tempdir().unwrap();
        let config = write_inputs(again.path(), &(1..=5).map(day).collect::<Vec<_>>());
        let repeat = execute(&config, 11, &FakeSimulator::default()).unwrap();
        assert_eq!(read_field(&repeat, "simulated_surface_sm").unwrap().values(), meas.values());
    }

    #[test]
    fn bad_request_fails_before_snapshots_are_written() {
        let dir = tempfile::tempdir().unwrap();
        // Noon is off the daily model step grid.
        let times = [day(2), day(3) + TimeDelta::hours(12), day(4)];
        let config = write_inputs(dir.path(), &times);
        let sim = FakeSimulator::default();

        let err = execute(&config, 1, &sim).unwrap_err();
        assert!(format!("{err:#}").contains("invalid simulation request"));
        assert_eq!(sim.runs.get(), 0);
        let rescaled = std::fs::read_dir(dir.path().join("output/truth/states"))
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with("rescaled")
            })
            .count();
        assert_eq!(rescaled, 0);
    }

    #[test]
    fn configured_seed_is_kept() {
        assert_eq!(noise_seed(Some(7)), 7);
    }
}
