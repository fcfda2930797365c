//! Driving a fake simulator through whole requests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use tellus_driver::{
    CommandDriver, CommandDriverConfig, Completion, DriverError, Launcher, OutputDirs,
    SimulationDriver, SimulationRequest,
};

const TEMPLATE: &str = "\
STARTYEAR {{start_year}}
STARTMONTH {{start_month}}
STARTDAY {{start_day}}
STARTSEC {{start_sec}}
ENDYEAR {{end_year}}
ENDMONTH {{end_month}}
ENDDAY {{end_day}}
INIT_STATE {{init_state}}
FORCING1 {{forcing}}
MODEL_STEPS_PER_DAY {{steps_per_day}}
HISTFILE {{history_prefix}}
RESULT_DIR {{history_dir}}
";

fn at(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 1, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Records each global file and writes one history file per launch, the
/// way the real simulator would.
#[derive(Default)]
struct FakeSimulator {
    globals: RefCell<Vec<String>>,
    fail_on: Option<usize>,
}

impl Launcher for FakeSimulator {
    fn launch(
        &self,
        _program: &Path,
        args: &[String],
        log: &Path,
    ) -> Result<Completion, DriverError> {
        let global = std::fs::read_to_string(&args[1]).unwrap();
        let n = self.globals.borrow().len();
        std::fs::write(log, "simulating\n").unwrap();
        if self.fail_on == Some(n) {
            self.globals.borrow_mut().push(global);
            return Ok(Completion { code: Some(1) });
        }
        let value = |key: &str| {
            global
                .lines()
                .find_map(|l| l.strip_prefix(key))
                .unwrap()
                .trim()
                .to_string()
        };
        let hist = PathBuf::from(value("RESULT_DIR "))
            .join(format!("{}.{}.nc", value("HISTFILE "), value("STARTDAY ")));
        std::fs::write(hist, b"").unwrap();
        self.globals.borrow_mut().push(global);
        Ok(Completion { code: Some(0) })
    }
}

fn request(root: &Path) -> SimulationRequest {
    let mut states = BTreeMap::new();
    states.insert(at(4), root.join("rescaled.state.20170104_00000.nc"));
    states.insert(at(7), root.join("rescaled.state.20170107_00000.nc"));
    SimulationRequest::new(
        at(1),
        at(9),
        root.join("init.nc"),
        "/forcing/force.",
        1,
        OutputDirs::under(root),
    )
    .with_assigned_states(states)
}

#[test]
fn one_launch_per_segment_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let driver = CommandDriver::with_launcher(
        CommandDriverConfig::new("vic", TEMPLATE),
        FakeSimulator::default(),
    );
    let products = driver.run(&request(dir.path())).unwrap();

    let names: Vec<_> = products
        .files()
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["history.000.01.nc", "history.001.04.nc", "history.002.07.nc"]);

    let globals = std::fs::read_dir(dir.path().join("global")).unwrap().count();
    assert_eq!(globals, 3);
    let second = std::fs::read_to_string(dir.path().join("global/global.001.txt")).unwrap();
    assert!(second.contains("STARTDAY 04"));
    assert!(second.contains("ENDDAY 06"));
    assert!(second.contains("rescaled.state.20170104_00000.nc"));
    assert!(second.contains("MODEL_STEPS_PER_DAY 1"));
    assert!(dir.path().join("logs/segment_002.log").exists());
}

#[test]
fn failed_segment_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let driver = CommandDriver::with_launcher(
        CommandDriverConfig::new("vic", TEMPLATE),
        FakeSimulator {
            fail_on: Some(1),
            ..Default::default()
        },
    );
    let err = driver.run(&request(dir.path())).unwrap_err();
    assert!(matches!(err, DriverError::SimulationFailed { segment: 1, .. }));
    assert!(!dir.path().join("global/global.002.txt").exists());
}

#[test]
fn stale_history_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("history")).unwrap();
    std::fs::write(dir.path().join("history/history.000.01.nc"), b"").unwrap();
    let driver = CommandDriver::with_launcher(
        CommandDriverConfig::new("vic", TEMPLATE),
        FakeSimulator::default(),
    );
    let err = driver.run(&request(dir.path())).unwrap_err();
    assert!(matches!(err, DriverError::InvalidRequest { .. }));
}

#[cfg(unix)]
#[test]
fn real_process_run() {
    let dir = tempfile::tempdir().unwrap();
    // The rendered global file is itself the script the shell executes.
    let script = "touch {{history_dir}}/{{history_prefix}}.{{start_year}}-{{start_month}}-{{start_day}}-{{start_sec}}.nc\n";
    let config = CommandDriverConfig::new("sh", script)
        .with_args(vec!["{{global}}".to_string()])
        .with_history_prefix("truth");
    let req = SimulationRequest::new(
        at(1),
        at(3),
        dir.path().join("init.nc"),
        "/forcing/force.",
        4,
        OutputDirs::under(dir.path()),
    );
    let products = CommandDriver::new(config).run(&req).unwrap();
    assert_eq!(
        products.files(),
        [dir.path().join("history/truth.000.2017-01-01-00000.nc")]
    );
}

#[cfg(unix)]
#[test]
fn real_process_without_history_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = CommandDriverConfig::new("sh", "exit 0 # {{history_dir}}")
        .with_args(vec!["{{global}}".to_string()]);
    let req = SimulationRequest::new(
        at(1),
        at(3),
        dir.path().join("init.nc"),
        "/forcing/force.",
        1,
        OutputDirs::under(dir.path()),
    );
    let err = CommandDriver::new(config).run(&req).unwrap_err();
    assert!(matches!(err, DriverError::MissingHistory { segment: 0, .. }));
}
