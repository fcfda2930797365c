use tracing_subscriber::EnvFilter;

/// Workspace crates whose events are shown by default.
const CRATE_TARGETS: &[&str] = &[
    "tellus",
    "tellus_calendar",
    "tellus_driver",
    "tellus_evaluate",
    "tellus_field",
    "tellus_io",
    "tellus_perturb",
    "tellus_rescale",
    "tellus_stats",
];

/// Level for `-v` count: none warn, 1 info, 2 debug, 3+ trace.
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn default_directives(verbosity: u8) -> String {
    let level = level_for(verbosity);
    CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` replaces the verbosity-derived filter when set. Simulator
/// output never passes through here; it goes to per-segment log files.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
