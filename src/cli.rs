use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tellus truth rescaling and ensemble verification.
#[derive(Parser)]
#[command(
    name = "tellus",
    version,
    about = "Truth rescaling, synthetic observations and ensemble verification"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Rescale truth states, re-run the simulator and write synthetic
    /// measurements.
    Rescale(RescaleArgs),
    /// Score routed streamflow against observations.
    Evaluate(EvaluateArgs),
}

/// Arguments for the `rescale` subcommand.
#[derive(clap::Args)]
pub struct RescaleArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "tellus.toml")]
    pub config: PathBuf,

    /// Override global RNG seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// Arguments for the `evaluate` subcommand.
#[derive(clap::Args)]
pub struct EvaluateArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "tellus.toml")]
    pub config: PathBuf,

    /// Path for scores JSON output.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
