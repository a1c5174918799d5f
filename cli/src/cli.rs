//! # CLI Interface
//!
//! Defines the command-line argument structure for `scratch` using `clap`
//! derive. Supports four subcommands: `deploy`, `simulate`, `schedule`
//! and `version`.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Scratch token ledger driver.
///
/// Deploys a genesis ledger against an in-memory constant-product pool,
/// replays trading scenarios and prints founder vesting schedules. Reports
/// go to stdout as JSON; logs go to stderr.
#[derive(Parser, Debug)]
#[command(
    name = "scratch",
    about = "Scratch token ledger driver",
    version,
    propagate_version = true
)]
pub struct ScratchCli {
    /// Log output format.
    #[arg(long, global = true, env = "SCRATCH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "SCRATCH_LOG_LEVEL", default_value = "scratch_cli=info,scratch_contracts=info")]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `scratch` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a genesis ledger and print the resulting distribution.
    Deploy(DeployArgs),
    /// Replay a JSON scenario against a freshly deployed ledger.
    Simulate(SimulateArgs),
    /// Print a founder's vesting schedule.
    Schedule(ScheduleArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `deploy` subcommand.
#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// JSON file with deployment accounts (owner, founders, wallets).
    ///
    /// When omitted, accounts are derived from readable labels.
    #[arg(long, short = 'p', env = "SCRATCH_PARAMS")]
    pub params: Option<PathBuf>,

    /// Deployment timestamp (RFC 3339). Defaults to now.
    #[arg(long)]
    pub deployed_at: Option<DateTime<Utc>>,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// JSON scenario file.
    #[arg(long, short = 's', env = "SCRATCH_SCENARIO")]
    pub scenario: PathBuf,

    /// Abort on the first failing step instead of recording it.
    #[arg(long)]
    pub strict: bool,

    /// Include the full event log in the report.
    #[arg(long)]
    pub events: bool,
}

/// Arguments for the `schedule` subcommand.
#[derive(Parser, Debug)]
pub struct ScheduleArgs {
    /// Founder index (0-based, allocation order).
    #[arg(long, short = 'f', default_value_t = 0)]
    pub founder: usize,

    /// Deployment timestamp (RFC 3339). Defaults to now.
    #[arg(long)]
    pub deployed_at: Option<DateTime<Utc>>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}
