//! # Scratch Ledger Driver
//!
//! Entry point for the `scratch` binary. Parses CLI arguments, initializes
//! logging and dispatches to a subcommand:
//!
//! - `deploy`   — run genesis and print the resulting ledger
//! - `simulate` — replay a JSON scenario against a fresh deployment
//! - `schedule` — print a founder's vesting timetable
//! - `version`  — print build version information

mod cli;
mod logging;
mod scenario;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use std::path::Path;

use scratch_contracts::config::{FOUNDER_ALLOCATIONS_BPS, TOKEN_SYMBOL, UNIT};
use scratch_contracts::genesis::allocation;
use scratch_contracts::{
    Address, DeployParams, FoundersTimelock, LedgerSnapshot, ScheduledRelease, ScratchToken,
    SimulatedPool,
};

use cli::{Commands, ScratchCli};

fn main() -> Result<()> {
    let cli = ScratchCli::parse();

    if !matches!(cli.command, Commands::Version) {
        logging::init_logging(&cli.log_level, cli.log_format);
    }

    match cli.command {
        Commands::Deploy(args) => deploy(args),
        Commands::Simulate(args) => simulate(args),
        Commands::Schedule(args) => schedule(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct DeployReport {
    params: DeployParams,
    ledger: LedgerSnapshot,
    timelocks: Vec<FoundersTimelock>,
}

fn load_params(path: &Path) -> Result<DeployParams> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read deploy params {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid deploy params {}", path.display()))
}

/// Runs genesis against an empty simulated pool.
fn deploy(args: cli::DeployArgs) -> Result<()> {
    let params = match &args.params {
        Some(path) => load_params(path)?,
        None => DeployParams::from_labels("scratch"),
    };
    let deployed_at = args.deployed_at.unwrap_or_else(Utc::now);

    let mut pool = SimulatedPool::new(Address::from_label("scratch:router"));
    let deployment = ScratchToken::deploy(&params, &mut pool, deployed_at)
        .context("genesis deployment failed")?;

    tracing::info!(
        token = %deployment.token.address(),
        pair = %deployment.token.pair_address(),
        total_supply = %deployment.token.total_supply(),
        "ledger deployed"
    );

    let report = DeployReport {
        params,
        ledger: deployment.token.snapshot(),
        timelocks: deployment.timelocks,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn simulate(args: cli::SimulateArgs) -> Result<()> {
    let scenario = scenario::load(&args.scenario)?;
    tracing::info!(
        scenario = %args.scenario.display(),
        steps = scenario.steps.len(),
        strict = args.strict,
        "running scenario"
    );

    let report = scenario::run(&scenario, args.strict, args.events)?;
    let failed = report.steps.iter().filter(|s| !s.ok).count();
    tracing::info!(failed, "scenario finished");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[derive(Serialize)]
struct ScheduleReport {
    founder: Address,
    timelock: Address,
    allocation: u128,
    releases: Vec<ScheduledRelease>,
}

fn schedule(args: cli::ScheduleArgs) -> Result<()> {
    let Some(bps) = FOUNDER_ALLOCATIONS_BPS.get(args.founder).copied() else {
        bail!(
            "founder index {} out of range (0..{})",
            args.founder,
            FOUNDER_ALLOCATIONS_BPS.len()
        );
    };
    let deployed_at = args.deployed_at.unwrap_or_else(Utc::now);

    let params = DeployParams::from_labels("scratch");
    let mut pool = SimulatedPool::new(Address::from_label("scratch:router"));
    let deployment = ScratchToken::deploy(&params, &mut pool, deployed_at)
        .context("genesis deployment failed")?;
    let timelock = deployment
        .timelocks
        .get(args.founder)
        .context("timelock missing after deployment")?;

    let total = allocation(bps);
    let report = ScheduleReport {
        founder: timelock.beneficiary(),
        timelock: timelock.address(),
        allocation: total,
        releases: timelock.release_schedule(total),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("founder   {}", report.founder);
    println!("timelock  {}", report.timelock);
    println!("total     {} {TOKEN_SYMBOL}", report.allocation / UNIT);
    println!();
    println!("{:>6}  {:<25}  {:>24}", "period", "unlocks at", "cumulative");
    for release in &report.releases {
        println!(
            "{:>6}  {:<25}  {:>24}",
            release.period,
            release.unlocks_at.to_rfc3339(),
            release.cumulative / UNIT
        );
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("scratch            {}", env!("CARGO_PKG_VERSION"));
    println!("scratch-contracts  {}", scratch_contracts::VERSION);
    println!("rustc              {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
