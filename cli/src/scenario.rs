//! # Scenario Runner
//!
//! Replays a JSON list of steps against a freshly deployed ledger and its
//! simulated pool. Accounts are named: `owner`, `dev`, `ops`, `archa`,
//! `exchange`, `pair`, `router`, `token`, `founder-1` … `founder-5`, any
//! `0x`-prefixed hex address, or any other label (hashed to an address).
//!
//! Token amounts are whole SCRATCH; base amounts are whole base units
//! (18 decimals). Both are scaled to smallest units before use.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use scratch_contracts::config::UNIT;
use scratch_contracts::{
    Address, Amount, DeployParams, FeeCategory, FoundersTimelock, LedgerSnapshot, LiquidityAdded,
    LiquidityRouter, PoolReserves, ScratchToken, SimulatedPool, TokenEvent, TransferReceipt,
};

/// Smallest units per whole base-asset unit.
pub const BASE_UNIT: Amount = 1_000_000_000_000_000_000;

/// A complete scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Deployment timestamp. Defaults to the Unix epoch.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// Label prefix for derived accounts.
    #[serde(default = "default_label")]
    pub label: String,
    pub steps: Vec<Step>,
}

fn default_label() -> String {
    "scenario".to_string()
}

/// One scenario action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Owner seeds the pool.
    AddLiquidity { tokens: u64, base: u64 },
    /// Mint base asset to an account.
    FundBase { account: String, base: u64 },
    /// Swap base for tokens through the router.
    Buy { account: String, base: u64 },
    /// Swap tokens for base through the router (approves the router first).
    Sell { account: String, tokens: u64 },
    Transfer { from: String, to: String, tokens: u64 },
    Approve { owner: String, spender: String, tokens: u64 },
    /// Move the clock forward.
    Advance {
        #[serde(default)]
        days: i64,
        #[serde(default)]
        seconds: i64,
    },
    /// Founder (1-based) claims whatever has vested.
    Release { founder: usize },
    SetFee { category: FeeCategory, enabled: bool },
    SetSwapAndLiquify { enabled: bool },
    SetStabilityGuard { enabled: bool },
    SetSwapThreshold { tokens: u64 },
    SetFeeExempt { account: String, exempt: bool },
    SetLiquidityWallet { wallet: Option<String> },
}

/// What a successful step produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDetail {
    Liquidity(LiquidityAdded),
    Bought { received: Amount },
    Sold { base_out: Amount },
    Transfer(TransferReceipt),
    Clock { now: DateTime<Utc> },
    Released { amount: Amount },
}

/// The result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub step: Step,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<StepDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A founder timelock as it stands at the end of the run.
#[derive(Debug, Clone, Serialize)]
pub struct TimelockReport {
    pub address: Address,
    pub beneficiary: Address,
    pub cliff: DateTime<Utc>,
    pub released: Amount,
    pub locked: Amount,
}

/// Everything `simulate` prints.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepOutcome>,
    pub reserves: PoolReserves,
    pub ledger: LedgerSnapshot,
    pub timelocks: Vec<TimelockReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<TokenEvent>>,
}

pub fn load(path: &Path) -> Result<Scenario> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid scenario {}", path.display()))
}

/// Deployed ledger, pool and clock.
pub struct Simulation {
    params: DeployParams,
    token: ScratchToken,
    pool: SimulatedPool,
    timelocks: Vec<FoundersTimelock>,
    now: DateTime<Utc>,
}

impl Simulation {
    pub fn deploy(label: &str, start: DateTime<Utc>) -> Result<Self> {
        let params = DeployParams::from_labels(label);
        let mut pool = SimulatedPool::new(Address::from_label(&format!("{label}:router")));
        let deployment =
            ScratchToken::deploy(&params, &mut pool, start).context("genesis deployment failed")?;
        Ok(Self {
            params,
            token: deployment.token,
            pool,
            timelocks: deployment.timelocks,
            now: start,
        })
    }

    /// Resolves a named account.
    pub fn account(&self, name: &str) -> Result<Address> {
        let p = &self.params;
        let address = match name {
            "owner" => p.owner,
            "dev" => p.dev_wallet,
            "ops" => p.ops_wallet,
            "archa" => p.archa_wallet,
            "exchange" => p.exchange_wallet,
            "pair" => self.token.pair_address(),
            "router" => self.pool.address(),
            "token" => self.token.address(),
            _ if name.starts_with("0x") => name.parse()?,
            _ => match name.strip_prefix("founder-").map(str::parse::<usize>) {
                Some(Ok(n)) => *n
                    .checked_sub(1)
                    .and_then(|i| p.founders.get(i))
                    .ok_or_else(|| anyhow!("no founder {n}"))?,
                _ => Address::from_label(name),
            },
        };
        Ok(address)
    }

    /// Applies one step.
    pub fn apply(&mut self, step: &Step) -> Result<Option<StepDetail>> {
        let owner = self.params.owner;
        match step {
            Step::AddLiquidity { tokens, base } => {
                let tokens = whole_tokens(*tokens)?;
                let base = whole_base(*base)?;
                let router = self.pool.address();
                self.token.approve(owner, router, tokens)?;
                self.pool.fund_base(owner, base);
                let added = self
                    .pool
                    .add_liquidity(&mut self.token, owner, tokens, base, owner)?;
                Ok(Some(StepDetail::Liquidity(added)))
            }
            Step::FundBase { account, base } => {
                let account = self.account(account)?;
                self.pool.fund_base(account, whole_base(*base)?);
                Ok(None)
            }
            Step::Buy { account, base } => {
                let account = self.account(account)?;
                let received = self.pool.swap_exact_base_for_tokens(
                    &mut self.token,
                    account,
                    whole_base(*base)?,
                    account,
                )?;
                Ok(Some(StepDetail::Bought { received }))
            }
            Step::Sell { account, tokens } => {
                let account = self.account(account)?;
                let tokens = whole_tokens(*tokens)?;
                self.token.approve(account, self.pool.address(), tokens)?;
                let base_out = self
                    .pool
                    .swap_exact_tokens_for_base(&mut self.token, account, tokens, account)?;
                Ok(Some(StepDetail::Sold { base_out }))
            }
            Step::Transfer { from, to, tokens } => {
                let from = self.account(from)?;
                let to = self.account(to)?;
                let receipt = self
                    .token
                    .transfer(&mut self.pool, from, to, whole_tokens(*tokens)?)?;
                Ok(Some(StepDetail::Transfer(receipt)))
            }
            Step::Approve {
                owner: holder,
                spender,
                tokens,
            } => {
                let holder = self.account(holder)?;
                let spender = self.account(spender)?;
                self.token.approve(holder, spender, whole_tokens(*tokens)?)?;
                Ok(None)
            }
            Step::Advance { days, seconds } => {
                let delta = Duration::try_days(*days)
                    .zip(Duration::try_seconds(*seconds))
                    .and_then(|(d, s)| d.checked_add(&s))
                    .ok_or_else(|| anyhow!("advance out of range"))?;
                self.now = self
                    .now
                    .checked_add_signed(delta)
                    .ok_or_else(|| anyhow!("clock out of range"))?;
                Ok(Some(StepDetail::Clock { now: self.now }))
            }
            Step::Release { founder } => {
                let index = founder
                    .checked_sub(1)
                    .filter(|i| *i < self.timelocks.len())
                    .ok_or_else(|| anyhow!("no founder {founder}"))?;
                let beneficiary = self.timelocks[index].beneficiary();
                let mut handle = self.token.with_router(&mut self.pool);
                let amount = self.timelocks[index].release(beneficiary, &mut handle, self.now)?;
                Ok(Some(StepDetail::Released { amount }))
            }
            Step::SetFee { category, enabled } => {
                self.token.set_fee_enabled(owner, *category, *enabled)?;
                Ok(None)
            }
            Step::SetSwapAndLiquify { enabled } => {
                self.token.set_swap_and_liquify_enabled(owner, *enabled)?;
                Ok(None)
            }
            Step::SetStabilityGuard { enabled } => {
                self.token.set_stability_guard_enabled(owner, *enabled)?;
                Ok(None)
            }
            Step::SetSwapThreshold { tokens } => {
                self.token.set_swap_threshold(owner, whole_tokens(*tokens)?)?;
                Ok(None)
            }
            Step::SetFeeExempt { account, exempt } => {
                let account = self.account(account)?;
                self.token.set_fee_exempt(owner, account, *exempt)?;
                Ok(None)
            }
            Step::SetLiquidityWallet { wallet } => {
                let wallet = wallet.as_deref().map(|w| self.account(w)).transpose()?;
                self.token.set_liquidity_wallet(owner, wallet)?;
                Ok(None)
            }
        }
    }

    pub fn report(&mut self, steps: Vec<StepOutcome>, include_events: bool) -> SimulationReport {
        let timelocks = {
            let handle = self.token.with_router(&mut self.pool);
            self.timelocks
                .iter()
                .map(|t| TimelockReport {
                    address: t.address(),
                    beneficiary: t.beneficiary(),
                    cliff: t.cliff(),
                    released: t.released_balance(),
                    locked: t.locked_balance(&handle),
                })
                .collect()
        };
        SimulationReport {
            finished_at: self.now,
            steps,
            reserves: self.pool.reserves(),
            ledger: self.token.snapshot(),
            timelocks,
            events: include_events.then(|| self.token.events().to_vec()),
        }
    }
}

/// Runs every step. With `strict`, the first failure aborts the run.
pub fn run(scenario: &Scenario, strict: bool, include_events: bool) -> Result<SimulationReport> {
    let start = scenario.start.unwrap_or_default();
    let mut sim = Simulation::deploy(&scenario.label, start)?;

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        match sim.apply(step) {
            Ok(detail) => {
                info!(index, step = ?step, "step applied");
                outcomes.push(StepOutcome {
                    index,
                    step: step.clone(),
                    ok: true,
                    detail,
                    error: None,
                });
            }
            Err(err) if strict => {
                return Err(err.context(format!("step {index} failed")));
            }
            Err(err) => {
                warn!(index, step = ?step, error = %err, "step failed");
                outcomes.push(StepOutcome {
                    index,
                    step: step.clone(),
                    ok: false,
                    detail: None,
                    error: Some(format!("{err:#}")),
                });
            }
        }
    }

    Ok(sim.report(outcomes, include_events))
}

fn whole_tokens(tokens: u64) -> Result<Amount> {
    Amount::from(tokens)
        .checked_mul(UNIT)
        .ok_or_else(|| anyhow!("{tokens} tokens overflows"))
}

fn whole_base(base: u64) -> Result<Amount> {
    if base == 0 {
        bail!("base amount must be non-zero");
    }
    Amount::from(base)
        .checked_mul(BASE_UNIT)
        .ok_or_else(|| anyhow!("{base} base units overflows"))
}
