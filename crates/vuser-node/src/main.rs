//! Vuser Proof-of-Proposal Simulation Node
//!
//! Runs an in-process Proof-of-Proposal ledger: a configurable number of
//! election rounds, followed by the sidechain anchoring, coalition
//! sponsorship and VEP2 wallet approval demos.

mod genesis;
mod simulation;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};
use vuser_chain::LedgerConfig;

use crate::genesis::{total_supply, COIN_NAME, COIN_SYMBOL};
use crate::simulation::{
    ApprovalDemoReport, CoalitionDemoReport, RoundReport, SidechainDemoReport, Simulation,
    SimulationConfig,
};

/// Vuser Simulation Node
///
/// Simulates Proof-of-Proposal rounds on an in-memory ledger.
#[derive(Parser, Debug)]
#[command(name = "vuser-node")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of rounds to run
    #[arg(short, long, env = "VUSER_ROUNDS", default_value = "5")]
    rounds: u64,

    /// Number of participating miners
    #[arg(short, long, env = "VUSER_PARTICIPANTS", default_value = "5")]
    participants: usize,

    /// Pause between rounds in milliseconds
    #[arg(long, env = "VUSER_ROUND_DELAY_MS", default_value = "100")]
    round_delay_ms: u64,

    /// Chance in percent that the primary miner is offline
    #[arg(long, env = "VUSER_FALLBACK_PROBABILITY", default_value = "20")]
    fallback_probability: u8,

    /// Initial coalition treasury balance
    #[arg(long, env = "VUSER_INITIAL_TREASURY", default_value = "1000")]
    initial_treasury: u64,

    /// Seed for reproducible elections (clock-seeded when omitted)
    #[arg(long, env = "VUSER_SEED")]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VUSER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (plain, json)
    #[arg(long, env = "VUSER_LOG_FORMAT", default_value = "plain")]
    log_format: String,

    /// Print a JSON summary of the run to stdout
    #[arg(long, env = "VUSER_SUMMARY", default_value = "false")]
    summary: bool,
}

#[derive(Serialize)]
struct Summary {
    rounds: Vec<RoundReport>,
    sidechain: SidechainDemoReport,
    coalition: CoalitionDemoReport,
    approval: ApprovalDemoReport,
}

fn setup_logging(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    match log_format.to_lowercase().as_str() {
        "json" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
        _ => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
    }

    Ok(())
}

/// Build simulation configuration from CLI arguments
fn build_config(args: &Args) -> SimulationConfig {
    SimulationConfig {
        rounds: args.rounds,
        participants: args.participants,
        round_delay: Duration::from_millis(args.round_delay_ms),
        fallback_percent: args.fallback_probability,
        initial_treasury: args.initial_treasury,
        seed: args.seed,
        ledger: LedgerConfig::default(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level, &args.log_format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        coin = COIN_NAME,
        symbol = COIN_SYMBOL,
        total_supply = %total_supply(),
        rounds = args.rounds,
        participants = args.participants,
        fallback_probability = args.fallback_probability,
        seeded = args.seed.is_some(),
        "Starting Vuser simulation"
    );

    let mut sim = Simulation::new(build_config(&args)).context("Failed to start simulation")?;
    info!(
        genesis = %sim.chain().genesis_hash(),
        participants = ?sim.participants(),
        "Genesis block created"
    );

    let rounds = sim.run().context("Simulation round failed")?;

    sim.chain()
        .verify_chain()
        .context("Chain failed verification")?;
    for block in sim.chain().iter() {
        info!(
            index = block.index,
            hash = %block.hash,
            validator = %block.validator,
            entries = block.entries.len(),
            "Chain block"
        );
    }

    let sidechain = sim.sidechain_demo().context("Sidechain demo failed")?;
    let coalition = sim.coalition_demo().context("Coalition demo failed")?;
    let approval = sim.approval_demo();

    let stats = sim
        .coalition()
        .treasury_stats()
        .context("Treasury unavailable")?;
    info!(
        height = sim.chain().height(),
        treasury_balance = %stats.balance,
        treasury_received = %stats.total_received,
        treasury_spent = %stats.total_spent,
        treasury_transactions = stats.transaction_count,
        "Simulation finished"
    );

    if args.summary {
        let summary = Summary {
            rounds,
            sidechain,
            coalition,
            approval,
        };
        let json = serde_json::to_string_pretty(&summary).context("Failed to encode summary")?;
        println!("{}", json);
    }

    Ok(())
}
