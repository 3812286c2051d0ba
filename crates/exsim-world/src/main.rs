//! Market exchange simulator entry point.
//!
//! Runs a deterministic discrete-event simulation and writes the trade
//! tape and top-of-book series as CSV.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use exsim_core::types::OwnerId;
use exsim_engine::{MatchingEngine, RuleSet, RulesConfig};
use exsim_world::agents::{MarketMaker, MarketMakerParams, NoiseTrader, NoiseTraderConfig};
use exsim_world::output::{write_top_csv, write_trades_csv};
use exsim_world::{World, WorldConfig};

/// Deterministic market exchange simulator
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(version = "0.1.0")]
#[command(about = "Deterministic market exchange simulator", long_about = None)]
struct Args {
    /// Random seed for the run
    #[arg(default_value_t = 1)]
    seed: u64,

    /// Simulated horizon in seconds
    #[arg(default_value_t = 2.0)]
    horizon_seconds: f64,

    /// Trades output path
    #[arg(long, default_value = "trades.csv")]
    trades_out: String,

    /// Top-of-book output path
    #[arg(long, default_value = "top.csv")]
    top_out: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    tracing::info!(seed = args.seed, horizon_s = args.horizon_seconds, "starting simulation");

    let rules = RulesConfig::default();
    let engine = MatchingEngine::new(RuleSet::new(rules));

    let mut world = World::new(engine);
    world.add_agent(Box::new(NoiseTrader::new(
        OwnerId::new(1),
        NoiseTraderConfig::default(),
        rules,
    )));
    world.add_agent(Box::new(MarketMaker::new(
        OwnerId::new(2),
        MarketMakerParams::default(),
        rules,
    )));

    let result = world.run(args.seed, args.horizon_seconds, WorldConfig::default());

    write_trades_csv(&args.trades_out, &result.trades)?;
    write_top_csv(&args.top_out, &result.tops)?;

    tracing::info!(
        trades = result.trades.len(),
        tops = result.tops.len(),
        accounts = result.accounts.len(),
        cancel_failures = result.cancel_failures,
        modify_failures = result.modify_failures,
        "simulation complete"
    );

    Ok(())
}
