//! Walkthrough of a pool lifecycle against the in-memory mock adapters:
//! three depositors stake, yield accrues, a harvest splits it, and everyone
//! claims.
//!
//! Run with: `cargo run --example pool_demo`

use anyhow::Result;
use pool_core::adapters::mock::{MockToken, MockYieldSource};
use pool_core::{AccountId, PoolConfig, PoolEngine, YieldSplit};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = PoolConfig::default();

    let mut source = MockYieldSource::new();
    source.accrue(6_000);
    let mut token = MockToken::new();
    token.fund_custody(1_000_000);

    let mut engine = PoolEngine::new(&config, Box::new(source), Box::new(token), 0)?;

    let stakers = [
        (AccountId::new("staker-1"), 1_000u128),
        (AccountId::new("staker-2"), 2_000),
        (AccountId::new("staker-3"), 3_000),
    ];
    for (account, amount) in &stakers {
        engine.deposit(account, *amount, 0)?;
    }

    // staker-2 redirects more of their yield to themselves
    engine.set_split(&stakers[1].0, YieldSplit::new(5_000, 4_800, 200)?)?;

    let report = engine.harvest_and_distribute(3_600)?;
    println!(
        "harvested {} -> cause {}, depositors {}, platform {}, dust {}",
        report.raw, report.cause, report.depositors, report.platform, report.dust
    );

    for (account, _) in &stakers {
        let claimed = engine.claim(account, 3_700)?;
        println!("{} claimed {}", account, claimed);
    }

    let stats = engine.stats();
    println!(
        "total principal {}, lifetime distributed {}",
        stats.total_principal, stats.total_yield_distributed
    );

    Ok(())
}
