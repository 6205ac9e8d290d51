//! End-to-end distribution scenarios against the engine and the async pool.

use pool_core::adapters::mock::{MockToken, MockYieldSource};
use pool_core::{AccountId, PoolConfig, PoolEngine, YieldSplit};

fn account(name: &str) -> AccountId {
    AccountId::new(name)
}

fn engine_with(yield_pending: u128, custody: u128) -> PoolEngine {
    let config = PoolConfig::default();
    let mut source = MockYieldSource::new();
    source.accrue(yield_pending);
    let mut token = MockToken::new();
    token.fund_custody(custody);
    PoolEngine::new(&config, Box::new(source), Box::new(token), 0).unwrap()
}

#[test]
fn three_stakers_proportional_distribution() {
    // Three stakers deposit 1000/2000/3000; a 6000 yield event lands on the
    // default 79/19/2 split.
    let mut engine = engine_with(6_000, 100_000);

    engine.deposit(&account("staker-1"), 1_000, 0).unwrap();
    engine.deposit(&account("staker-2"), 2_000, 0).unwrap();
    engine.deposit(&account("staker-3"), 3_000, 0).unwrap();

    let report = engine.harvest_and_distribute(100).unwrap();

    assert_eq!(report.raw, 6_000);
    assert_eq!(report.cause, 4_740); // 79% of 6000
    assert_eq!(report.depositors, 1_140); // 19% of 6000
    assert_eq!(report.platform, 120); // 2% of 6000
    assert_eq!(report.cause + report.depositors + report.platform + report.dust, 6_000);

    // Staker shares land 1:2:3
    assert_eq!(
        engine.position(&account("staker-1"), 100).unwrap().claimable,
        190
    );
    assert_eq!(
        engine.position(&account("staker-2"), 100).unwrap().claimable,
        380
    );
    assert_eq!(
        engine.position(&account("staker-3"), 100).unwrap().claimable,
        570
    );
}

#[test]
fn per_depositor_splits_diverge() {
    // Equal principal, splits (79/19/2) and (50/48/2): claimables track the
    // depositor share of each split.
    let mut engine = engine_with(6_000, 100_000);

    engine.deposit(&account("alpha"), 1_000, 0).unwrap();
    engine.deposit(&account("beta"), 1_000, 0).unwrap();
    engine
        .set_split(&account("beta"), YieldSplit::new(5_000, 4_800, 200).unwrap())
        .unwrap();

    engine.harvest_and_distribute(50).unwrap();

    // Each attributed 3000
    assert_eq!(
        engine.position(&account("alpha"), 50).unwrap().claimable,
        570 // 19% of 3000
    );
    assert_eq!(
        engine.position(&account("beta"), 50).unwrap().claimable,
        1_440 // 48% of 3000
    );
}

#[test]
fn claims_across_multiple_harvests_accumulate() {
    let config = PoolConfig::default();
    let mut source = MockYieldSource::new();
    source.accrue(1_000);
    let mut token = MockToken::new();
    token.fund_custody(100_000);
    let mut engine = PoolEngine::new(&config, Box::new(source), Box::new(token), 0).unwrap();

    engine.deposit(&account("solo"), 500, 0).unwrap();

    engine.harvest_and_distribute(10).unwrap();
    // 19% of 1000
    assert_eq!(engine.position(&account("solo"), 10).unwrap().claimable, 190);

    let claimed = engine.claim(&account("solo"), 20).unwrap();
    assert_eq!(claimed, 190);
    assert_eq!(engine.claim(&account("solo"), 21).unwrap(), 0);
}

#[test]
fn dust_carries_into_next_harvest() {
    // 100 raw over 3 equal stakes attributes 33 each, leaving 1 unit of
    // attribution dust plus split flooring dust; nothing is lost.
    let mut engine = engine_with(100, 100_000);

    engine.deposit(&account("a"), 1, 0).unwrap();
    engine.deposit(&account("b"), 1, 0).unwrap();
    engine.deposit(&account("c"), 1, 0).unwrap();

    let report = engine.harvest_and_distribute(10).unwrap();
    assert_eq!(report.raw, 100);
    let distributed = report.cause + report.depositors + report.platform;
    assert!(distributed <= 100);
    assert_eq!(report.dust, 100 - distributed);
    assert_eq!(engine.stats().dust_carry, report.dust);

    // The carried dust is part of the next harvest's raw amount
    let report2 = engine.harvest_and_distribute(20).unwrap();
    assert_eq!(report2.raw, report.dust);
}

#[test]
fn distribution_never_exceeds_harvest() {
    let mut engine = engine_with(7_777, 100_000);

    engine.deposit(&account("x"), 37, 0).unwrap();
    engine.deposit(&account("y"), 911, 0).unwrap();
    engine.deposit(&account("z"), 5, 0).unwrap();

    let report = engine.harvest_and_distribute(10).unwrap();
    assert!(report.cause + report.depositors + report.platform <= report.raw);
    assert_eq!(
        report.cause + report.depositors + report.platform + report.dust,
        report.raw
    );
}

mod async_pool {
    use super::*;
    use pool_core::{AuditKind, Pool};
    use tempfile::TempDir;

    fn pool_config(dir: &TempDir) -> PoolConfig {
        let mut config = PoolConfig::default();
        config.data_dir = dir.path().to_path_buf();
        config
    }

    #[tokio::test]
    async fn deposit_claim_via_handle() {
        let temp = TempDir::new().unwrap();
        let mut source = MockYieldSource::new();
        source.accrue(1_000);
        let mut token = MockToken::new();
        token.fund_custody(10_000);

        let pool = Pool::open(pool_config(&temp), Box::new(source), Box::new(token)).unwrap();

        pool.deposit(AccountId::new("alice"), 400).await.unwrap();
        let report = pool.harvest_and_distribute().await.unwrap();
        assert_eq!(report.raw, 1_000);

        let claimed = pool.claim(AccountId::new("alice")).await.unwrap();
        assert_eq!(claimed, 190);

        let stats = pool.stats().await.unwrap();
        assert_eq!(stats.total_principal, 400);

        let audit = pool.audit_log().unwrap();
        assert_eq!(audit.len(), 3);
        let kinds: Vec<_> = audit.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&AuditKind::Deposit));
        assert!(kinds.contains(&AuditKind::Harvest));
        assert!(kinds.contains(&AuditKind::Claim));

        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let config = pool_config(&temp);

        {
            let mut token = MockToken::new();
            token.fund_custody(10_000);
            let pool = Pool::open(
                config.clone(),
                Box::new(MockYieldSource::new()),
                Box::new(token),
            )
            .unwrap();
            pool.deposit(AccountId::new("alice"), 750).await.unwrap();
            pool.shutdown().await.unwrap();
        }

        // Reopen restores the committed principal
        let pool = Pool::open(
            config,
            Box::new(MockYieldSource::new()),
            Box::new(MockToken::new()),
        )
        .unwrap();
        let position = pool.position(AccountId::new("alice")).await.unwrap();
        assert_eq!(position.principal, 750);
        assert!(pool.stats().await.unwrap().total_principal == 750);

        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn rejected_operation_leaves_no_trace() {
        let temp = TempDir::new().unwrap();
        let pool = Pool::open(
            pool_config(&temp),
            Box::new(MockYieldSource::new()),
            Box::new(MockToken::new()),
        )
        .unwrap();

        pool.deposit(AccountId::new("alice"), 100).await.unwrap();
        assert!(pool
            .withdraw(AccountId::new("alice"), 200)
            .await
            .is_err());

        // The rejection produced no audit record and no state change
        let audit = pool.audit_log().unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(pool.stats().await.unwrap().total_principal, 100);

        pool.shutdown().await.unwrap();
    }
}
