//! Pool engine state machine
//!
//! `PoolEngine` owns every piece of mutable ledger state and applies each
//! operation as an all-or-nothing transition: validation and window/accrual
//! computation run first, then external adapter calls, then the state
//! commit. A rejection returns before anything observable changes.
//!
//! Reward accrual is settled (`RewardAccumulator::settle`) strictly before
//! any principal change in the same operation.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use risk_controls::{BreakerConfig, BreakerStatus, TransferBreaker};

use crate::adapters::{TokenTransfer, YieldSource};
use crate::config::PoolConfig;
use crate::math;
use crate::registry::StakeRegistry;
use crate::rewards::RewardAccumulator;
use crate::splits::SplitPolicy;
use crate::types::{AccountId, Amount, HarvestReport, PoolStats, Position, YieldSplit};
use crate::{Error, Result};

/// Serializable engine state: the complete ledger snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolState {
    /// Depositor principals and harvest claimables
    pub registry: StakeRegistry,

    /// Emission reward stream
    pub emissions: RewardAccumulator,

    /// Default and per-depositor splits
    pub splits: SplitPolicy,

    /// Volume circuit breaker for this pool
    pub breaker: TransferBreaker,

    /// Global pause switch
    pub paused: bool,

    /// Funding not yet committed to an emission epoch
    pub reward_reserve: Amount,

    /// Funding committed to epochs, drawn down by claims
    pub emission_pot: Amount,

    /// Flooring remainder carried into the next harvest
    pub dust_carry: Amount,

    /// Lifetime raw yield pulled from the source
    pub total_yield_harvested: Amount,

    /// Lifetime value distributed across cause/depositors/platform
    pub total_yield_distributed: Amount,
}

/// The pool engine: state plus adapter seams.
pub struct PoolEngine {
    state: PoolState,
    owner: AccountId,
    beneficiary: AccountId,
    platform: AccountId,
    source: Box<dyn YieldSource>,
    token: Box<dyn TokenTransfer>,
}

impl PoolEngine {
    /// Create a fresh engine from configuration.
    pub fn new(
        config: &PoolConfig,
        source: Box<dyn YieldSource>,
        token: Box<dyn TokenTransfer>,
        now: u64,
    ) -> Result<Self> {
        let state = PoolState {
            registry: StakeRegistry::new(),
            emissions: RewardAccumulator::new(config.reward_duration_secs),
            splits: SplitPolicy::new(config.default_split)?,
            breaker: TransferBreaker::new(config.breaker, now)
                .map_err(|e| Error::Config(e.to_string()))?,
            paused: false,
            reward_reserve: 0,
            emission_pot: 0,
            dust_carry: 0,
            total_yield_harvested: 0,
            total_yield_distributed: 0,
        };
        Ok(Self::restore(config, state, source, token))
    }

    /// Rebuild an engine around a previously committed snapshot.
    pub fn restore(
        config: &PoolConfig,
        state: PoolState,
        source: Box<dyn YieldSource>,
        token: Box<dyn TokenTransfer>,
    ) -> Self {
        Self {
            state,
            owner: config.owner.clone(),
            beneficiary: config.beneficiary.clone(),
            platform: config.platform.clone(),
            source,
            token,
        }
    }

    /// The current snapshot, for persistence after a commit.
    pub fn state(&self) -> &PoolState {
        &self.state
    }

    // Depositor operations

    /// Deposit principal for `depositor` and supply it to the yield source.
    pub fn deposit(&mut self, depositor: &AccountId, amount: Amount, now: u64) -> Result<()> {
        self.ensure_active()?;
        if depositor.is_zero() {
            return Err(Error::ZeroAddress("depositor".to_string()));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount("deposit of zero".to_string()));
        }

        let window = match self.state.breaker.check(amount, now) {
            Ok(window) => window,
            Err(e) => {
                self.state.breaker.note_trip();
                return Err(e.into());
            }
        };

        // Pre-validate the balance arithmetic so the commit cannot fail
        // after the external call.
        let principal = self.state.registry.principal_of(depositor);
        math::add(principal, amount, "depositor principal")?;
        math::add(self.state.registry.total_principal(), amount, "total principal")?;

        // Settle accrual strictly before the principal change
        self.state
            .emissions
            .update(self.state.registry.total_principal(), now)?;
        self.state.emissions.settle(depositor, principal)?;

        self.source.supply(amount)?;

        self.state.registry.deposit(depositor, amount)?;
        self.state.breaker.commit(window);

        info!(%depositor, amount, "deposit committed");
        Ok(())
    }

    /// Withdraw principal for `depositor`, pulling it back from the source.
    pub fn withdraw(&mut self, depositor: &AccountId, amount: Amount, now: u64) -> Result<()> {
        self.ensure_active()?;
        if amount == 0 {
            return Err(Error::InvalidAmount("withdrawal of zero".to_string()));
        }

        let principal = self.state.registry.principal_of(depositor);
        if amount > principal {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available: principal,
            });
        }

        let window = match self.state.breaker.check(amount, now) {
            Ok(window) => window,
            Err(e) => {
                self.state.breaker.note_trip();
                return Err(e.into());
            }
        };

        self.state
            .emissions
            .update(self.state.registry.total_principal(), now)?;
        self.state.emissions.settle(depositor, principal)?;

        self.source.withdraw(amount)?;
        self.token.transfer(depositor, amount)?;

        self.state.registry.withdraw(depositor, amount)?;
        self.state.breaker.commit(window);

        info!(%depositor, amount, "withdrawal committed");
        Ok(())
    }

    /// Claim all pending rewards for `depositor`: settled emission accrual
    /// plus harvest-credited yield.
    ///
    /// A claim with nothing pending is a no-op returning zero, so schedulers
    /// may call it blindly.
    pub fn claim(&mut self, depositor: &AccountId, now: u64) -> Result<Amount> {
        self.ensure_active()?;

        let principal = self.state.registry.principal_of(depositor);
        self.state
            .emissions
            .update(self.state.registry.total_principal(), now)?;
        self.state.emissions.settle(depositor, principal)?;

        let emission_part = self.state.emissions.accrued(depositor);
        let harvest_part = self.state.registry.claimable_of(depositor);
        let total = math::add(emission_part, harvest_part, "claim total")?;
        if total == 0 {
            return Ok(0);
        }

        // Every emitted unit was moved into the pot at notify time
        let pot_after = math::sub(self.state.emission_pot, emission_part)?;

        self.token.transfer(depositor, total)?;

        self.state.emissions.take_accrued(depositor);
        self.state.registry.take_claimable(depositor);
        self.state.emission_pot = pot_after;

        info!(%depositor, amount = total, "claim committed");
        Ok(total)
    }

    /// Claim like [`claim`](Self::claim), but reject with `NoClaimable`
    /// when nothing is pending, for callers that treat an empty claim as
    /// an error rather than a no-op.
    pub fn claim_strict(&mut self, depositor: &AccountId, now: u64) -> Result<Amount> {
        match self.claim(depositor, now)? {
            0 => Err(Error::NoClaimable),
            amount => Ok(amount),
        }
    }

    // Harvest & distribution

    /// Pull all pending yield from the source and distribute it.
    ///
    /// Each active depositor is attributed `raw * principal / total` (floor)
    /// and their effective split applied: cause and platform portions are
    /// transferred out immediately, the depositor portion is credited to
    /// their claimable balance. Flooring dust is carried into the next
    /// harvest. Zero pending yield is a no-op, not an error.
    pub fn harvest_and_distribute(&mut self, _now: u64) -> Result<HarvestReport> {
        self.ensure_active()?;

        let pulled = self.source.pending_yield()?;
        let raw = math::add(pulled, self.state.dust_carry, "harvest raw")?;
        if raw == 0 {
            debug!("harvest: nothing pending");
            return Ok(HarvestReport::default());
        }

        let total_principal = self.state.registry.total_principal();

        // Compute phase: attribution and splits, no mutation yet
        let mut credits: Vec<(AccountId, Amount)> = Vec::new();
        let mut cause_total: Amount = 0;
        let mut depositor_total: Amount = 0;
        let mut platform_total: Amount = 0;

        if total_principal > 0 {
            for (account, principal) in self.state.registry.iter_active() {
                let attributed = math::mul_div(raw, principal, total_principal)?;
                let portions = self.state.splits.effective(account).apply(attributed)?;

                cause_total = math::add(cause_total, portions.cause, "cause total")?;
                depositor_total =
                    math::add(depositor_total, portions.depositor, "depositor total")?;
                platform_total =
                    math::add(platform_total, portions.platform, "platform total")?;

                if portions.depositor > 0 {
                    credits.push((account.clone(), portions.depositor));
                }
            }
        }

        let distributed = cause_total + depositor_total + platform_total;
        let dust = raw - distributed;

        // Side effects
        if pulled > 0 {
            self.source.withdraw(pulled)?;
        }
        if cause_total > 0 {
            self.token.transfer(&self.beneficiary, cause_total)?;
        }
        if platform_total > 0 {
            self.token.transfer(&self.platform, platform_total)?;
        }

        // Commit
        let credited = credits.len();
        for (account, amount) in credits {
            self.state.registry.credit_yield(&account, amount)?;
        }
        self.state.dust_carry = dust;
        self.state.total_yield_harvested =
            math::add(self.state.total_yield_harvested, pulled, "harvest lifetime")?;
        self.state.total_yield_distributed = math::add(
            self.state.total_yield_distributed,
            distributed,
            "distribution lifetime",
        )?;

        info!(
            raw,
            cause = cause_total,
            depositors = depositor_total,
            platform = platform_total,
            dust,
            "harvest distributed"
        );

        Ok(HarvestReport {
            raw,
            cause: cause_total,
            depositors: depositor_total,
            platform: platform_total,
            dust,
            credited,
        })
    }

    // Split management

    /// Set the caller's split override. Requires live principal.
    pub fn set_split(&mut self, depositor: &AccountId, split: YieldSplit) -> Result<()> {
        self.ensure_active()?;
        let principal = self.state.registry.principal_of(depositor);
        self.state.splits.set_override(depositor, split, principal)
    }

    /// Clear the caller's split override, reverting to the default.
    pub fn reset_split(&mut self, depositor: &AccountId) -> Result<()> {
        self.ensure_active()?;
        self.state.splits.clear_override(depositor);
        Ok(())
    }

    /// Replace the policy default split. Owner only; never rewrites
    /// existing overrides.
    pub fn set_default_split(&mut self, caller: &AccountId, split: YieldSplit) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state.splits.set_default(split)
    }

    // Emission management

    /// Grow the emission funding reserve. Owner only; the backing tokens are
    /// expected to sit in the pool's custody already.
    pub fn fund_rewards(&mut self, caller: &AccountId, amount: Amount) -> Result<()> {
        self.ensure_owner(caller)?;
        if amount == 0 {
            return Err(Error::InvalidAmount("funding of zero".to_string()));
        }
        self.state.reward_reserve = math::add(self.state.reward_reserve, amount, "reward reserve")?;
        Ok(())
    }

    /// Start a new emission epoch. Owner only; rejected mid-epoch and
    /// rejected when the reserve cannot back the full epoch.
    pub fn notify_reward_amount(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        now: u64,
    ) -> Result<Amount> {
        self.ensure_owner(caller)?;

        // Fold pending accrual forward before the rate changes
        self.state
            .emissions
            .update(self.state.registry.total_principal(), now)?;

        let rate =
            self.state
                .emissions
                .notify_reward_amount(amount, self.state.reward_reserve, now)?;

        // Move the committed epoch funding out of the reserve
        let committed = math::mul_div(rate, self.state.emissions.duration() as u128, 1)?;
        self.state.reward_reserve = math::sub(self.state.reward_reserve, committed)?;
        self.state.emission_pot = math::add(self.state.emission_pot, committed, "emission pot")?;

        info!(amount, rate, "emission epoch started");
        Ok(rate)
    }

    // Admin surface

    /// Activate the global pause switch. Owner only; idempotent.
    pub fn pause(&mut self, caller: &AccountId) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state.paused = true;
        info!("pool paused");
        Ok(())
    }

    /// Clear the global pause switch. Owner only; idempotent.
    pub fn unpause(&mut self, caller: &AccountId) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state.paused = false;
        info!("pool unpaused");
        Ok(())
    }

    /// Replace the circuit breaker caps. Owner only.
    pub fn update_breaker_limits(
        &mut self,
        caller: &AccountId,
        config: BreakerConfig,
    ) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state
            .breaker
            .update_limits(config)
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Reset the circuit breaker windows and diagnostic flag. Owner only;
    /// idempotent.
    pub fn reset_breaker(&mut self, caller: &AccountId, now: u64) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state.breaker.reset(now);
        Ok(())
    }

    /// Current breaker caps and headroom.
    pub fn breaker_status(&self, now: u64) -> BreakerStatus {
        self.state.breaker.status(now)
    }

    /// Transfer unrelated assets accidentally sent to the pool. Owner only;
    /// operates on a foreign token adapter and never touches ledger state.
    pub fn rescue(
        &self,
        caller: &AccountId,
        foreign: &mut dyn TokenTransfer,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_owner(caller)?;
        if to.is_zero() {
            return Err(Error::ZeroAddress("rescue recipient".to_string()));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount("rescue of zero".to_string()));
        }
        foreign.transfer(to, amount)
    }

    // Views

    /// A depositor's position at `now`.
    pub fn position(&self, depositor: &AccountId, now: u64) -> Result<Position> {
        let principal = self.state.registry.principal_of(depositor);
        let emission = self.state.emissions.earned(
            depositor,
            principal,
            self.state.registry.total_principal(),
            now,
        )?;
        let claimable = math::add(
            emission,
            self.state.registry.claimable_of(depositor),
            "claimable view",
        )?;

        Ok(Position {
            account: depositor.clone(),
            principal,
            claimable,
            split: self.state.splits.effective(depositor),
        })
    }

    /// Pool-wide totals.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_principal: self.state.registry.total_principal(),
            depositor_count: self.state.registry.depositor_count(),
            total_yield_harvested: self.state.total_yield_harvested,
            total_yield_distributed: self.state.total_yield_distributed,
            reward_reserve: self.state.reward_reserve,
            dust_carry: self.state.dust_carry,
            paused: self.state.paused,
        }
    }

    /// Verify the principal conservation invariant.
    pub fn check_conservation(&self) -> bool {
        self.state.registry.check_conservation()
    }

    // Internal helpers

    fn ensure_active(&self) -> Result<()> {
        if self.state.paused {
            return Err(Error::Paused);
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: &AccountId) -> Result<()> {
        if caller != &self.owner {
            return Err(Error::Unauthorized(format!(
                "{} is not the pool owner",
                caller
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockToken, MockYieldSource};

    fn owner() -> AccountId {
        // Matches PoolConfig::default()
        AccountId::new("pool-admin")
    }

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn bob() -> AccountId {
        AccountId::new("bob")
    }

    fn test_engine() -> PoolEngine {
        let config = PoolConfig::default();
        PoolEngine::new(
            &config,
            Box::new(MockYieldSource::new()),
            Box::new(MockToken::new()),
            0,
        )
        .unwrap()
    }

    fn funded_engine(custody: Amount) -> PoolEngine {
        let config = PoolConfig::default();
        let mut token = MockToken::new();
        token.fund_custody(custody);
        PoolEngine::new(
            &config,
            Box::new(MockYieldSource::new()),
            Box::new(token),
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_deposit_withdraw_conservation() {
        let mut engine = funded_engine(10_000);
        engine.deposit(&alice(), 1_000, 0).unwrap();
        engine.deposit(&bob(), 2_000, 0).unwrap();
        engine.withdraw(&alice(), 400, 1).unwrap();

        assert_eq!(engine.stats().total_principal, 2_600);
        assert!(engine.check_conservation());
    }

    #[test]
    fn test_deposit_rejects_zero_and_zero_address() {
        let mut engine = test_engine();
        assert!(matches!(
            engine.deposit(&alice(), 0, 0),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.deposit(&AccountId::new(""), 10, 0),
            Err(Error::ZeroAddress(_))
        ));
    }

    #[test]
    fn test_withdraw_exceeding_principal() {
        let mut engine = funded_engine(10_000);
        engine.deposit(&alice(), 1_000, 0).unwrap();
        engine.deposit(&bob(), 5_000, 0).unwrap();

        let err = engine.withdraw(&alice(), 1_001, 1).unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance { .. }));
        assert!(engine.check_conservation());
    }

    #[test]
    fn test_breaker_gates_transfers() {
        let mut config = PoolConfig::default();
        config.breaker = BreakerConfig {
            max_single_tx: 1_000,
            max_hourly_volume: 1_500,
            max_daily_volume: 5_000,
        };
        let mut engine = PoolEngine::new(
            &config,
            Box::new(MockYieldSource::new()),
            Box::new(MockToken::new()),
            0,
        )
        .unwrap();

        assert!(matches!(
            engine.deposit(&alice(), 1_001, 0),
            Err(Error::CircuitBreakerTripped(_))
        ));

        engine.deposit(&alice(), 1_000, 0).unwrap();
        assert!(matches!(
            engine.deposit(&alice(), 501, 10),
            Err(Error::CircuitBreakerTripped(_))
        ));

        // Rejection is visible in diagnostics, but nothing was committed
        assert!(engine.breaker_status(10).tripped);
        assert_eq!(engine.stats().total_principal, 1_000);
    }

    #[test]
    fn test_paused_rejects_uniformly() {
        let mut engine = funded_engine(10_000);
        engine.deposit(&alice(), 1_000, 0).unwrap();
        engine.pause(&owner()).unwrap();

        assert!(matches!(engine.deposit(&alice(), 1, 1), Err(Error::Paused)));
        assert!(matches!(engine.withdraw(&alice(), 1, 1), Err(Error::Paused)));
        assert!(matches!(engine.claim(&alice(), 1), Err(Error::Paused)));
        assert!(matches!(
            engine.harvest_and_distribute(1),
            Err(Error::Paused)
        ));
        assert!(matches!(
            engine.set_split(&alice(), YieldSplit::new(5_000, 4_800, 200).unwrap()),
            Err(Error::Paused)
        ));

        engine.unpause(&owner()).unwrap();
        assert!(engine.deposit(&alice(), 1, 1).is_ok());
    }

    #[test]
    fn test_pause_requires_owner() {
        let mut engine = test_engine();
        assert!(matches!(engine.pause(&alice()), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_split_override_persists_across_full_exit() {
        let mut engine = funded_engine(10_000);
        let custom = YieldSplit::new(5_000, 4_800, 200).unwrap();

        // No stake: nothing to configure
        assert!(matches!(
            engine.set_split(&alice(), custom),
            Err(Error::NoStakeToConfigure)
        ));

        engine.deposit(&alice(), 1_000, 0).unwrap();
        engine.set_split(&alice(), custom).unwrap();

        // Full exit and redeposit: the override is depositor-scoped
        engine.withdraw(&alice(), 1_000, 1).unwrap();
        engine.deposit(&alice(), 500, 2).unwrap();
        assert_eq!(engine.position(&alice(), 2).unwrap().split, custom);

        engine.reset_split(&alice()).unwrap();
        assert_eq!(
            engine.position(&alice(), 2).unwrap().split,
            PoolConfig::default().default_split
        );
    }

    #[test]
    fn test_harvest_zero_yield_is_noop() {
        let mut engine = test_engine();
        let report = engine.harvest_and_distribute(0).unwrap();
        assert_eq!(report, HarvestReport::default());
    }

    #[test]
    fn test_harvest_with_no_depositors_parks_dust() {
        let config = PoolConfig::default();
        let mut source = MockYieldSource::new();
        source.accrue(500);
        let mut token = MockToken::new();
        token.fund_custody(500);
        let mut engine =
            PoolEngine::new(&config, Box::new(source), Box::new(token), 0).unwrap();

        let report = engine.harvest_and_distribute(0).unwrap();
        assert_eq!(report.raw, 500);
        assert_eq!(report.dust, 500);
        assert_eq!(report.cause + report.depositors + report.platform, 0);
        assert_eq!(engine.stats().dust_carry, 500);
    }

    #[test]
    fn test_harvest_applies_effective_splits() {
        let config = PoolConfig::default();
        let mut source = MockYieldSource::new();
        source.accrue(2_000);
        let mut token = MockToken::new();
        token.fund_custody(100_000);
        let mut engine =
            PoolEngine::new(&config, Box::new(source), Box::new(token), 0).unwrap();

        engine.deposit(&alice(), 1_000, 0).unwrap();
        engine.deposit(&bob(), 1_000, 0).unwrap();
        engine
            .set_split(&bob(), YieldSplit::new(5_000, 4_800, 200).unwrap())
            .unwrap();

        // 2000 raw, 1000 attributed each; alice on the default 79/19/2,
        // bob on 50/48/2
        let report = engine.harvest_and_distribute(10).unwrap();
        assert_eq!(report.raw, 2_000);
        assert_eq!(report.cause, 790 + 500);
        assert_eq!(report.depositors, 190 + 480);
        assert_eq!(report.platform, 20 + 20);
        assert_eq!(report.dust, 0);
        assert_eq!(report.credited, 2);

        assert_eq!(engine.position(&alice(), 10).unwrap().claimable, 190);
        assert_eq!(engine.position(&bob(), 10).unwrap().claimable, 480);

        // Claims drain exactly the credited portions
        assert_eq!(engine.claim(&alice(), 11).unwrap(), 190);
        assert_eq!(engine.claim(&alice(), 12).unwrap(), 0);
    }

    #[test]
    fn test_emission_lifecycle() {
        let mut config = PoolConfig::default();
        config.reward_duration_secs = 100;
        let mut token = MockToken::new();
        token.fund_custody(100_000);
        let mut engine = PoolEngine::new(
            &config,
            Box::new(MockYieldSource::new()),
            Box::new(token),
            0,
        )
        .unwrap();

        engine.deposit(&alice(), 1_000, 0).unwrap();

        // Cannot notify without backing
        assert!(matches!(
            engine.notify_reward_amount(&owner(), 1_000, 0),
            Err(Error::InsufficientBalance { .. })
        ));

        engine.fund_rewards(&owner(), 1_000).unwrap();
        engine.notify_reward_amount(&owner(), 1_000, 0).unwrap();
        assert_eq!(engine.stats().reward_reserve, 0);

        // Mid-epoch re-notification rejected
        engine.fund_rewards(&owner(), 1_000).unwrap();
        assert!(matches!(
            engine.notify_reward_amount(&owner(), 1_000, 50),
            Err(Error::PeriodNotFinished { .. })
        ));

        // Full epoch accrues to the sole depositor
        let claimed = engine.claim(&alice(), 100).unwrap();
        assert_eq!(claimed, 1_000);

        // Nothing further pending: no-op, not an error
        assert_eq!(engine.claim(&alice(), 101).unwrap(), 0);

        // Strict callers get the explicit signal instead
        assert!(matches!(
            engine.claim_strict(&alice(), 102),
            Err(Error::NoClaimable)
        ));
    }

    #[test]
    fn test_notify_requires_owner() {
        let mut engine = test_engine();
        assert!(matches!(
            engine.notify_reward_amount(&alice(), 1_000, 0),
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(
            engine.fund_rewards(&alice(), 1_000),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rescue_owner_only() {
        let engine = test_engine();
        let mut stray = MockToken::new();
        stray.fund_custody(77);

        assert!(matches!(
            engine.rescue(&alice(), &mut stray, &bob(), 77),
            Err(Error::Unauthorized(_))
        ));

        engine.rescue(&owner(), &mut stray, &bob(), 77).unwrap();
        assert_eq!(stray.balance_of(&bob()).unwrap(), 77);
    }
}
