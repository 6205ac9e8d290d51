//! Fee treasury engine
//!
//! Fees arrive from allow-listed senders, accumulate until the stake
//! threshold is crossed, then deploy in one shot: a majority share stays
//! withdrawable as operational funds, the minority becomes endowment
//! principal supplied to the yield source. Endowment principal has no
//! withdrawal path; only its yield moves, harvested on demand and routed to
//! platform stakers through the shared reward accumulator.
//!
//! Operations follow the pool engine's atomic discipline: validate, compute,
//! external side effects, then state commit.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use pool_core::adapters::{TokenTransfer, YieldSource};
use pool_core::math;
use pool_core::types::{AccountId, Amount};
use pool_core::RewardAccumulator;
use risk_controls::{BreakerConfig, BreakerStatus, TransferBreaker};

use crate::config::TreasuryConfig;
use crate::{Error, Result};

/// Treasury balance sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryLedger {
    /// Lifetime fees received
    pub total_fees_collected: Amount,

    /// Fees waiting to cross the stake threshold
    pub pending_fees_to_stake: Amount,

    /// Lifetime fees deployed through `stake_fees`
    pub total_fees_staked: Amount,

    /// Withdrawable operational funds
    pub operational_funds: Amount,

    /// Endowment principal supplied to the yield source; never withdrawable
    pub endowment_principal: Amount,

    /// Lifetime endowment yield harvested and routed
    pub total_yield_distributed: Amount,
}

/// Serializable treasury state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryState {
    ledger: TreasuryLedger,
    allowed_senders: BTreeSet<AccountId>,
    staker_rewards: RewardAccumulator,
    stakes: BTreeMap<AccountId, Amount>,
    total_staked: Amount,
    breaker: TransferBreaker,
    paused: bool,
    min_stake_threshold: Amount,
}

/// Outcome of an endowment yield harvest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YieldHarvest {
    /// Yield withdrawn from the endowment
    pub harvested: Amount,

    /// Portion retained as operational funds (including routing dust)
    pub retained: Amount,

    /// Portion credited to platform stakers
    pub to_stakers: Amount,
}

/// The fee treasury engine
pub struct FeeTreasury {
    state: TreasuryState,
    config: TreasuryConfig,
    endowment: Box<dyn YieldSource>,
    token: Box<dyn TokenTransfer>,
}

impl FeeTreasury {
    /// Create a fresh treasury from configuration.
    pub fn new(
        config: TreasuryConfig,
        endowment: Box<dyn YieldSource>,
        token: Box<dyn TokenTransfer>,
        now: u64,
    ) -> Result<Self> {
        config.validate()?;
        let state = TreasuryState {
            ledger: TreasuryLedger::default(),
            allowed_senders: BTreeSet::new(),
            staker_rewards: RewardAccumulator::new(config.reward_duration_secs),
            stakes: BTreeMap::new(),
            total_staked: 0,
            breaker: TransferBreaker::new(config.breaker, now)
                .map_err(|e| Error::Config(e.to_string()))?,
            paused: false,
            min_stake_threshold: config.min_stake_threshold,
        };
        Ok(Self {
            state,
            config,
            endowment,
            token,
        })
    }

    /// Rebuild a treasury around a previously committed snapshot.
    pub fn restore(
        config: TreasuryConfig,
        state: TreasuryState,
        endowment: Box<dyn YieldSource>,
        token: Box<dyn TokenTransfer>,
    ) -> Self {
        Self {
            state,
            config,
            endowment,
            token,
        }
    }

    /// The current snapshot, for persistence after a commit.
    pub fn state(&self) -> &TreasuryState {
        &self.state
    }

    // Fee intake

    /// Receive a fee from an allow-listed sender. Auto-stakes the pending
    /// balance once it reaches the threshold. Returns whether staking ran.
    pub fn receive_fee(&mut self, sender: &AccountId, amount: Amount, now: u64) -> Result<bool> {
        self.ensure_active()?;
        if !self.state.allowed_senders.contains(sender) {
            return Err(Error::Unauthorized(format!(
                "{} is not an authorized fee sender",
                sender
            )));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount("fee of zero".to_string()));
        }

        let window = match self.state.breaker.check(amount, now) {
            Ok(window) => window,
            Err(e) => {
                self.state.breaker.note_trip();
                return Err(e.into());
            }
        };

        let collected = math::add(
            self.state.ledger.total_fees_collected,
            amount,
            "fees collected",
        )?;
        let pending = math::add(
            self.state.ledger.pending_fees_to_stake,
            amount,
            "pending fees",
        )?;

        let staked = if pending >= self.state.min_stake_threshold {
            self.deploy_pending(pending)?;
            true
        } else {
            self.state.ledger.pending_fees_to_stake = pending;
            false
        };

        self.state.ledger.total_fees_collected = collected;
        self.state.breaker.commit(window);

        debug!(%sender, amount, staked, "fee received");
        Ok(staked)
    }

    /// Deploy the full pending fee balance. Rejects when nothing is pending.
    pub fn stake_fees(&mut self, _now: u64) -> Result<Amount> {
        self.ensure_active()?;
        let pending = self.state.ledger.pending_fees_to_stake;
        if pending == 0 {
            return Err(Error::NoPendingFees);
        }
        self.deploy_pending(pending)?;
        Ok(pending)
    }

    /// Split `pending` into operational and endowment shares, supply the
    /// endowment share, and commit the ledger movement. Consumes the entire
    /// pending balance.
    fn deploy_pending(&mut self, pending: Amount) -> Result<Amount> {
        let operational = math::bps_share(pending, self.config.operational_bps)?;
        let endowment_part = pending - operational;

        if endowment_part > 0 {
            self.endowment.supply(endowment_part)?;
        }

        self.state.ledger.operational_funds = math::add(
            self.state.ledger.operational_funds,
            operational,
            "operational funds",
        )?;
        self.state.ledger.endowment_principal = math::add(
            self.state.ledger.endowment_principal,
            endowment_part,
            "endowment principal",
        )?;
        self.state.ledger.total_fees_staked =
            math::add(self.state.ledger.total_fees_staked, pending, "fees staked")?;
        self.state.ledger.pending_fees_to_stake = 0;

        info!(pending, operational, endowment_part, "pending fees deployed");
        Ok(endowment_part)
    }

    // Yield harvesting

    /// Harvest accrued endowment yield. A fixed share is retained as
    /// operational funds; the remainder is credited to platform stakers, or
    /// folded into operational funds when nothing is staked.
    pub fn harvest_platform_yield(&mut self, _now: u64) -> Result<YieldHarvest> {
        self.ensure_active()?;

        let pending = self.endowment.pending_yield()?;
        if pending == 0 {
            return Err(Error::NoYieldAvailable);
        }

        let retained = math::bps_share(pending, self.config.retained_yield_bps)?;
        let remainder = pending - retained;

        self.endowment.withdraw(pending)?;

        let (to_stakers, into_operational) = if self.state.total_staked > 0 && remainder > 0 {
            let credited = self
                .state
                .staker_rewards
                .distribute(remainder, self.state.total_staked)?;
            // Flooring dust from the per-share division stays operational
            (credited, retained + (remainder - credited))
        } else {
            (0, retained + remainder)
        };

        self.state.ledger.operational_funds = math::add(
            self.state.ledger.operational_funds,
            into_operational,
            "operational funds",
        )?;
        self.state.ledger.total_yield_distributed = math::add(
            self.state.ledger.total_yield_distributed,
            pending,
            "yield distributed",
        )?;

        info!(
            harvested = pending,
            retained = into_operational,
            to_stakers,
            "platform yield harvested"
        );

        Ok(YieldHarvest {
            harvested: pending,
            retained: into_operational,
            to_stakers,
        })
    }

    // Platform staking

    /// Stake platform tokens; the staker participates in subsequent yield
    /// harvests pro rata.
    pub fn stake(&mut self, staker: &AccountId, amount: Amount) -> Result<()> {
        self.ensure_active()?;
        if staker.is_zero() {
            return Err(Error::ZeroAddress("staker".to_string()));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount("stake of zero".to_string()));
        }

        let staked = self.staked_of(staker);
        // Settle accrual before the share change
        self.state.staker_rewards.settle(staker, staked)?;

        self.state.stakes.insert(staker.clone(), math::add(staked, amount, "stake")?);
        self.state.total_staked = math::add(self.state.total_staked, amount, "total staked")?;
        Ok(())
    }

    /// Unstake platform tokens and transfer them back to the staker.
    pub fn unstake(&mut self, staker: &AccountId, amount: Amount) -> Result<()> {
        self.ensure_active()?;
        let staked = self.staked_of(staker);
        if amount == 0 {
            return Err(Error::InvalidAmount("unstake of zero".to_string()));
        }
        if amount > staked {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available: staked,
            });
        }

        self.state.staker_rewards.settle(staker, staked)?;

        self.token.transfer(staker, amount)?;

        let remaining = staked - amount;
        if remaining == 0 {
            self.state.stakes.remove(staker);
        } else {
            self.state.stakes.insert(staker.clone(), remaining);
        }
        self.state.total_staked -= amount;
        Ok(())
    }

    /// Claim accrued staker rewards. Nothing pending is a no-op returning
    /// zero.
    pub fn claim_rewards(&mut self, staker: &AccountId) -> Result<Amount> {
        self.ensure_active()?;
        let staked = self.staked_of(staker);
        self.state.staker_rewards.settle(staker, staked)?;

        let pending = self.state.staker_rewards.accrued(staker);
        if pending == 0 {
            return Ok(0);
        }

        self.token.transfer(staker, pending)?;
        self.state.staker_rewards.take_accrued(staker);

        info!(%staker, amount = pending, "staker rewards claimed");
        Ok(pending)
    }

    // Administration

    /// Add a sender to the fee allow-list. Owner only.
    pub fn authorize_sender(&mut self, caller: &AccountId, sender: &AccountId) -> Result<()> {
        self.ensure_owner(caller)?;
        if sender.is_zero() {
            return Err(Error::ZeroAddress("fee sender".to_string()));
        }
        self.state.allowed_senders.insert(sender.clone());
        Ok(())
    }

    /// Remove a sender from the fee allow-list. Owner only; idempotent.
    pub fn revoke_sender(&mut self, caller: &AccountId, sender: &AccountId) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state.allowed_senders.remove(sender);
        Ok(())
    }

    /// Whether `sender` may submit fees.
    pub fn is_authorized(&self, sender: &AccountId) -> bool {
        self.state.allowed_senders.contains(sender)
    }

    /// Withdraw operational funds. Owner only; endowment principal is
    /// structurally unreachable here.
    pub fn withdraw_operational(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_owner(caller)?;
        if to.is_zero() {
            return Err(Error::ZeroAddress("recipient".to_string()));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount("withdrawal of zero".to_string()));
        }
        let available = self.state.ledger.operational_funds;
        if amount > available {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        self.token.transfer(to, amount)?;
        self.state.ledger.operational_funds = available - amount;

        info!(%to, amount, "operational funds withdrawn");
        Ok(())
    }

    /// Replace the auto-stake threshold. Owner only.
    pub fn set_min_stake_threshold(&mut self, caller: &AccountId, threshold: Amount) -> Result<()> {
        self.ensure_owner(caller)?;
        if threshold == 0 {
            return Err(Error::InvalidAmount("threshold of zero".to_string()));
        }
        self.state.min_stake_threshold = threshold;
        Ok(())
    }

    /// Activate the pause switch. Owner only; idempotent.
    pub fn pause(&mut self, caller: &AccountId) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state.paused = true;
        info!("treasury paused");
        Ok(())
    }

    /// Clear the pause switch. Owner only; idempotent.
    pub fn unpause(&mut self, caller: &AccountId) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state.paused = false;
        info!("treasury unpaused");
        Ok(())
    }

    /// Replace the circuit breaker caps. Owner only.
    pub fn update_breaker_limits(&mut self, caller: &AccountId, config: BreakerConfig) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state
            .breaker
            .update_limits(config)
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Reset the circuit breaker. Owner only; idempotent.
    pub fn reset_breaker(&mut self, caller: &AccountId, now: u64) -> Result<()> {
        self.ensure_owner(caller)?;
        self.state.breaker.reset(now);
        Ok(())
    }

    /// Current breaker caps and headroom.
    pub fn breaker_status(&self, now: u64) -> BreakerStatus {
        self.state.breaker.status(now)
    }

    // Views

    /// The treasury balance sheet.
    pub fn ledger(&self) -> &TreasuryLedger {
        &self.state.ledger
    }

    /// A staker's platform stake.
    pub fn staked_of(&self, staker: &AccountId) -> Amount {
        self.state.stakes.get(staker).copied().unwrap_or(0)
    }

    /// Total platform stake.
    pub fn total_staked(&self) -> Amount {
        self.state.total_staked
    }

    /// A staker's settled-plus-unsettled reward entitlement. The staker
    /// stream is credited instantly at harvest, so no time projection is
    /// involved.
    pub fn pending_rewards(&self, staker: &AccountId) -> Result<Amount> {
        let staked = self.staked_of(staker);
        Ok(self
            .state
            .staker_rewards
            .earned(staker, staked, self.state.total_staked, 0)?)
    }

    // Internal helpers

    fn ensure_active(&self) -> Result<()> {
        if self.state.paused {
            return Err(Error::Paused);
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: &AccountId) -> Result<()> {
        if caller != &self.config.owner {
            return Err(Error::Unauthorized(format!(
                "{} is not the treasury owner",
                caller
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pool_core::adapters::mock::{MockToken, MockYieldSource};

    fn owner() -> AccountId {
        AccountId::new("treasury-admin")
    }

    fn gateway() -> AccountId {
        AccountId::new("fee-gateway")
    }

    fn test_treasury(custody: Amount) -> FeeTreasury {
        let config = TreasuryConfig {
            min_stake_threshold: 1_000,
            ..TreasuryConfig::default()
        };
        let mut token = MockToken::new();
        token.fund_custody(custody);
        let mut treasury = FeeTreasury::new(
            config,
            Box::new(MockYieldSource::new()),
            Box::new(token),
            0,
        )
        .unwrap();
        treasury.authorize_sender(&owner(), &gateway()).unwrap();
        treasury
    }

    #[test]
    fn test_receive_fee_requires_allowlist() {
        let mut treasury = test_treasury(0);
        let stranger = AccountId::new("stranger");

        assert!(matches!(
            treasury.receive_fee(&stranger, 100, 0),
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(
            treasury.receive_fee(&gateway(), 0, 0),
            Err(Error::InvalidAmount(_))
        ));

        treasury.receive_fee(&gateway(), 100, 0).unwrap();
        assert_eq!(treasury.ledger().total_fees_collected, 100);
        assert_eq!(treasury.ledger().pending_fees_to_stake, 100);
    }

    #[test]
    fn test_revoked_sender_rejected() {
        let mut treasury = test_treasury(0);
        treasury.receive_fee(&gateway(), 100, 0).unwrap();

        treasury.revoke_sender(&owner(), &gateway()).unwrap();
        assert!(matches!(
            treasury.receive_fee(&gateway(), 100, 1),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_auto_stake_at_threshold() {
        let mut treasury = test_treasury(0);

        // Below threshold: accumulates
        let staked = treasury.receive_fee(&gateway(), 600, 0).unwrap();
        assert!(!staked);

        // Crossing the threshold deploys the whole pending balance
        let staked = treasury.receive_fee(&gateway(), 400, 1).unwrap();
        assert!(staked);

        let ledger = treasury.ledger();
        assert_eq!(ledger.pending_fees_to_stake, 0);
        assert_eq!(ledger.total_fees_staked, 1_000);
        assert_eq!(ledger.operational_funds, 750); // 75%
        assert_eq!(ledger.endowment_principal, 250); // 25%
    }

    #[test]
    fn test_stake_fees_rejects_empty_pending() {
        let mut treasury = test_treasury(0);
        assert!(matches!(treasury.stake_fees(0), Err(Error::NoPendingFees)));

        treasury.receive_fee(&gateway(), 500, 0).unwrap();
        let staked = treasury.stake_fees(1).unwrap();
        assert_eq!(staked, 500);
        assert_eq!(treasury.ledger().pending_fees_to_stake, 0);
    }

    #[test]
    fn test_harvest_requires_yield() {
        let mut treasury = test_treasury(0);
        assert!(matches!(
            treasury.harvest_platform_yield(0),
            Err(Error::NoYieldAvailable)
        ));
    }

    #[test]
    fn test_harvest_without_stakers_folds_operational() {
        let config = TreasuryConfig {
            min_stake_threshold: 1_000,
            ..TreasuryConfig::default()
        };
        let mut endowment = MockYieldSource::new();
        endowment.accrue(800);
        let mut treasury = FeeTreasury::new(
            config,
            Box::new(endowment),
            Box::new(MockToken::new()),
            0,
        )
        .unwrap();

        let harvest = treasury.harvest_platform_yield(0).unwrap();
        assert_eq!(harvest.harvested, 800);
        assert_eq!(harvest.to_stakers, 0);
        assert_eq!(harvest.retained, 800);
        assert_eq!(treasury.ledger().operational_funds, 800);
        assert_eq!(treasury.ledger().total_yield_distributed, 800);
    }

    #[test]
    fn test_harvest_routes_to_stakers() {
        let config = TreasuryConfig {
            min_stake_threshold: 1_000,
            ..TreasuryConfig::default()
        };
        let mut endowment = MockYieldSource::new();
        endowment.accrue(1_000);
        let mut token = MockToken::new();
        token.fund_custody(10_000);
        let mut treasury =
            FeeTreasury::new(config, Box::new(endowment), Box::new(token), 0).unwrap();

        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        treasury.stake(&alice, 100).unwrap();
        treasury.stake(&bob, 300).unwrap();

        // 50% retained, 500 across stakers 1:3
        let harvest = treasury.harvest_platform_yield(10).unwrap();
        assert_eq!(harvest.harvested, 1_000);
        assert_eq!(harvest.to_stakers, 500);
        assert_eq!(harvest.retained, 500);

        assert_eq!(treasury.claim_rewards(&alice).unwrap(), 125);
        assert_eq!(treasury.claim_rewards(&bob).unwrap(), 375);
        // Nothing further pending: no-op
        assert_eq!(treasury.claim_rewards(&alice).unwrap(), 0);
    }

    #[test]
    fn test_stake_settles_before_change() {
        let config = TreasuryConfig {
            min_stake_threshold: 1_000,
            ..TreasuryConfig::default()
        };
        let mut endowment = MockYieldSource::new();
        endowment.accrue(1_000);
        let mut token = MockToken::new();
        token.fund_custody(10_000);
        let mut treasury =
            FeeTreasury::new(config, Box::new(endowment), Box::new(token), 0).unwrap();

        let alice = AccountId::new("alice");
        treasury.stake(&alice, 100).unwrap();
        treasury.harvest_platform_yield(10).unwrap();

        // Staking more afterwards must not dilute the earlier entitlement
        treasury.stake(&alice, 900).unwrap();
        assert_eq!(treasury.claim_rewards(&alice).unwrap(), 500);
    }

    #[test]
    fn test_unstake_bounded_and_transfers() {
        let mut treasury = test_treasury(10_000);
        let alice = AccountId::new("alice");
        treasury.stake(&alice, 400).unwrap();

        assert!(matches!(
            treasury.unstake(&alice, 401),
            Err(Error::InsufficientBalance { .. })
        ));

        treasury.unstake(&alice, 400).unwrap();
        assert_eq!(treasury.staked_of(&alice), 0);
        assert_eq!(treasury.total_staked(), 0);
    }

    #[test]
    fn test_withdraw_operational_bounds() {
        let mut treasury = test_treasury(10_000);
        treasury.receive_fee(&gateway(), 1_000, 0).unwrap(); // auto-stakes
        assert_eq!(treasury.ledger().operational_funds, 750);

        let recipient = AccountId::new("ops-wallet");

        // Endowment principal provides no cover
        assert!(matches!(
            treasury.withdraw_operational(&owner(), &recipient, 751),
            Err(Error::InsufficientBalance { .. })
        ));
        assert!(matches!(
            treasury.withdraw_operational(&gateway(), &recipient, 100),
            Err(Error::Unauthorized(_))
        ));

        treasury
            .withdraw_operational(&owner(), &recipient, 750)
            .unwrap();
        assert_eq!(treasury.ledger().operational_funds, 0);
        // The endowment principal is untouched
        assert_eq!(treasury.ledger().endowment_principal, 250);
    }

    #[test]
    fn test_paused_rejects_mutations() {
        let mut treasury = test_treasury(0);
        treasury.pause(&owner()).unwrap();

        assert!(matches!(
            treasury.receive_fee(&gateway(), 100, 0),
            Err(Error::Paused)
        ));
        assert!(matches!(treasury.stake_fees(0), Err(Error::Paused)));
        assert!(matches!(
            treasury.harvest_platform_yield(0),
            Err(Error::Paused)
        ));
        assert!(matches!(
            treasury.stake(&AccountId::new("alice"), 1),
            Err(Error::Paused)
        ));

        treasury.unpause(&owner()).unwrap();
        assert!(treasury.receive_fee(&gateway(), 100, 0).is_ok());
    }

    #[test]
    fn test_fee_intake_breaker_gated() {
        let config = TreasuryConfig {
            min_stake_threshold: 1_000_000,
            breaker: risk_controls::BreakerConfig {
                max_single_tx: 500,
                max_hourly_volume: 800,
                max_daily_volume: 2_000,
            },
            ..TreasuryConfig::default()
        };
        let mut treasury = FeeTreasury::new(
            config,
            Box::new(MockYieldSource::new()),
            Box::new(MockToken::new()),
            0,
        )
        .unwrap();
        treasury.authorize_sender(&owner(), &gateway()).unwrap();

        assert!(matches!(
            treasury.receive_fee(&gateway(), 501, 0),
            Err(Error::CircuitBreakerTripped(_))
        ));

        treasury.receive_fee(&gateway(), 500, 0).unwrap();
        assert!(matches!(
            treasury.receive_fee(&gateway(), 301, 10),
            Err(Error::CircuitBreakerTripped(_))
        ));

        // The rejected fee left no trace in the ledger
        assert_eq!(treasury.ledger().total_fees_collected, 500);
    }
}
