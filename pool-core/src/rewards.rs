//! Reward-per-share accrual
//!
//! One [`RewardAccumulator`] instance tracks one reward asset stream. The
//! pool uses it for time-based token emission; the treasury reuses it to fan
//! platform yield out to its stakers. Accrual is lazy: `update` advances the
//! global reward-per-share figure, and `settle` folds the delta since an
//! account's last interaction into its snapshot. `settle` must run
//! immediately before any change to that account's shares or attribution is
//! lost to whoever holds the shares next.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::math;
use crate::types::{AccountId, Amount, PRECISION};
use crate::{Error, Result};

/// Per-account accrual snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RewardSnapshot {
    /// Reward-per-share already credited to this account
    user_reward_per_share_paid: u128,
    /// Settled, unclaimed rewards
    accrued: Amount,
}

/// Reward-per-share accrual engine for a single reward stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardAccumulator {
    /// Emission rate in base units per second (zero outside epochs)
    reward_rate: Amount,

    /// End of the current epoch (unix seconds)
    period_finish: u64,

    /// Last time accrual was folded into `reward_per_share_stored`
    last_update_time: u64,

    /// Cumulative reward per share, scaled by [`PRECISION`]; monotone
    reward_per_share_stored: u128,

    /// Epoch length in seconds for `notify_reward_amount`
    duration: u64,

    snapshots: BTreeMap<AccountId, RewardSnapshot>,
}

impl RewardAccumulator {
    /// Create an accumulator with the given epoch duration.
    pub fn new(duration_secs: u64) -> Self {
        Self {
            reward_rate: 0,
            period_finish: 0,
            last_update_time: 0,
            reward_per_share_stored: 0,
            duration: duration_secs,
            snapshots: BTreeMap::new(),
        }
    }

    /// Advance global accrual to `min(now, period_finish)`.
    ///
    /// With zero shares outstanding no reward accrues; time still advances,
    /// so emission covering a shareless stretch is dropped rather than
    /// granted retroactively to the next depositor.
    pub fn update(&mut self, total_shares: Amount, now: u64) -> Result<()> {
        let effective = now.min(self.period_finish).max(self.last_update_time);

        if total_shares > 0 {
            let elapsed = effective - self.last_update_time;
            let emitted = math::mul_div(
                self.reward_rate,
                (elapsed as u128) * PRECISION,
                total_shares,
            )?;
            self.reward_per_share_stored = math::add(
                self.reward_per_share_stored,
                emitted,
                "reward_per_share_stored",
            )?;
        }

        self.last_update_time = effective;
        Ok(())
    }

    /// Fold accrual since the account's last interaction into its snapshot.
    ///
    /// Must run immediately before any change to `shares`.
    pub fn settle(&mut self, account: &AccountId, shares: Amount) -> Result<()> {
        let rps = self.reward_per_share_stored;
        let snapshot = self.snapshots.entry(account.clone()).or_default();

        let delta = math::mul_div(shares, rps - snapshot.user_reward_per_share_paid, PRECISION)?;
        snapshot.accrued = math::add(snapshot.accrued, delta, "accrued rewards")?;
        snapshot.user_reward_per_share_paid = rps;
        Ok(())
    }

    /// Start a new emission epoch of `amount` over the configured duration.
    ///
    /// Rejected while the current epoch is still running, and rejected when
    /// `funding_reserve` does not back the full epoch emission.
    pub fn notify_reward_amount(
        &mut self,
        amount: Amount,
        funding_reserve: Amount,
        now: u64,
    ) -> Result<Amount> {
        if now < self.period_finish {
            return Err(Error::PeriodNotFinished {
                remaining_secs: self.period_finish - now,
            });
        }
        if self.duration == 0 {
            return Err(Error::Config("reward duration is zero".to_string()));
        }

        let rate = amount / self.duration as u128;
        if rate == 0 {
            return Err(Error::InvalidAmount(format!(
                "amount {} emits nothing over {}s",
                amount, self.duration
            )));
        }

        let required = math::mul_div(rate, self.duration as u128, 1)?;
        if required > funding_reserve {
            return Err(Error::InsufficientBalance {
                requested: required,
                available: funding_reserve,
            });
        }

        self.reward_rate = rate;
        self.last_update_time = now;
        self.period_finish = now + self.duration;
        Ok(rate)
    }

    /// Instant pro-rata credit of `amount` across `total_shares`.
    ///
    /// Used for sporadic distributions (treasury yield) where a rate epoch
    /// would reject mid-period top-ups. Returns the floor-credited amount;
    /// the caller keeps the remainder.
    pub fn distribute(&mut self, amount: Amount, total_shares: Amount) -> Result<Amount> {
        if total_shares == 0 {
            return Err(Error::InvalidAmount(
                "cannot distribute to zero shares".to_string(),
            ));
        }
        let per_share = math::mul_div(amount, PRECISION, total_shares)?;
        self.reward_per_share_stored = math::add(
            self.reward_per_share_stored,
            per_share,
            "reward_per_share_stored",
        )?;
        math::mul_div(per_share, total_shares, PRECISION)
    }

    /// Settled plus projected accrual for `account` at `now`, read-only.
    pub fn earned(
        &self,
        account: &AccountId,
        shares: Amount,
        total_shares: Amount,
        now: u64,
    ) -> Result<Amount> {
        let mut rps = self.reward_per_share_stored;
        let effective = now.min(self.period_finish).max(self.last_update_time);
        if total_shares > 0 {
            let elapsed = effective - self.last_update_time;
            rps = math::add(
                rps,
                math::mul_div(self.reward_rate, (elapsed as u128) * PRECISION, total_shares)?,
                "projected reward_per_share",
            )?;
        }

        let (paid, accrued) = match self.snapshots.get(account) {
            Some(s) => (s.user_reward_per_share_paid, s.accrued),
            None => (0, 0),
        };
        math::add(accrued, math::mul_div(shares, rps - paid, PRECISION)?, "earned")
    }

    /// Drain the settled accrual for `account`, returning it.
    pub fn take_accrued(&mut self, account: &AccountId) -> Amount {
        match self.snapshots.get_mut(account) {
            Some(snapshot) => std::mem::take(&mut snapshot.accrued),
            None => 0,
        }
    }

    /// Settled, unclaimed accrual for `account`.
    pub fn accrued(&self, account: &AccountId) -> Amount {
        self.snapshots.get(account).map_or(0, |s| s.accrued)
    }

    /// Current epoch end, zero before the first epoch.
    pub fn period_finish(&self) -> u64 {
        self.period_finish
    }

    /// Current emission rate per second.
    pub fn reward_rate(&self) -> Amount {
        self.reward_rate
    }

    /// Configured epoch duration in seconds.
    pub fn duration(&self) -> u64 {
        self.duration
    }
}
