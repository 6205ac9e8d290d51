//! Linear vesting ledger
//!
//! Per-grantee lists of time-locked grants. Each schedule vests linearly
//! from its start over its duration; schedules are claimed independently or
//! in aggregate, and each tracks its own released amount.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use pool_core::adapters::TokenTransfer;
use pool_core::math;
use pool_core::types::{AccountId, Amount};

use crate::{Error, Result};

/// A single linear vesting grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    /// Total granted amount
    pub total: Amount,

    /// Amount already released to the grantee
    pub released: Amount,

    /// Vesting start (unix seconds)
    pub start: u64,

    /// Vesting duration in seconds
    pub duration: u64,
}

impl VestingSchedule {
    /// Amount vested at `now`: `total * min(now - start, duration) / duration`.
    pub fn vested_at(&self, now: u64) -> Result<Amount> {
        let elapsed = now.saturating_sub(self.start).min(self.duration);
        Ok(math::mul_div(
            self.total,
            elapsed as u128,
            self.duration as u128,
        )?)
    }

    /// Vested but not yet released, floored at zero.
    pub fn claimable_at(&self, now: u64) -> Result<Amount> {
        Ok(self.vested_at(now)?.saturating_sub(self.released))
    }
}

/// Serializable vesting state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VestingState {
    grants: BTreeMap<AccountId, Vec<VestingSchedule>>,
}

/// The vesting ledger engine
pub struct VestingLedger {
    state: VestingState,
    owner: AccountId,
    token: Box<dyn TokenTransfer>,
}

impl VestingLedger {
    /// Create an empty ledger administered by `owner`.
    pub fn new(owner: AccountId, token: Box<dyn TokenTransfer>) -> Self {
        Self {
            state: VestingState::default(),
            owner,
            token,
        }
    }

    /// Rebuild a ledger around a previously committed snapshot.
    pub fn restore(owner: AccountId, state: VestingState, token: Box<dyn TokenTransfer>) -> Self {
        Self {
            state,
            owner,
            token,
        }
    }

    /// The current snapshot, for persistence after a commit.
    pub fn state(&self) -> &VestingState {
        &self.state
    }

    /// Grant `total` vesting linearly over `duration` seconds starting now.
    /// Owner only.
    pub fn grant(
        &mut self,
        caller: &AccountId,
        beneficiary: &AccountId,
        total: Amount,
        duration: u64,
        now: u64,
    ) -> Result<()> {
        self.ensure_owner(caller)?;
        if beneficiary.is_zero() {
            return Err(Error::ZeroAddress("beneficiary".to_string()));
        }
        if total == 0 {
            return Err(Error::InvalidAmount("grant of zero".to_string()));
        }
        if duration == 0 {
            return Err(Error::InvalidAmount("grant duration of zero".to_string()));
        }

        self.state
            .grants
            .entry(beneficiary.clone())
            .or_default()
            .push(VestingSchedule {
                total,
                released: 0,
                start: now,
                duration,
            });

        info!(%beneficiary, total, duration, "vesting grant created");
        Ok(())
    }

    /// Claimable amount on one schedule.
    pub fn claimable(&self, beneficiary: &AccountId, index: usize, now: u64) -> Result<Amount> {
        self.schedule(beneficiary, index)?.claimable_at(now)
    }

    /// Claimable amount across all of a grantee's schedules.
    pub fn total_claimable(&self, beneficiary: &AccountId, now: u64) -> Result<Amount> {
        let mut total: Amount = 0;
        for schedule in self.schedules(beneficiary) {
            total = math::add(total, schedule.claimable_at(now)?, "claimable total")?;
        }
        Ok(total)
    }

    /// Claim across all schedules in one transfer. Rejects when nothing is
    /// claimable.
    pub fn claim(&mut self, beneficiary: &AccountId, now: u64) -> Result<Amount> {
        let schedules = self
            .state
            .grants
            .get(beneficiary)
            .map(Vec::as_slice)
            .unwrap_or_default();

        // Compute phase
        let mut claims: Vec<(usize, Amount)> = Vec::new();
        let mut total: Amount = 0;
        for (index, schedule) in schedules.iter().enumerate() {
            let claimable = schedule.claimable_at(now)?;
            if claimable > 0 {
                total = math::add(total, claimable, "claim total")?;
                claims.push((index, claimable));
            }
        }
        if total == 0 {
            return Err(Error::NoClaimable);
        }

        self.token.transfer(beneficiary, total)?;

        if let Some(schedules) = self.state.grants.get_mut(beneficiary) {
            for (index, claimable) in claims {
                schedules[index].released += claimable;
            }
        }

        info!(%beneficiary, amount = total, "vesting claimed");
        Ok(total)
    }

    /// Claim a single schedule by index. Rejects out-of-range indices and
    /// zero claimable amounts.
    pub fn claim_from_schedule(
        &mut self,
        beneficiary: &AccountId,
        index: usize,
        now: u64,
    ) -> Result<Amount> {
        let claimable = self.schedule(beneficiary, index)?.claimable_at(now)?;
        if claimable == 0 {
            return Err(Error::NoClaimable);
        }

        self.token.transfer(beneficiary, claimable)?;

        if let Some(schedule) = self
            .state
            .grants
            .get_mut(beneficiary)
            .and_then(|s| s.get_mut(index))
        {
            schedule.released += claimable;
        }

        info!(%beneficiary, index, amount = claimable, "vesting schedule claimed");
        Ok(claimable)
    }

    /// A grantee's schedules in grant order.
    pub fn schedules(&self, beneficiary: &AccountId) -> &[VestingSchedule] {
        self.state
            .grants
            .get(beneficiary)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn schedule(&self, beneficiary: &AccountId, index: usize) -> Result<&VestingSchedule> {
        self.schedules(beneficiary)
            .get(index)
            .ok_or_else(|| Error::ScheduleNotFound {
                beneficiary: beneficiary.to_string(),
                index,
            })
    }

    fn ensure_owner(&self, caller: &AccountId) -> Result<()> {
        if caller != &self.owner {
            return Err(Error::Unauthorized(format!(
                "{} is not the vesting owner",
                caller
            )));
        }
        Ok(())
    }
}
