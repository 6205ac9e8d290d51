//! Core types for the pool engine
//!
//! All amounts are unsigned base units (`u128`); reward-per-share values are
//! scaled by [`PRECISION`]. Division is floor division throughout, and all
//! arithmetic on balances is checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::math;
use crate::{Error, Result};

/// Token amount in base units
pub type Amount = u128;

/// Fixed-point scale for reward-per-share accounting
pub const PRECISION: u128 = 1_000_000_000_000;

/// Basis-point denominator: 10000 bps == 100%
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Minimum platform share of any yield split, in bps
pub const MIN_PLATFORM_BPS: u64 = 200;

/// Account identifier (application-level user or system account)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty ("zero") address
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Three-way basis-point yield split: cause / depositor / platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldSplit {
    /// Share routed to the cause beneficiary
    pub cause_bps: u64,

    /// Share credited to the depositor's claimable balance
    pub depositor_bps: u64,

    /// Share routed to the platform account
    pub platform_bps: u64,
}

impl YieldSplit {
    /// Create a validated split.
    pub fn new(cause_bps: u64, depositor_bps: u64, platform_bps: u64) -> Result<Self> {
        let split = Self {
            cause_bps,
            depositor_bps,
            platform_bps,
        };
        split.validate()?;
        Ok(split)
    }

    /// Validate: shares sum to exactly 10000 bps and the platform share
    /// meets the floor.
    pub fn validate(&self) -> Result<()> {
        let sum = self
            .cause_bps
            .checked_add(self.depositor_bps)
            .and_then(|s| s.checked_add(self.platform_bps))
            .ok_or(Error::ArithmeticOverflow("split sum"))?;

        if sum != BPS_DENOMINATOR {
            return Err(Error::InvalidSplit(format!(
                "shares sum to {} bps, expected {}",
                sum, BPS_DENOMINATOR
            )));
        }
        if self.platform_bps < MIN_PLATFORM_BPS {
            return Err(Error::InvalidSplit(format!(
                "platform share {} bps is below the {} bps floor",
                self.platform_bps, MIN_PLATFORM_BPS
            )));
        }
        Ok(())
    }

    /// Apply the split to `amount` with floor division per share.
    ///
    /// The three portions never sum to more than `amount`; the flooring
    /// remainder is reported as dust for the caller to carry.
    pub fn apply(&self, amount: Amount) -> Result<SplitPortions> {
        let cause = math::bps_share(amount, self.cause_bps)?;
        let depositor = math::bps_share(amount, self.depositor_bps)?;
        let platform = math::bps_share(amount, self.platform_bps)?;

        let distributed = cause + depositor + platform;
        debug_assert!(distributed <= amount);

        Ok(SplitPortions {
            cause,
            depositor,
            platform,
            dust: amount - distributed,
        })
    }
}

/// Result of applying a [`YieldSplit`] to an attributed amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPortions {
    /// Portion transferred to the cause beneficiary
    pub cause: Amount,
    /// Portion credited to the depositor
    pub depositor: Amount,
    /// Portion transferred to the platform account
    pub platform: Amount,
    /// Flooring remainder retained by the pool
    pub dust: Amount,
}

/// Kind of committed ledger mutation, recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditKind {
    /// Principal deposited
    Deposit,
    /// Principal withdrawn
    Withdraw,
    /// Accrued rewards claimed
    Claim,
    /// Yield harvested and distributed
    Harvest,
    /// Emission epoch funded
    RewardsFunded,
    /// Emission epoch started
    RewardsNotified,
    /// Pool paused or unpaused
    PauseToggled,
}

/// Audit record appended after every committed mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,

    /// What happened
    pub kind: AuditKind,

    /// Account the mutation concerned, if any
    pub account: Option<AccountId>,

    /// Principal or reward amount moved
    pub amount: Amount,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new audit event stamped now.
    pub fn new(kind: AuditKind, account: Option<AccountId>, amount: Amount) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            kind,
            account,
            amount,
            timestamp: Utc::now(),
        }
    }
}

/// A depositor's position as seen at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Depositor account
    pub account: AccountId,

    /// Contributed principal
    pub principal: Amount,

    /// Claimable rewards: emission accrual plus harvest credits
    pub claimable: Amount,

    /// Effective yield split for the depositor
    pub split: YieldSplit,
}

/// Pool-wide totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    /// Sum of all depositor principals
    pub total_principal: Amount,

    /// Number of depositors with nonzero principal
    pub depositor_count: usize,

    /// Lifetime raw yield harvested from the source
    pub total_yield_harvested: Amount,

    /// Lifetime value distributed (cause + depositors + platform)
    pub total_yield_distributed: Amount,

    /// Emission reserve backing reward epochs
    pub reward_reserve: Amount,

    /// Flooring remainder carried toward the next harvest
    pub dust_carry: Amount,

    /// Whether the global pause switch is active
    pub paused: bool,
}

/// Outcome of a harvest-and-distribute pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestReport {
    /// Raw yield pulled from the source plus carried dust
    pub raw: Amount,

    /// Total transferred to the cause beneficiary
    pub cause: Amount,

    /// Total credited across depositor claimables
    pub depositors: Amount,

    /// Total transferred to the platform account
    pub platform: Amount,

    /// Flooring remainder carried toward the next harvest
    pub dust: Amount,

    /// Number of depositors credited
    pub credited: usize,
}
