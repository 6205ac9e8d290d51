//! Configuration for the treasury

use pool_core::types::{AccountId, Amount, BPS_DENOMINATOR};
use risk_controls::BreakerConfig;
use serde::{Deserialize, Serialize};

/// Treasury configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryConfig {
    /// Administrator account
    pub owner: AccountId,

    /// Pending fees are auto-staked once they reach this amount
    pub min_stake_threshold: Amount,

    /// Share of staked fees kept as withdrawable operational funds, in bps;
    /// the remainder becomes endowment principal
    pub operational_bps: u64,

    /// Share of harvested endowment yield retained as operational funds,
    /// in bps; the remainder is routed to platform stakers
    pub retained_yield_bps: u64,

    /// Epoch duration for the staker reward accumulator, in seconds
    pub reward_duration_secs: u64,

    /// Circuit breaker caps for fee intake
    pub breaker: BreakerConfig,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            owner: AccountId::new("treasury-admin"),
            min_stake_threshold: 10_000,
            operational_bps: 7_500,
            retained_yield_bps: 5_000,
            reward_duration_secs: 7 * 86_400,
            breaker: BreakerConfig::default(),
        }
    }
}

impl TreasuryConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("failed to read config: {}", e)))?;
        let config: TreasuryConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate bps shares and accounts.
    pub fn validate(&self) -> crate::Result<()> {
        if self.owner.is_zero() {
            return Err(crate::Error::Config("owner account is empty".to_string()));
        }
        if self.operational_bps > BPS_DENOMINATOR {
            return Err(crate::Error::Config(format!(
                "operational share {} bps exceeds {}",
                self.operational_bps, BPS_DENOMINATOR
            )));
        }
        if self.retained_yield_bps > BPS_DENOMINATOR {
            return Err(crate::Error::Config(format!(
                "retained yield share {} bps exceeds {}",
                self.retained_yield_bps, BPS_DENOMINATOR
            )));
        }
        if self.min_stake_threshold == 0 {
            return Err(crate::Error::Config(
                "stake threshold must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}
