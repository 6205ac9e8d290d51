//! Configuration for the pool

use risk_controls::BreakerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{AccountId, YieldSplit};

/// Pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Administrator account
    pub owner: AccountId,

    /// Cause beneficiary account receiving the cause share of yield
    pub beneficiary: AccountId,

    /// Platform account receiving the platform share of yield
    pub platform: AccountId,

    /// Policy-wide default yield split
    pub default_split: YieldSplit,

    /// Emission epoch length in seconds
    pub reward_duration_secs: u64,

    /// Circuit breaker caps
    pub breaker: BreakerConfig,

    /// RocksDB tuning
    pub rocksdb: RocksDbConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/pool"),
            service_name: "pool-core".to_string(),
            owner: AccountId::new("pool-admin"),
            beneficiary: AccountId::new("cause-vault"),
            platform: AccountId::new("platform-fees"),
            default_split: YieldSplit {
                cause_bps: 7_900,
                depositor_bps: 1_900,
                platform_bps: 200,
            },
            reward_duration_secs: 7 * 86_400,
            breaker: BreakerConfig::default(),
            rocksdb: RocksDbConfig::default(),
        }
    }
}

/// RocksDB tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 2,
        }
    }
}

impl PoolConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PoolConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults with environment variable overrides
    pub fn from_env() -> crate::Result<Self> {
        let mut config = PoolConfig::default();

        if let Ok(data_dir) = std::env::var("POOL_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(owner) = std::env::var("POOL_OWNER") {
            config.owner = AccountId::new(owner);
        }
        if let Ok(beneficiary) = std::env::var("POOL_BENEFICIARY") {
            config.beneficiary = AccountId::new(beneficiary);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate account identifiers and the default split.
    pub fn validate(&self) -> crate::Result<()> {
        for (name, account) in [
            ("owner", &self.owner),
            ("beneficiary", &self.beneficiary),
            ("platform", &self.platform),
        ] {
            if account.is_zero() {
                return Err(crate::Error::Config(format!("{} account is empty", name)));
            }
        }
        self.default_split.validate()?;
        if self.reward_duration_secs == 0 {
            return Err(crate::Error::Config(
                "reward duration must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}
