//! Main pool orchestration layer
//!
//! Ties together storage, the engine, and the actor into a high-level API
//! for the application layer.
//!
//! # Example
//!
//! ```no_run
//! use pool_core::adapters::mock::{MockToken, MockYieldSource};
//! use pool_core::{Pool, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> pool_core::Result<()> {
//!     let config = PoolConfig::default();
//!     let pool = Pool::open(
//!         config,
//!         Box::new(MockYieldSource::new()),
//!         Box::new(MockToken::new()),
//!     )?;
//!
//!     // pool.deposit("alice".into(), 1_000).await?;
//!
//!     Ok(())
//! }
//! ```

use crate::actor::{spawn_pool_actor, PoolHandle};
use crate::engine::PoolEngine;
use crate::metrics::Metrics;
use crate::storage::{Storage, SNAPSHOT_POOL};
use crate::types::{
    AccountId, Amount, AuditEvent, HarvestReport, PoolStats, Position, YieldSplit,
};
use crate::adapters::{TokenTransfer, YieldSource};
use crate::{PoolConfig, Result};
use risk_controls::{BreakerConfig, BreakerStatus};
use std::sync::Arc;

/// Main pool interface
pub struct Pool {
    /// Actor handle for ledger operations
    handle: PoolHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Metrics collector
    metrics: Metrics,
}

impl Pool {
    /// Open the pool: restores the last committed snapshot if one exists,
    /// otherwise starts fresh from configuration.
    pub fn open(
        config: PoolConfig,
        source: Box<dyn YieldSource>,
        token: Box<dyn TokenTransfer>,
    ) -> Result<Self> {
        config.validate()?;

        let storage = Arc::new(Storage::open(&config)?);
        let metrics = Metrics::new()
            .map_err(|e| crate::Error::Config(format!("metrics registry: {}", e)))?;

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let engine = match storage.load_snapshot(SNAPSHOT_POOL)? {
            Some(state) => PoolEngine::restore(&config, state, source, token),
            None => PoolEngine::new(&config, source, token, now)?,
        };

        metrics.set_total_principal(engine.stats().total_principal);
        let handle = spawn_pool_actor(engine, storage.clone(), metrics.clone());

        Ok(Self {
            handle,
            storage,
            metrics,
        })
    }

    /// Deposit principal for a depositor.
    pub async fn deposit(&self, depositor: AccountId, amount: Amount) -> Result<()> {
        self.handle.deposit(depositor, amount).await
    }

    /// Withdraw principal for a depositor.
    pub async fn withdraw(&self, depositor: AccountId, amount: Amount) -> Result<()> {
        self.handle.withdraw(depositor, amount).await
    }

    /// Claim all pending rewards for a depositor.
    pub async fn claim(&self, depositor: AccountId) -> Result<Amount> {
        self.handle.claim(depositor).await
    }

    /// Harvest pending yield and distribute it.
    pub async fn harvest_and_distribute(&self) -> Result<HarvestReport> {
        self.handle.harvest().await
    }

    /// Set the depositor's split override.
    pub async fn set_split(&self, depositor: AccountId, split: YieldSplit) -> Result<()> {
        self.handle.set_split(depositor, split).await
    }

    /// Clear the depositor's split override.
    pub async fn reset_split(&self, depositor: AccountId) -> Result<()> {
        self.handle.reset_split(depositor).await
    }

    /// Replace the policy default split (owner only).
    pub async fn set_default_split(&self, caller: AccountId, split: YieldSplit) -> Result<()> {
        self.handle.set_default_split(caller, split).await
    }

    /// Grow the emission funding reserve (owner only).
    pub async fn fund_rewards(&self, caller: AccountId, amount: Amount) -> Result<()> {
        self.handle.fund_rewards(caller, amount).await
    }

    /// Start a new emission epoch (owner only); returns the per-second rate.
    pub async fn notify_reward_amount(
        &self,
        caller: AccountId,
        amount: Amount,
    ) -> Result<Amount> {
        self.handle.notify_reward_amount(caller, amount).await
    }

    /// Activate the pause switch (owner only).
    pub async fn pause(&self, caller: AccountId) -> Result<()> {
        self.handle.pause(caller).await
    }

    /// Clear the pause switch (owner only).
    pub async fn unpause(&self, caller: AccountId) -> Result<()> {
        self.handle.unpause(caller).await
    }

    /// Replace the circuit breaker caps (owner only).
    pub async fn update_breaker_limits(
        &self,
        caller: AccountId,
        config: BreakerConfig,
    ) -> Result<()> {
        self.handle.update_breaker_limits(caller, config).await
    }

    /// Reset the circuit breaker (owner only).
    pub async fn reset_breaker(&self, caller: AccountId) -> Result<()> {
        self.handle.reset_breaker(caller).await
    }

    /// Current breaker caps and headroom.
    pub async fn breaker_status(&self) -> Result<BreakerStatus> {
        self.handle.breaker_status().await
    }

    /// A depositor's position.
    pub async fn position(&self, account: AccountId) -> Result<Position> {
        self.handle.position(account).await
    }

    /// Pool-wide totals.
    pub async fn stats(&self) -> Result<PoolStats> {
        self.handle.stats().await
    }

    /// The audit log of committed mutations, in commit order.
    pub fn audit_log(&self) -> Result<Vec<AuditEvent>> {
        self.storage.audit_events()
    }

    /// Metrics collector for scrape endpoints.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown the pool actor.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
