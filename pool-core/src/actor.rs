//! Actor-based concurrency for the pool
//!
//! The single-writer pattern: one Tokio task owns the engine, and every
//! mutating operation arrives as a message through a bounded mailbox. This
//! gives the engine its scheduling model: operations are totally ordered by
//! submission, no two interleave, and no caller ever observes intermediate
//! state. After each committed mutation the actor persists the
//! engine snapshot and appends an audit event before replying.

use crate::engine::PoolEngine;
use crate::metrics::Metrics;
use crate::storage::{Storage, SNAPSHOT_POOL};
use crate::types::{
    AccountId, Amount, AuditEvent, AuditKind, HarvestReport, PoolStats, Position, YieldSplit,
};
use crate::{Error, Result};
use risk_controls::{BreakerConfig, BreakerStatus};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the pool actor
pub enum PoolMessage {
    /// Deposit principal
    Deposit {
        /// Depositor account
        depositor: AccountId,
        /// Amount in base units
        amount: Amount,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Withdraw principal
    Withdraw {
        /// Depositor account
        depositor: AccountId,
        /// Amount in base units
        amount: Amount,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Claim pending rewards
    Claim {
        /// Depositor account
        depositor: AccountId,
        /// Response channel
        response: oneshot::Sender<Result<Amount>>,
    },

    /// Harvest and distribute pending yield
    Harvest {
        /// Response channel
        response: oneshot::Sender<Result<HarvestReport>>,
    },

    /// Set a depositor split override
    SetSplit {
        /// Depositor account
        depositor: AccountId,
        /// Requested split
        split: YieldSplit,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Clear a depositor split override
    ResetSplit {
        /// Depositor account
        depositor: AccountId,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Replace the policy default split
    SetDefaultSplit {
        /// Administrator account
        caller: AccountId,
        /// New default split
        split: YieldSplit,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Grow the emission funding reserve
    FundRewards {
        /// Administrator account
        caller: AccountId,
        /// Amount in base units
        amount: Amount,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Start a new emission epoch
    NotifyRewardAmount {
        /// Administrator account
        caller: AccountId,
        /// Epoch emission amount
        amount: Amount,
        /// Response channel
        response: oneshot::Sender<Result<Amount>>,
    },

    /// Activate the pause switch
    Pause {
        /// Administrator account
        caller: AccountId,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Clear the pause switch
    Unpause {
        /// Administrator account
        caller: AccountId,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Replace the circuit breaker caps
    UpdateBreakerLimits {
        /// Administrator account
        caller: AccountId,
        /// New caps
        config: BreakerConfig,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Reset the circuit breaker
    ResetBreaker {
        /// Administrator account
        caller: AccountId,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Read breaker status
    BreakerStatus {
        /// Response channel
        response: oneshot::Sender<BreakerStatus>,
    },

    /// Read a depositor position
    GetPosition {
        /// Depositor account
        account: AccountId,
        /// Response channel
        response: oneshot::Sender<Result<Position>>,
    },

    /// Read pool-wide totals
    GetStats {
        /// Response channel
        response: oneshot::Sender<PoolStats>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes pool messages
pub struct PoolActor {
    engine: PoolEngine,
    storage: Arc<Storage>,
    metrics: Metrics,
    mailbox: mpsc::Receiver<PoolMessage>,
}

impl PoolActor {
    /// Create new actor
    pub fn new(
        engine: PoolEngine,
        storage: Arc<Storage>,
        metrics: Metrics,
        mailbox: mpsc::Receiver<PoolMessage>,
    ) -> Self {
        Self {
            engine,
            storage,
            metrics,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if matches!(msg, PoolMessage::Shutdown) {
                break;
            }
            self.handle_message(msg);
        }
    }

    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }

    /// Persist the snapshot and audit record for a committed mutation.
    fn commit(
        &self,
        kind: AuditKind,
        account: Option<AccountId>,
        amount: Amount,
    ) -> Result<()> {
        self.storage.put_snapshot(SNAPSHOT_POOL, self.engine.state())?;
        self.storage
            .append_audit(&AuditEvent::new(kind, account, amount))?;
        self.metrics
            .set_total_principal(self.engine.stats().total_principal);
        Ok(())
    }

    fn handle_message(&mut self, msg: PoolMessage) {
        let now = self.now();
        match msg {
            PoolMessage::Deposit {
                depositor,
                amount,
                response,
            } => {
                let result = self
                    .engine
                    .deposit(&depositor, amount, now)
                    .and_then(|_| {
                        self.metrics.deposits_total.inc();
                        self.commit(AuditKind::Deposit, Some(depositor), amount)
                    })
                    .inspect_err(|_| self.metrics.rejections_total.inc());
                let _ = response.send(result);
            }

            PoolMessage::Withdraw {
                depositor,
                amount,
                response,
            } => {
                let result = self
                    .engine
                    .withdraw(&depositor, amount, now)
                    .and_then(|_| {
                        self.metrics.withdrawals_total.inc();
                        self.commit(AuditKind::Withdraw, Some(depositor), amount)
                    })
                    .inspect_err(|_| self.metrics.rejections_total.inc());
                let _ = response.send(result);
            }

            PoolMessage::Claim {
                depositor,
                response,
            } => {
                let result = self
                    .engine
                    .claim(&depositor, now)
                    .and_then(|claimed| {
                        if claimed > 0 {
                            self.metrics.claims_total.inc();
                            self.commit(AuditKind::Claim, Some(depositor), claimed)?;
                        }
                        Ok(claimed)
                    })
                    .inspect_err(|_| self.metrics.rejections_total.inc());
                let _ = response.send(result);
            }

            PoolMessage::Harvest { response } => {
                let result = self
                    .engine
                    .harvest_and_distribute(now)
                    .and_then(|report| {
                        if report.raw > 0 {
                            self.metrics.harvests_total.inc();
                            self.commit(AuditKind::Harvest, None, report.raw)?;
                        }
                        Ok(report)
                    })
                    .inspect_err(|_| self.metrics.rejections_total.inc());
                let _ = response.send(result);
            }

            PoolMessage::SetSplit {
                depositor,
                split,
                response,
            } => {
                let result = self
                    .engine
                    .set_split(&depositor, split)
                    .and_then(|_| self.persist_snapshot());
                let _ = response.send(result);
            }

            PoolMessage::ResetSplit {
                depositor,
                response,
            } => {
                let result = self
                    .engine
                    .reset_split(&depositor)
                    .and_then(|_| self.persist_snapshot());
                let _ = response.send(result);
            }

            PoolMessage::SetDefaultSplit {
                caller,
                split,
                response,
            } => {
                let result = self
                    .engine
                    .set_default_split(&caller, split)
                    .and_then(|_| self.persist_snapshot());
                let _ = response.send(result);
            }

            PoolMessage::FundRewards {
                caller,
                amount,
                response,
            } => {
                let result = self
                    .engine
                    .fund_rewards(&caller, amount)
                    .and_then(|_| self.commit(AuditKind::RewardsFunded, None, amount));
                let _ = response.send(result);
            }

            PoolMessage::NotifyRewardAmount {
                caller,
                amount,
                response,
            } => {
                let result = self
                    .engine
                    .notify_reward_amount(&caller, amount, now)
                    .and_then(|rate| {
                        self.commit(AuditKind::RewardsNotified, None, amount)?;
                        Ok(rate)
                    });
                let _ = response.send(result);
            }

            PoolMessage::Pause { caller, response } => {
                let result = self.engine.pause(&caller).and_then(|_| {
                    self.commit(AuditKind::PauseToggled, Some(caller), 0)
                });
                let _ = response.send(result);
            }

            PoolMessage::Unpause { caller, response } => {
                let result = self.engine.unpause(&caller).and_then(|_| {
                    self.commit(AuditKind::PauseToggled, Some(caller), 0)
                });
                let _ = response.send(result);
            }

            PoolMessage::UpdateBreakerLimits {
                caller,
                config,
                response,
            } => {
                let result = self
                    .engine
                    .update_breaker_limits(&caller, config)
                    .and_then(|_| self.persist_snapshot());
                let _ = response.send(result);
            }

            PoolMessage::ResetBreaker { caller, response } => {
                let result = self
                    .engine
                    .reset_breaker(&caller, now)
                    .and_then(|_| self.persist_snapshot());
                let _ = response.send(result);
            }

            PoolMessage::BreakerStatus { response } => {
                let _ = response.send(self.engine.breaker_status(now));
            }

            PoolMessage::GetPosition { account, response } => {
                let _ = response.send(self.engine.position(&account, now));
            }

            PoolMessage::GetStats { response } => {
                let _ = response.send(self.engine.stats());
            }

            PoolMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn persist_snapshot(&self) -> Result<()> {
        self.storage.put_snapshot(SNAPSHOT_POOL, self.engine.state())
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct PoolHandle {
    sender: mpsc::Sender<PoolMessage>,
}

impl PoolHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<PoolMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> PoolMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("response channel closed".to_string()))
    }

    /// Deposit principal
    pub async fn deposit(&self, depositor: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| PoolMessage::Deposit {
            depositor,
            amount,
            response,
        })
        .await?
    }

    /// Withdraw principal
    pub async fn withdraw(&self, depositor: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| PoolMessage::Withdraw {
            depositor,
            amount,
            response,
        })
        .await?
    }

    /// Claim pending rewards
    pub async fn claim(&self, depositor: AccountId) -> Result<Amount> {
        self.request(|response| PoolMessage::Claim {
            depositor,
            response,
        })
        .await?
    }

    /// Harvest and distribute pending yield
    pub async fn harvest(&self) -> Result<HarvestReport> {
        self.request(|response| PoolMessage::Harvest { response })
            .await?
    }

    /// Set a depositor split override
    pub async fn set_split(&self, depositor: AccountId, split: YieldSplit) -> Result<()> {
        self.request(|response| PoolMessage::SetSplit {
            depositor,
            split,
            response,
        })
        .await?
    }

    /// Clear a depositor split override
    pub async fn reset_split(&self, depositor: AccountId) -> Result<()> {
        self.request(|response| PoolMessage::ResetSplit {
            depositor,
            response,
        })
        .await?
    }

    /// Replace the policy default split
    pub async fn set_default_split(&self, caller: AccountId, split: YieldSplit) -> Result<()> {
        self.request(|response| PoolMessage::SetDefaultSplit {
            caller,
            split,
            response,
        })
        .await?
    }

    /// Grow the emission funding reserve
    pub async fn fund_rewards(&self, caller: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| PoolMessage::FundRewards {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Start a new emission epoch; returns the per-second rate
    pub async fn notify_reward_amount(
        &self,
        caller: AccountId,
        amount: Amount,
    ) -> Result<Amount> {
        self.request(|response| PoolMessage::NotifyRewardAmount {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Activate the pause switch
    pub async fn pause(&self, caller: AccountId) -> Result<()> {
        self.request(|response| PoolMessage::Pause { caller, response })
            .await?
    }

    /// Clear the pause switch
    pub async fn unpause(&self, caller: AccountId) -> Result<()> {
        self.request(|response| PoolMessage::Unpause { caller, response })
            .await?
    }

    /// Replace the circuit breaker caps
    pub async fn update_breaker_limits(
        &self,
        caller: AccountId,
        config: BreakerConfig,
    ) -> Result<()> {
        self.request(|response| PoolMessage::UpdateBreakerLimits {
            caller,
            config,
            response,
        })
        .await?
    }

    /// Reset the circuit breaker
    pub async fn reset_breaker(&self, caller: AccountId) -> Result<()> {
        self.request(|response| PoolMessage::ResetBreaker { caller, response })
            .await?
    }

    /// Read breaker status
    pub async fn breaker_status(&self) -> Result<BreakerStatus> {
        self.request(|response| PoolMessage::BreakerStatus { response })
            .await
    }

    /// Read a depositor position
    pub async fn position(&self, account: AccountId) -> Result<Position> {
        self.request(|response| PoolMessage::GetPosition { account, response })
            .await?
    }

    /// Read pool-wide totals
    pub async fn stats(&self) -> Result<PoolStats> {
        self.request(|response| PoolMessage::GetStats { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(PoolMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the pool actor
pub fn spawn_pool_actor(
    engine: PoolEngine,
    storage: Arc<Storage>,
    metrics: Metrics,
) -> PoolHandle {
    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = PoolActor::new(engine, storage, metrics, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    PoolHandle::new(tx)
}
