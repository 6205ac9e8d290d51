//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the pool.
//!
//! # Metrics
//!
//! - `pool_deposits_total` - Committed deposits
//! - `pool_withdrawals_total` - Committed withdrawals
//! - `pool_claims_total` - Committed claims
//! - `pool_harvests_total` - Harvest passes that distributed value
//! - `pool_rejections_total` - Operations rejected by validation or caps
//! - `pool_total_principal` - Current pool-wide principal

use prometheus::{IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Committed deposits
    pub deposits_total: IntCounter,

    /// Committed withdrawals
    pub withdrawals_total: IntCounter,

    /// Committed claims
    pub claims_total: IntCounter,

    /// Harvest passes that distributed value
    pub harvests_total: IntCounter,

    /// Rejected operations
    pub rejections_total: IntCounter,

    /// Current pool-wide principal
    pub total_principal: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deposits_total =
            IntCounter::new("pool_deposits_total", "Committed deposits")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total =
            IntCounter::new("pool_withdrawals_total", "Committed withdrawals")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let claims_total = IntCounter::new("pool_claims_total", "Committed claims")?;
        registry.register(Box::new(claims_total.clone()))?;

        let harvests_total = IntCounter::new(
            "pool_harvests_total",
            "Harvest passes that distributed value",
        )?;
        registry.register(Box::new(harvests_total.clone()))?;

        let rejections_total = IntCounter::new(
            "pool_rejections_total",
            "Operations rejected by validation or caps",
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let total_principal =
            IntGauge::new("pool_total_principal", "Current pool-wide principal")?;
        registry.register(Box::new(total_principal.clone()))?;

        Ok(Self {
            deposits_total,
            withdrawals_total,
            claims_total,
            harvests_total,
            rejections_total,
            total_principal,
            registry,
        })
    }

    /// Update the principal gauge, clamping to the gauge's i64 range.
    pub fn set_total_principal(&self, principal: u128) {
        self.total_principal
            .set(principal.min(i64::MAX as u128) as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("failed to create metrics")
    }
}
