//! Pooled yield distribution ledger
//!
//! Exact, non-leaking balance accounting for a staking pool whose yield is
//! split three ways (cause, depositor, platform) with per-depositor
//! configurable splits.
//!
//! # Architecture
//!
//! - **Fixed-point integers**: `u128` base units, floor division, checked
//!   arithmetic everywhere
//! - **Single writer**: one actor task owns all mutable state, so mutating
//!   operations are totally ordered and atomic
//! - **Lazy accrual**: reward-per-share settlement runs before every
//!   principal change
//! - **Snapshot persistence**: the full ledger state is committed to RocksDB
//!   after every mutation
//!
//! # Invariants
//!
//! - Conservation: Σ(principal_i) == total_principal after every commit
//! - No emission without backing: reward_rate * duration ≤ funded reserve
//! - Distribution never exceeds harvest: cause + depositors + platform ≤ raw
//! - A withdrawal never exceeds the depositor's own principal

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod adapters;
pub mod config;
pub mod engine;
pub mod error;
pub mod math;
pub mod metrics;
pub mod pool;
pub mod registry;
pub mod rewards;
pub mod splits;
pub mod storage;
pub mod types;

// Re-exports
pub use config::PoolConfig;
pub use engine::{PoolEngine, PoolState};
pub use error::{Error, Result};
pub use pool::Pool;
pub use registry::StakeRegistry;
pub use rewards::RewardAccumulator;
pub use splits::SplitPolicy;
pub use storage::Storage;
pub use types::{
    AccountId, Amount, AuditEvent, AuditKind, HarvestReport, PoolStats, Position, YieldSplit,
    BPS_DENOMINATOR, MIN_PLATFORM_BPS, PRECISION,
};
