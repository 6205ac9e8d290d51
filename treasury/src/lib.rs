//! Fee treasury and vesting
//!
//! The treasury accumulates protocol fees from allow-listed senders, deploys
//! them into a yield-bearing endowment once a threshold is crossed, and
//! separates withdrawable operational funds from untouchable endowment
//! principal. Endowment yield is harvested on demand and routed to platform
//! stakers through the shared reward accumulator. The vesting ledger tracks
//! linear time-locked grants under the same fixed-point and authorization
//! conventions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod treasury;
pub mod vesting;

pub use config::TreasuryConfig;
pub use error::{Error, Result};
pub use treasury::{FeeTreasury, TreasuryLedger, TreasuryState, YieldHarvest};
pub use vesting::{VestingLedger, VestingSchedule, VestingState};
