//! Risk controls for value transfer
//!
//! Volume-based circuit breaking for pooled value transfer: per-transaction
//! caps plus rolling hourly and daily volume windows, checked before any
//! state mutation in a protected operation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod breaker;
pub mod error;

pub use breaker::{BreakerConfig, BreakerStatus, TransferBreaker, WindowCommit};
pub use error::{Error, Result};
