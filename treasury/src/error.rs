//! Error types for the treasury

use thiserror::Error;

/// Result type for treasury operations
pub type Result<T> = std::result::Result<T, Error>;

/// Treasury errors
#[derive(Error, Debug)]
pub enum Error {
    /// Caller is not on the sender allow-list or not the owner
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Empty account identifier where one is required
    #[error("zero address: {0}")]
    ZeroAddress(String),

    /// Zero amount where a positive amount is required
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Withdrawal or claim exceeds the available balance
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Requested amount
        requested: u128,
        /// Available amount
        available: u128,
    },

    /// One of the circuit breaker volume caps was exceeded
    #[error("circuit breaker tripped: {0}")]
    CircuitBreakerTripped(#[from] risk_controls::Error),

    /// Endowment reported nothing to harvest
    #[error("no yield available")]
    NoYieldAvailable,

    /// Staking attempted with nothing pending
    #[error("no pending fees")]
    NoPendingFees,

    /// Nothing claimable across the targeted schedules
    #[error("nothing to claim")]
    NoClaimable,

    /// Vesting schedule index out of range
    #[error("schedule {index} not found for {beneficiary}")]
    ScheduleNotFound {
        /// Grantee account
        beneficiary: String,
        /// Requested index
        index: usize,
    },

    /// Global pause switch is active
    #[error("paused")]
    Paused,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Error surfaced from the pool core (adapters, arithmetic)
    #[error("pool core error: {0}")]
    Core(#[from] pool_core::Error),
}
