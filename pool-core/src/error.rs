//! Error types for the pool engine

use thiserror::Error;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pool engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Caller is not on an allow-list or not the owner
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

    /// Split shares do not sum to 10000 bps or violate the platform floor
    #[error("invalid split: {0}")]
    InvalidSplit(String),

    /// Split configuration attempted with zero principal
    #[error("no stake to configure")]
    NoStakeToConfigure,

    /// Reward re-notification attempted mid-epoch
    #[error("reward period not finished: {remaining_secs}s remaining")]
    PeriodNotFinished {
        /// Seconds until the current epoch finishes
        remaining_secs: u64,
    },

    /// Yield source reported nothing to harvest where yield is required
    #[error("no yield available")]
    NoYieldAvailable,

    /// Nothing pending where a claim is required to move value
    #[error("nothing to claim")]
    NoClaimable,

    /// Global pause switch is active
    #[error("paused")]
    Paused,

    /// Checked arithmetic overflowed
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// Storage error (RocksDB)
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Adapter failure reported by a yield source or token backend
    #[error("adapter error: {0}")]
    Adapter(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
