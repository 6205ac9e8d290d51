//! Error types for risk controls

use thiserror::Error;

/// Risk control error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Single transaction cap exceeded
    #[error("single transaction limit exceeded: {amount} > {limit}")]
    SingleTxLimit {
        /// Requested amount
        amount: u128,
        /// Configured cap
        limit: u128,
    },

    /// Rolling hourly volume cap exceeded
    #[error("hourly volume limit exceeded: {used} + {amount} > {limit}")]
    HourlyLimit {
        /// Volume already committed in the current window
        used: u128,
        /// Requested amount
        amount: u128,
        /// Configured cap
        limit: u128,
    },

    /// Rolling daily volume cap exceeded
    #[error("daily volume limit exceeded: {used} + {amount} > {limit}")]
    DailyLimit {
        /// Volume already committed in the current window
        used: u128,
        /// Requested amount
        amount: u128,
        /// Configured cap
        limit: u128,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
