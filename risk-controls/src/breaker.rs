//! Volume circuit breaker
//!
//! One `TransferBreaker` instance protects one subject (a pool, a treasury).
//! Three caps apply to every protected transfer: a single-transaction cap and
//! rolling hourly/daily volume windows. A window's counter resets only once
//! the window has fully elapsed, never early.
//!
//! `check` is pure: it computes the post-commit window state without touching
//! the breaker, so a caller can interleave other fallible work and apply the
//! result with `commit` only when the whole operation succeeds. A rejected
//! check therefore leaves no trace: rejection itself is the authoritative
//! signal, and the `tripped` flag is best-effort diagnostics for operators.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Seconds in the hourly window
pub const HOUR_SECS: u64 = 3_600;

/// Seconds in the daily window
pub const DAY_SECS: u64 = 86_400;

/// Volume cap configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Maximum amount for a single transaction
    pub max_single_tx: u128,

    /// Maximum total volume per rolling hour
    pub max_hourly_volume: u128,

    /// Maximum total volume per rolling day
    pub max_daily_volume: u128,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_single_tx: 100_000_000_000,
            max_hourly_volume: 500_000_000_000,
            max_daily_volume: 2_000_000_000_000,
        }
    }
}

impl BreakerConfig {
    /// Validate cap ordering: single <= hourly <= daily, all nonzero.
    pub fn validate(&self) -> Result<()> {
        if self.max_single_tx == 0 || self.max_hourly_volume == 0 || self.max_daily_volume == 0 {
            return Err(Error::InvalidConfig("caps must be nonzero".to_string()));
        }
        if self.max_single_tx > self.max_hourly_volume {
            return Err(Error::InvalidConfig(
                "single-transaction cap exceeds hourly cap".to_string(),
            ));
        }
        if self.max_hourly_volume > self.max_daily_volume {
            return Err(Error::InvalidConfig(
                "hourly cap exceeds daily cap".to_string(),
            ));
        }
        Ok(())
    }
}

/// Window state computed by a successful `check`, applied by `commit`.
///
/// Holding one of these does not reserve headroom; it is a snapshot of what
/// the counters will become if the enclosing operation commits.
#[derive(Debug, Clone, Copy)]
pub struct WindowCommit {
    hourly_used: u128,
    hourly_window_start: u64,
    daily_used: u128,
    daily_window_start: u64,
}

/// Per-subject volume circuit breaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferBreaker {
    config: BreakerConfig,
    hourly_used: u128,
    hourly_window_start: u64,
    daily_used: u128,
    daily_window_start: u64,
    /// Diagnostic only: set when a check rejects and the caller commits the
    /// rejection path (never persisted by an atomically-discarded operation).
    tripped: bool,
}

impl TransferBreaker {
    /// Create a breaker with validated caps. Windows open at `now`.
    pub fn new(config: BreakerConfig, now: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            hourly_used: 0,
            hourly_window_start: now,
            daily_used: 0,
            daily_window_start: now,
            tripped: false,
        })
    }

    /// Check `amount` against all three caps without mutating the breaker.
    ///
    /// Returns the window state to apply via [`commit`](Self::commit) when
    /// the enclosing operation succeeds.
    pub fn check(&self, amount: u128, now: u64) -> Result<WindowCommit> {
        if amount > self.config.max_single_tx {
            return Err(Error::SingleTxLimit {
                amount,
                limit: self.config.max_single_tx,
            });
        }

        let (hourly_used, hourly_window_start) =
            effective_window(self.hourly_used, self.hourly_window_start, HOUR_SECS, now);
        let (daily_used, daily_window_start) =
            effective_window(self.daily_used, self.daily_window_start, DAY_SECS, now);

        let new_hourly = hourly_used.saturating_add(amount);
        if new_hourly > self.config.max_hourly_volume {
            return Err(Error::HourlyLimit {
                used: hourly_used,
                amount,
                limit: self.config.max_hourly_volume,
            });
        }

        let new_daily = daily_used.saturating_add(amount);
        if new_daily > self.config.max_daily_volume {
            return Err(Error::DailyLimit {
                used: daily_used,
                amount,
                limit: self.config.max_daily_volume,
            });
        }

        Ok(WindowCommit {
            hourly_used: new_hourly,
            hourly_window_start,
            daily_used: new_daily,
            daily_window_start,
        })
    }

    /// Apply a window state produced by a successful `check`.
    pub fn commit(&mut self, update: WindowCommit) {
        self.hourly_used = update.hourly_used;
        self.hourly_window_start = update.hourly_window_start;
        self.daily_used = update.daily_used;
        self.daily_window_start = update.daily_window_start;
    }

    /// Check and immediately commit, for callers with no intervening work.
    pub fn check_and_commit(&mut self, amount: u128, now: u64) -> Result<()> {
        match self.check(amount, now) {
            Ok(update) => {
                self.commit(update);
                Ok(())
            }
            Err(e) => {
                self.tripped = true;
                warn!(amount, error = %e, "circuit breaker rejected transfer");
                Err(e)
            }
        }
    }

    /// Mark the diagnostic tripped flag. Called by owners of `check`/`commit`
    /// on the rejection path; discarded along with everything else if the
    /// rejection unwinds an atomic operation.
    pub fn note_trip(&mut self) {
        self.tripped = true;
    }

    /// Manual reset: clears window counters and the tripped flag. Idempotent.
    pub fn reset(&mut self, now: u64) {
        info!("circuit breaker reset");
        self.hourly_used = 0;
        self.hourly_window_start = now;
        self.daily_used = 0;
        self.daily_window_start = now;
        self.tripped = false;
    }

    /// Replace the cap configuration.
    pub fn update_limits(&mut self, config: BreakerConfig) -> Result<()> {
        config.validate()?;
        info!(
            max_single_tx = config.max_single_tx,
            max_hourly_volume = config.max_hourly_volume,
            max_daily_volume = config.max_daily_volume,
            "circuit breaker limits updated"
        );
        self.config = config;
        Ok(())
    }

    /// Current caps and remaining headroom for both windows.
    pub fn status(&self, now: u64) -> BreakerStatus {
        let (hourly_used, _) =
            effective_window(self.hourly_used, self.hourly_window_start, HOUR_SECS, now);
        let (daily_used, _) =
            effective_window(self.daily_used, self.daily_window_start, DAY_SECS, now);

        BreakerStatus {
            config: self.config,
            hourly_used,
            hourly_remaining: self.config.max_hourly_volume.saturating_sub(hourly_used),
            daily_used,
            daily_remaining: self.config.max_daily_volume.saturating_sub(daily_used),
            tripped: self.tripped,
        }
    }

    /// Configured caps.
    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }
}

/// Resolve a window's effective counter at `now`: zeroed with a fresh start
/// once the window has fully elapsed, untouched otherwise.
fn effective_window(used: u128, window_start: u64, window_secs: u64, now: u64) -> (u128, u64) {
    if now.saturating_sub(window_start) >= window_secs {
        (0, now)
    } else {
        (used, window_start)
    }
}

/// Point-in-time breaker view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerStatus {
    /// Configured caps
    pub config: BreakerConfig,
    /// Volume committed in the current hourly window
    pub hourly_used: u128,
    /// Hourly headroom
    pub hourly_remaining: u128,
    /// Volume committed in the current daily window
    pub daily_used: u128,
    /// Daily headroom
    pub daily_remaining: u128,
    /// Diagnostic tripped flag (rejection, not this flag, is authoritative)
    pub tripped: bool,
}
