//! Outbound adapter seams
//!
//! The engine never talks to a protocol or token directly; it calls these
//! two narrow traits. Production wires real integrations behind them, tests
//! and local runs use the deterministic [`mock`] implementations.

use crate::types::{AccountId, Amount};
use crate::Result;

/// A yield-bearing venue holding supplied principal.
///
/// Accrued yield is reported by `pending_yield` and realized by `withdraw`;
/// the engine never assumes yield materializes without an explicit pull.
pub trait YieldSource: Send {
    /// Supply `amount` of principal into the source.
    fn supply(&mut self, amount: Amount) -> Result<()>;

    /// Withdraw `amount` from the source into the engine's custody.
    fn withdraw(&mut self, amount: Amount) -> Result<()>;

    /// Yield accrued and not yet withdrawn.
    fn pending_yield(&self) -> Result<Amount>;
}

/// Value transfer out of the engine's custody.
pub trait TokenTransfer: Send {
    /// Transfer `amount` from the engine's custody to `to`.
    fn transfer(&mut self, to: &AccountId, amount: Amount) -> Result<()>;

    /// Balance held by `account`.
    fn balance_of(&self, account: &AccountId) -> Result<Amount>;
}

/// Deterministic in-memory adapters for tests, examples, and local runs.
pub mod mock {
    use super::{TokenTransfer, YieldSource};
    use crate::types::{AccountId, Amount};
    use crate::{math, Error, Result};
    use std::collections::BTreeMap;

    /// In-memory yield source: yield accrues only when the test says so.
    #[derive(Debug, Default)]
    pub struct MockYieldSource {
        supplied: Amount,
        pending: Amount,
    }

    impl MockYieldSource {
        /// Create an empty source.
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate yield accrual of `amount`.
        pub fn accrue(&mut self, amount: Amount) {
            self.pending += amount;
        }

        /// Principal currently supplied.
        pub fn supplied(&self) -> Amount {
            self.supplied
        }
    }

    impl YieldSource for MockYieldSource {
        fn supply(&mut self, amount: Amount) -> Result<()> {
            self.supplied = math::add(self.supplied, amount, "mock supplied")?;
            Ok(())
        }

        fn withdraw(&mut self, amount: Amount) -> Result<()> {
            // Yield is drawn down before principal, mirroring how a venue
            // realizes accrued interest first.
            if amount <= self.pending {
                self.pending -= amount;
                return Ok(());
            }
            let principal_part = amount - self.pending;
            if principal_part > self.supplied {
                return Err(Error::Adapter(format!(
                    "mock source holds {}, withdrawal of {} requested",
                    self.supplied + self.pending,
                    amount
                )));
            }
            self.pending = 0;
            self.supplied -= principal_part;
            Ok(())
        }

        fn pending_yield(&self) -> Result<Amount> {
            Ok(self.pending)
        }
    }

    /// In-memory token ledger with a custody balance for the engine.
    #[derive(Debug, Default)]
    pub struct MockToken {
        custody: Amount,
        balances: BTreeMap<AccountId, Amount>,
    }

    impl MockToken {
        /// Create an empty token ledger.
        pub fn new() -> Self {
            Self::default()
        }

        /// Mint `amount` directly into the engine's custody.
        pub fn fund_custody(&mut self, amount: Amount) {
            self.custody += amount;
        }

        /// Engine custody balance.
        pub fn custody(&self) -> Amount {
            self.custody
        }
    }

    impl TokenTransfer for MockToken {
        fn transfer(&mut self, to: &AccountId, amount: Amount) -> Result<()> {
            if amount > self.custody {
                return Err(Error::Adapter(format!(
                    "custody holds {}, transfer of {} requested",
                    self.custody, amount
                )));
            }
            self.custody -= amount;
            let balance = self.balances.entry(to.clone()).or_insert(0);
            *balance = math::add(*balance, amount, "mock balance")?;
            Ok(())
        }

        fn balance_of(&self, account: &AccountId) -> Result<Amount> {
            Ok(self.balances.get(account).copied().unwrap_or(0))
        }
    }

}
