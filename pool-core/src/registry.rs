//! Principal accounting
//!
//! The registry owns depositor principals and the pool-wide total, plus the
//! claimable balances credited at harvest time. Conservation invariant:
//! the sum of all principals equals `total_principal` after every commit.
//! `BTreeMap` keeps harvest iteration deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::math;
use crate::types::{AccountId, Amount};
use crate::{Error, Result};

/// Depositor principals and harvest-credited claimables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StakeRegistry {
    principals: BTreeMap<AccountId, Amount>,
    claimables: BTreeMap<AccountId, Amount>,
    total_principal: Amount,
}

impl StakeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the depositor's principal and the pool total.
    pub fn deposit(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        let principal = self.principals.get(account).copied().unwrap_or(0);
        let new_principal = math::add(principal, amount, "depositor principal")?;
        let new_total = math::add(self.total_principal, amount, "total principal")?;

        self.principals.insert(account.clone(), new_principal);
        self.total_principal = new_total;
        Ok(())
    }

    /// Remove `amount` from the depositor's principal and the pool total.
    ///
    /// A withdrawal may never exceed the depositor's own principal.
    pub fn withdraw(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        let principal = self.principals.get(account).copied().unwrap_or(0);
        if amount > principal {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available: principal,
            });
        }

        let remaining = principal - amount;
        if remaining == 0 {
            self.principals.remove(account);
        } else {
            self.principals.insert(account.clone(), remaining);
        }
        // total >= principal >= amount, cannot underflow
        self.total_principal -= amount;
        Ok(())
    }

    /// The depositor's principal, zero if unknown.
    pub fn principal_of(&self, account: &AccountId) -> Amount {
        self.principals.get(account).copied().unwrap_or(0)
    }

    /// Sum of all depositor principals.
    pub fn total_principal(&self) -> Amount {
        self.total_principal
    }

    /// Number of depositors with nonzero principal.
    pub fn depositor_count(&self) -> usize {
        self.principals.len()
    }

    /// Active depositors in deterministic (key) order.
    pub fn iter_active(&self) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.principals.iter().map(|(k, v)| (k, *v))
    }

    /// Credit harvest yield to the depositor's claimable balance.
    pub fn credit_yield(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        let claimable = self.claimables.get(account).copied().unwrap_or(0);
        let new_claimable = math::add(claimable, amount, "claimable balance")?;
        self.claimables.insert(account.clone(), new_claimable);
        Ok(())
    }

    /// Drain the depositor's claimable balance, returning it.
    pub fn take_claimable(&mut self, account: &AccountId) -> Amount {
        self.claimables.remove(account).unwrap_or(0)
    }

    /// The depositor's claimable balance from past harvests.
    pub fn claimable_of(&self, account: &AccountId) -> Amount {
        self.claimables.get(account).copied().unwrap_or(0)
    }

    /// Verify the conservation invariant; true when principals sum to the
    /// stored total.
    pub fn check_conservation(&self) -> bool {
        let sum: Amount = self.principals.values().sum();
        sum == self.total_principal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn bob() -> AccountId {
        AccountId::new("bob")
    }

    #[test]
    fn test_deposit_accumulates() {
        let mut registry = StakeRegistry::new();
        registry.deposit(&alice(), 100).unwrap();
        registry.deposit(&alice(), 50).unwrap();
        registry.deposit(&bob(), 200).unwrap();

        assert_eq!(registry.principal_of(&alice()), 150);
        assert_eq!(registry.principal_of(&bob()), 200);
        assert_eq!(registry.total_principal(), 350);
        assert!(registry.check_conservation());
    }

    #[test]
    fn test_withdraw_bounded_by_own_principal() {
        let mut registry = StakeRegistry::new();
        registry.deposit(&alice(), 100).unwrap();
        registry.deposit(&bob(), 500).unwrap();

        // bob's principal provides no cover for alice
        let err = registry.withdraw(&alice(), 101).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientBalance {
                requested: 101,
                available: 100
            }
        ));

        registry.withdraw(&alice(), 100).unwrap();
        assert_eq!(registry.principal_of(&alice()), 0);
        assert_eq!(registry.total_principal(), 500);
        assert!(registry.check_conservation());
    }

    #[test]
    fn test_full_exit_removes_depositor() {
        let mut registry = StakeRegistry::new();
        registry.deposit(&alice(), 100).unwrap();
        registry.withdraw(&alice(), 100).unwrap();

        assert_eq!(registry.depositor_count(), 0);
        assert_eq!(registry.iter_active().count(), 0);
    }

    #[test]
    fn test_claimable_survives_full_exit() {
        let mut registry = StakeRegistry::new();
        registry.deposit(&alice(), 100).unwrap();
        registry.credit_yield(&alice(), 40).unwrap();
        registry.withdraw(&alice(), 100).unwrap();

        assert_eq!(registry.claimable_of(&alice()), 40);
        assert_eq!(registry.take_claimable(&alice()), 40);
        assert_eq!(registry.take_claimable(&alice()), 0);
    }

    #[test]
    fn test_iteration_is_deterministic() {
        let mut registry = StakeRegistry::new();
        registry.deposit(&bob(), 1).unwrap();
        registry.deposit(&alice(), 2).unwrap();

        let order: Vec<_> = registry.iter_active().map(|(a, _)| a.clone()).collect();
        assert_eq!(order, vec![alice(), bob()]);
    }
}
