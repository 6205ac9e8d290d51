//! Yield split policy
//!
//! A policy-wide default split plus per-depositor overrides. An override is
//! depositor-scoped, not position-scoped: it can only be set while the
//! depositor holds principal, but once set it survives a full withdrawal and
//! later redeposit until explicitly cleared.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{AccountId, Amount, YieldSplit};
use crate::{Error, Result};

/// Default and per-depositor yield splits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPolicy {
    default: YieldSplit,
    overrides: BTreeMap<AccountId, YieldSplit>,
}

impl SplitPolicy {
    /// Create a policy with a validated default split.
    pub fn new(default: YieldSplit) -> Result<Self> {
        default.validate()?;
        Ok(Self {
            default,
            overrides: BTreeMap::new(),
        })
    }

    /// Set a depositor override. Requires live principal: there is nothing
    /// to configure for an account with no stake.
    pub fn set_override(
        &mut self,
        account: &AccountId,
        split: YieldSplit,
        principal: Amount,
    ) -> Result<()> {
        split.validate()?;
        if principal == 0 {
            return Err(Error::NoStakeToConfigure);
        }
        self.overrides.insert(account.clone(), split);
        Ok(())
    }

    /// Clear a depositor override, reverting to the policy default.
    pub fn clear_override(&mut self, account: &AccountId) {
        self.overrides.remove(account);
    }

    /// The split in effect for a depositor.
    pub fn effective(&self, account: &AccountId) -> YieldSplit {
        self.overrides.get(account).copied().unwrap_or(self.default)
    }

    /// Replace the policy default. Existing overrides are untouched.
    pub fn set_default(&mut self, split: YieldSplit) -> Result<()> {
        split.validate()?;
        self.default = split;
        Ok(())
    }

    /// The current policy default.
    pub fn default_split(&self) -> YieldSplit {
        self.default
    }

    /// Whether the depositor has an override set.
    pub fn has_override(&self, account: &AccountId) -> bool {
        self.overrides.contains_key(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SplitPolicy {
        SplitPolicy::new(YieldSplit::new(7_900, 1_900, 200).unwrap()).unwrap()
    }

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    #[test]
    fn test_effective_defaults() {
        let policy = policy();
        assert_eq!(
            policy.effective(&alice()),
            YieldSplit::new(7_900, 1_900, 200).unwrap()
        );
    }

    #[test]
    fn test_override_requires_principal() {
        let mut policy = policy();
        let custom = YieldSplit::new(5_000, 4_800, 200).unwrap();

        let err = policy.set_override(&alice(), custom, 0).unwrap_err();
        assert!(matches!(err, Error::NoStakeToConfigure));

        policy.set_override(&alice(), custom, 100).unwrap();
        assert_eq!(policy.effective(&alice()), custom);
    }

    #[test]
    fn test_override_validated() {
        let mut policy = policy();
        let invalid = YieldSplit {
            cause_bps: 9_000,
            depositor_bps: 900,
            platform_bps: 50,
        };
        assert!(policy.set_override(&alice(), invalid, 100).is_err());
    }

    #[test]
    fn test_clear_reverts_to_default() {
        let mut policy = policy();
        let custom = YieldSplit::new(5_000, 4_800, 200).unwrap();
        policy.set_override(&alice(), custom, 100).unwrap();

        policy.clear_override(&alice());
        assert_eq!(policy.effective(&alice()), policy.default_split());
    }

    #[test]
    fn test_default_change_leaves_overrides() {
        let mut policy = policy();
        let custom = YieldSplit::new(5_000, 4_800, 200).unwrap();
        policy.set_override(&alice(), custom, 100).unwrap();

        policy
            .set_default(YieldSplit::new(6_000, 3_800, 200).unwrap())
            .unwrap();

        assert_eq!(policy.effective(&alice()), custom);
        assert_eq!(
            policy.effective(&AccountId::new("bob")),
            YieldSplit::new(6_000, 3_800, 200).unwrap()
        );
    }
}
