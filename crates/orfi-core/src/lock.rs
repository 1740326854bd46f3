//! Per-month closed/open flags.

use std::collections::BTreeSet;

use orfi_domain::MonthKey;

use crate::CoreError;

/// Whether closed months reject mutations inside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockPolicy {
    /// Mutations on a closed month fail with [`CoreError::MonthClosed`].
    #[default]
    Enforced,
    /// Flags are stored but never consulted; callers decide what to do.
    Advisory,
}

/// Closed months, independent of whether their ledger data exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthLockRegistry {
    closed: BTreeSet<MonthKey>,
}

impl MonthLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_closed(closed: impl IntoIterator<Item = MonthKey>) -> Self {
        Self {
            closed: closed.into_iter().collect(),
        }
    }

    pub fn is_closed(&self, key: MonthKey) -> bool {
        self.closed.contains(&key)
    }

    /// Returns `true` when the flag actually changed.
    pub fn set_closed(&mut self, key: MonthKey, closed: bool) -> bool {
        if closed {
            self.closed.insert(key)
        } else {
            self.closed.remove(&key)
        }
    }

    pub fn closed_months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.closed.iter().copied()
    }

    pub fn clear(&mut self) {
        self.closed.clear();
    }

    /// Fails when `key` is closed and the policy enforces locks.
    pub fn check_writable(&self, key: MonthKey, policy: LockPolicy) -> Result<(), CoreError> {
        if policy == LockPolicy::Enforced && self.is_closed(key) {
            Err(CoreError::MonthClosed(key))
        } else {
            Ok(())
        }
    }
}
