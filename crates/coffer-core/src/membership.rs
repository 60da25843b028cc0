//! Membership gate.
//!
//! The membership directory lives outside Coffer. Components only ask
//! whether an account is currently an active participant, through an
//! injected [`MembershipGate`]. A gate that cannot answer is treated as a
//! denial.

use coffer_types::Address;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Failure to evaluate membership.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MembershipError {
    #[error("Membership directory unavailable: {0}")]
    Unavailable(String),

    #[error("Membership lookup failed for {account:x}: {reason}")]
    Lookup { account: Address, reason: String },
}

/// Read-only membership predicate.
pub trait MembershipGate: Send + Sync + fmt::Debug {
    fn is_active(&self, account: &Address) -> Result<bool, MembershipError>;
}

/// Evaluate the gate, failing closed.
pub fn admits(gate: &dyn MembershipGate, account: &Address) -> bool {
    match gate.is_active(account) {
        Ok(active) => active,
        Err(e) => {
            tracing::warn!(account = %account, error = %e, "Membership check failed, denying");
            false
        }
    }
}

/// In-memory membership directory.
#[derive(Debug, Default)]
pub struct MemberDirectory {
    members: RwLock<HashSet<Address>>,
}

impl MemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_members(members: impl IntoIterator<Item = Address>) -> Self {
        Self {
            members: RwLock::new(members.into_iter().collect()),
        }
    }

    /// Add a member. Returns false if already present.
    pub fn add(&self, account: Address) -> bool {
        self.members.write().insert(account)
    }

    /// Remove a member. Returns false if absent.
    pub fn remove(&self, account: &Address) -> bool {
        self.members.write().remove(account)
    }

    pub fn contains(&self, account: &Address) -> bool {
        self.members.read().contains(account)
    }

    /// Number of active members, suitable as a quorum snapshot.
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

impl MembershipGate for MemberDirectory {
    fn is_active(&self, account: &Address) -> Result<bool, MembershipError> {
        Ok(self.contains(account))
    }
}
