//! Audit events emitted on every state transition.
//!
//! The event stream is sufficient to reconstruct the full history of the
//! treasury without replaying internal component state.

use crate::{Address, Amount, LogId, ProposalId, Timestamp};

/// A single state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Event {
    /// Member credited the pool
    Deposited {
        account: Address,
        amount: Amount,
        new_balance: Amount,
    },
    /// Member withdrew part of their credit
    Withdrawn {
        account: Address,
        amount: Amount,
        new_balance: Amount,
    },
    /// Value arrived without a deposit (surplus)
    ExternalInflow { amount: Amount },
    /// Pooled funds left the treasury on a privileged allocation
    FundsAllocated {
        destination: Address,
        amount: Amount,
        caller: Address,
    },
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: Address,
        destination: Address,
        amount: Amount,
        deadline: Timestamp,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        option: u32,
    },
    ProposalFinalized {
        proposal_id: ProposalId,
        passed: bool,
        votes_for: u64,
        votes_against: u64,
        quorum_needed: u64,
    },
    ProposalCancelled {
        proposal_id: ProposalId,
        cancelled_by: Address,
    },
    ProposalExecuted { proposal_id: ProposalId },
    /// Coordinator completed a payout and wrote the audit log entry
    ProposalPaidOut {
        proposal_id: ProposalId,
        destination: Address,
        amount: Amount,
        log_id: LogId,
        executed_by: Address,
    },
    AdminGranted { account: Address, granted_by: Address },
    AdminRevoked { account: Address, revoked_by: Address },
    Paused { by: Address },
    Unpaused { by: Address },
    ExecutorRegistered {
        component: String,
        executor: Address,
    },
    ParameterChanged {
        name: String,
        value: u64,
        changed_by: Address,
    },
}

/// Discriminant of an [`Event`], used for journal queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Deposited,
    Withdrawn,
    ExternalInflow,
    FundsAllocated,
    ProposalCreated,
    VoteCast,
    ProposalFinalized,
    ProposalCancelled,
    ProposalExecuted,
    ProposalPaidOut,
    AdminGranted,
    AdminRevoked,
    Paused,
    Unpaused,
    ExecutorRegistered,
    ParameterChanged,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Deposited { .. } => EventKind::Deposited,
            Event::Withdrawn { .. } => EventKind::Withdrawn,
            Event::ExternalInflow { .. } => EventKind::ExternalInflow,
            Event::FundsAllocated { .. } => EventKind::FundsAllocated,
            Event::ProposalCreated { .. } => EventKind::ProposalCreated,
            Event::VoteCast { .. } => EventKind::VoteCast,
            Event::ProposalFinalized { .. } => EventKind::ProposalFinalized,
            Event::ProposalCancelled { .. } => EventKind::ProposalCancelled,
            Event::ProposalExecuted { .. } => EventKind::ProposalExecuted,
            Event::ProposalPaidOut { .. } => EventKind::ProposalPaidOut,
            Event::AdminGranted { .. } => EventKind::AdminGranted,
            Event::AdminRevoked { .. } => EventKind::AdminRevoked,
            Event::Paused { .. } => EventKind::Paused,
            Event::Unpaused { .. } => EventKind::Unpaused,
            Event::ExecutorRegistered { .. } => EventKind::ExecutorRegistered,
            Event::ParameterChanged { .. } => EventKind::ParameterChanged,
        }
    }

    /// Proposal this event refers to, if any.
    pub fn proposal_id(&self) -> Option<ProposalId> {
        match self {
            Event::ProposalCreated { proposal_id, .. }
            | Event::VoteCast { proposal_id, .. }
            | Event::ProposalFinalized { proposal_id, .. }
            | Event::ProposalCancelled { proposal_id, .. }
            | Event::ProposalExecuted { proposal_id }
            | Event::ProposalPaidOut { proposal_id, .. } => Some(*proposal_id),
            _ => None,
        }
    }

    /// Check whether `account` appears anywhere in the event.
    pub fn involves(&self, account: &Address) -> bool {
        match self {
            Event::Deposited { account: a, .. } | Event::Withdrawn { account: a, .. } => a == account,
            Event::ExternalInflow { .. }
            | Event::ProposalFinalized { .. }
            | Event::ProposalExecuted { .. } => false,
            Event::FundsAllocated { destination, caller, .. } => {
                destination == account || caller == account
            }
            Event::ProposalCreated { proposer, destination, .. } => {
                proposer == account || destination == account
            }
            Event::VoteCast { voter, .. } => voter == account,
            Event::ProposalCancelled { cancelled_by, .. } => cancelled_by == account,
            Event::ProposalPaidOut { destination, executed_by, .. } => {
                destination == account || executed_by == account
            }
            Event::AdminGranted { account: a, granted_by } => a == account || granted_by == account,
            Event::AdminRevoked { account: a, revoked_by } => a == account || revoked_by == account,
            Event::Paused { by } | Event::Unpaused { by } => by == account,
            Event::ExecutorRegistered { executor, .. } => executor == account,
            Event::ParameterChanged { changed_by, .. } => changed_by == account,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queries() {
        let voter = Address::from_bytes([1u8; 20]);
        let event = Event::VoteCast { proposal_id: 4, voter, option: 0 };

        assert_eq!(event.kind(), EventKind::VoteCast);
        assert_eq!(event.proposal_id(), Some(4));
        assert!(event.involves(&voter));
        assert!(!event.involves(&Address::ZERO));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_event_json_is_keyed_by_kind() {
        let event = Event::ProposalExecuted { proposal_id: 9 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["proposal_executed"]["proposal_id"], 9);

        let deposit = Event::Deposited {
            account: Address::from_bytes([3u8; 20]),
            amount: u128::from(u64::MAX) + 1,
            new_balance: u128::from(u64::MAX) + 1,
        };
        let text = serde_json::to_string(&deposit).unwrap();
        let back: Event = serde_json::from_str(&text).unwrap();
        assert_eq!(back, deposit);
    }
}
