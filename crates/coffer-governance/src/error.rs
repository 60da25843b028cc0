use crate::proposal::ProposalStatus;
use coffer_core::CoreError;
use coffer_types::{Address, ErrorCategory, ProposalId, Timestamp};
use thiserror::Error;

/// Errors that can occur in governance operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("Account {0:x} is not an active member")]
    NotMember(Address),

    #[error("Unauthorized: {caller:x} may not {action}")]
    Unauthorized { caller: Address, action: String },

    #[error("Invalid proposal parameters: {0}")]
    InvalidParams(String),

    #[error("Option {option} out of range for proposal {proposal_id} with {options} options")]
    InvalidOption {
        proposal_id: ProposalId,
        option: u32,
        options: u32,
    },

    #[error("{name} = {value} outside [{min}, {max}]")]
    InvalidRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Proposal {proposal_id} is {status}, not active")]
    ProposalNotActive {
        proposal_id: ProposalId,
        status: ProposalStatus,
    },

    #[error("Voting window of proposal {proposal_id} ends at {deadline} (now {now})")]
    VotingClosed {
        proposal_id: ProposalId,
        deadline: Timestamp,
        now: Timestamp,
    },

    #[error("{voter:x} already voted on proposal {proposal_id}")]
    AlreadyVoted { proposal_id: ProposalId, voter: Address },

    #[error("Proposal {proposal_id} is {status}, not passed")]
    ProposalNotPassed {
        proposal_id: ProposalId,
        status: ProposalStatus,
    },

    #[error("Proposal {proposal_id} cannot move from {from} to {to}")]
    InvalidTransition {
        proposal_id: ProposalId,
        from: ProposalStatus,
        to: ProposalStatus,
    },

    #[error("Operation {action} rejected: system is paused")]
    Paused { action: &'static str },
}

impl GovernanceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GovernanceError::NotMember(_) | GovernanceError::Unauthorized { .. } => {
                ErrorCategory::Authorization
            }
            GovernanceError::InvalidParams(_)
            | GovernanceError::InvalidOption { .. }
            | GovernanceError::InvalidRange { .. } => ErrorCategory::Validation,
            GovernanceError::ProposalNotFound(_)
            | GovernanceError::ProposalNotActive { .. }
            | GovernanceError::VotingClosed { .. }
            | GovernanceError::AlreadyVoted { .. }
            | GovernanceError::ProposalNotPassed { .. }
            | GovernanceError::InvalidTransition { .. } => ErrorCategory::StateConflict,
            GovernanceError::Paused { .. } => ErrorCategory::Halted,
        }
    }
}

impl From<CoreError> for GovernanceError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Unauthorized { caller, action } => {
                GovernanceError::Unauthorized { caller, action }
            }
            CoreError::Paused { action } => GovernanceError::Paused { action },
            other => GovernanceError::InvalidParams(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voting_closed_reports_times() {
        let err = GovernanceError::VotingClosed {
            proposal_id: 7,
            deadline: 1_000,
            now: 1_200,
        };
        let msg = err.to_string();
        assert!(msg.contains("1000"));
        assert!(msg.contains("1200"));
        assert_eq!(err.category(), ErrorCategory::StateConflict);
    }

    #[test]
    fn test_core_error_conversion() {
        let err: GovernanceError = CoreError::Paused { action: "vote" }.into();
        assert_eq!(err, GovernanceError::Paused { action: "vote" });
        assert_eq!(err.category(), ErrorCategory::Halted);
    }
}
