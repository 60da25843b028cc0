use coffer_core::CoreError;
use coffer_governance::{GovernanceError, ProposalStatus};
use coffer_ledger::LedgerError;
use coffer_types::{ErrorCategory, LogId, ProposalId};
use thiserror::Error;

/// Errors that can occur while executing a proposal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Proposal {proposal_id} is {status}, not passed")]
    ProposalNotPassed {
        proposal_id: ProposalId,
        status: ProposalStatus,
    },

    #[error("Proposal {proposal_id} already executed as log entry {log_id}")]
    AlreadyExecuted { proposal_id: ProposalId, log_id: LogId },

    #[error("Reentrant call into coordinator::{entry_point} while {active} is executing")]
    Reentrant {
        entry_point: &'static str,
        active: &'static str,
    },

    #[error("Operation {action} rejected: system is paused")]
    Paused { action: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExecutionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExecutionError::Ledger(e) => e.category(),
            ExecutionError::Governance(e) => e.category(),
            ExecutionError::ProposalNotFound(_)
            | ExecutionError::ProposalNotPassed { .. }
            | ExecutionError::AlreadyExecuted { .. } => ErrorCategory::StateConflict,
            ExecutionError::Reentrant { .. } => ErrorCategory::Reentrancy,
            ExecutionError::Paused { .. } => ErrorCategory::Halted,
            ExecutionError::InvalidConfig(_) => ErrorCategory::Validation,
        }
    }
}

impl From<CoreError> for ExecutionError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Reentrant {
                entry_point,
                active,
                ..
            } => ExecutionError::Reentrant { entry_point, active },
            CoreError::Paused { action } => ExecutionError::Paused { action },
            CoreError::InvalidConfig(msg) => ExecutionError::InvalidConfig(msg),
            other => ExecutionError::InvalidConfig(other.to_string()),
        }
    }
}
