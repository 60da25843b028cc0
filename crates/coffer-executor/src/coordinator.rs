//! Execution coordinator.
//!
//! Pays out passed proposals. Authorization lives in the governance engine
//! and fund movement in the ledger; the coordinator joins the two so that a
//! proposal is paid at most once and a payout never happens without its log
//! entry.

use crate::error::ExecutionError;
use crate::log::{ExecutionLog, LogEntry};
use coffer_core::{AccessControl, CallScope, Clock, EventJournal, ReentrancyGuard};
use coffer_governance::GovernanceEngine;
use coffer_ledger::TreasuryLedger;
use coffer_types::{Address, Event, LogId, ProposalId};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug)]
pub struct ExecutionCoordinator {
    /// Identity registered as executor on the ledger and the engine
    address: Address,
    ledger: Arc<TreasuryLedger>,
    governance: Arc<GovernanceEngine>,
    access: Arc<AccessControl>,
    clock: Arc<dyn Clock>,
    journal: Arc<EventJournal>,
    guard: ReentrancyGuard,
    log: RwLock<ExecutionLog>,
}

impl ExecutionCoordinator {
    pub fn new(
        address: Address,
        ledger: Arc<TreasuryLedger>,
        governance: Arc<GovernanceEngine>,
        access: Arc<AccessControl>,
        clock: Arc<dyn Clock>,
        journal: Arc<EventJournal>,
    ) -> Self {
        Self {
            address,
            ledger,
            governance,
            access,
            clock,
            journal,
            guard: ReentrancyGuard::new("coordinator"),
            log: RwLock::new(ExecutionLog::new()),
        }
    }

    /// Pay out a passed proposal and return its log id. Callable by anyone.
    ///
    /// The proposal is marked executed before funds move. If the allocation
    /// fails the mark is reverted and the ledger error is returned, leaving
    /// the proposal `Passed` and retryable. `ProposalExecuted` and
    /// `ProposalPaidOut` are journaled only after the payout succeeds.
    pub fn execute(&self, proposal_id: ProposalId, caller: Address) -> Result<LogId, ExecutionError> {
        let _scope = CallScope::enter(&self.guard, "execute", caller)?;
        self.access.ensure_running("execute")?;

        let proposal = self
            .governance
            .get_proposal(proposal_id)
            .ok_or(ExecutionError::ProposalNotFound(proposal_id))?;

        let logged = self.log.read().log_id_for(proposal_id);
        if let Some(log_id) = logged {
            return Err(ExecutionError::AlreadyExecuted {
                proposal_id,
                log_id,
            });
        }
        if !proposal.status.is_executable() {
            return Err(ExecutionError::ProposalNotPassed {
                proposal_id,
                status: proposal.status,
            });
        }

        let destination = proposal.destination;
        let amount = proposal.requested_amount;

        self.governance.mark_executed(proposal_id, self.address)?;

        if let Err(e) = self.ledger.allocate(destination, amount, self.address) {
            if let Err(revert) = self.governance.revert_execution(proposal_id, self.address) {
                tracing::error!(proposal_id, error = %revert, "Failed to revert proposal execution");
            }
            tracing::warn!(proposal_id, error = %e, "Execution aborted, allocation failed");
            return Err(e.into());
        }

        let entry = self.log.write().append(
            proposal_id,
            destination,
            amount,
            self.clock.now(),
            caller,
        );

        tracing::info!(
            proposal_id,
            log_id = entry.log_id,
            destination = %destination,
            amount,
            executed_by = %caller,
            "Proposal paid out"
        );
        self.journal.emit(Event::ProposalExecuted { proposal_id });
        self.journal.emit(Event::ProposalPaidOut {
            proposal_id,
            destination,
            amount,
            log_id: entry.log_id,
            executed_by: caller,
        });
        Ok(entry.log_id)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn log_entry(&self, log_id: LogId) -> Option<LogEntry> {
        self.log.read().get(log_id).cloned()
    }

    pub fn log_for_proposal(&self, proposal_id: ProposalId) -> Option<LogEntry> {
        self.log.read().for_proposal(proposal_id).cloned()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.log.read().entries().to_vec()
    }

    pub fn log_len(&self) -> usize {
        self.log.read().len()
    }

    pub fn verify_chain(&self) -> bool {
        self.log.read().verify_chain()
    }

    pub fn log_json_lines(&self) -> Result<String, serde_json::Error> {
        self.log.read().to_json_lines()
    }
}
