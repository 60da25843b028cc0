//! Proposal lifecycle management.
//!
//! Proposals go through states: Active -> Passed/Rejected -> Executed, or
//! Active -> Cancelled. Passed/Executed may only be swapped back by the
//! coordinator unwinding its own failed payout.

use crate::error::GovernanceError;
use crate::tally::{self, Decision};
use coffer_types::{Address, Amount, ProposalId, Timestamp};
use std::collections::HashMap;
use std::fmt;

/// Proposal status in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalStatus {
    /// Voting is open
    Active,
    /// Finalized with quorum and a strict majority for
    Passed,
    /// Finalized without quorum or majority
    Rejected,
    /// Funds were paid out
    Executed,
    /// Withdrawn by its proposer or an administrator
    Cancelled,
}

impl ProposalStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ProposalStatus::Active)
    }

    /// Check if the proposal can be paid out.
    pub fn is_executable(&self) -> bool {
        matches!(self, ProposalStatus::Passed)
    }

    /// No further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Rejected | ProposalStatus::Executed | ProposalStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Active => "active",
            ProposalStatus::Passed => "passed",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Executed => "executed",
            ProposalStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied part of a proposal, validated before an id is allocated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalDraft {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub destination: Address,
    pub amount: Amount,
}

impl ProposalDraft {
    pub fn validate(&self, max_options: u32) -> Result<(), GovernanceError> {
        if self.title.trim().is_empty() {
            return Err(GovernanceError::InvalidParams("Title cannot be empty".into()));
        }
        if self.options.len() < 2 {
            return Err(GovernanceError::InvalidParams(format!(
                "At least 2 options required, got {}",
                self.options.len()
            )));
        }
        if self.options.len() > max_options as usize {
            return Err(GovernanceError::InvalidParams(format!(
                "At most {} options allowed, got {}",
                max_options,
                self.options.len()
            )));
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(GovernanceError::InvalidParams(format!("Option {} is empty", index)));
        }
        if self.destination.is_zero() {
            return Err(GovernanceError::InvalidParams(
                "Destination cannot be the zero address".into(),
            ));
        }
        Ok(())
    }
}

/// A funding proposal and its votes.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Address,
    pub title: String,
    pub description: String,
    pub destination: Address,
    pub requested_amount: Amount,
    /// Option labels; option 0 counts as "for", any other as "against"
    pub options: Vec<String>,
    pub option_votes: Vec<u64>,
    pub votes_for: u64,
    pub votes_against: u64,
    pub status: ProposalStatus,
    pub created_at: Timestamp,
    pub deadline: Timestamp,
    /// Member count at creation, for quorum calculation
    pub member_snapshot: u64,
    pub finalized_at: Option<Timestamp>,
    pub executed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    votes: HashMap<Address, u32>,
}

impl Proposal {
    /// Create an active proposal from an already validated draft.
    pub fn new(
        id: ProposalId,
        proposer: Address,
        draft: ProposalDraft,
        created_at: Timestamp,
        deadline: Timestamp,
        member_snapshot: u64,
    ) -> Self {
        let option_count = draft.options.len();
        Self {
            id,
            proposer,
            title: draft.title,
            description: draft.description,
            destination: draft.destination,
            requested_amount: draft.amount,
            options: draft.options,
            option_votes: vec![0; option_count],
            votes_for: 0,
            votes_against: 0,
            status: ProposalStatus::Active,
            created_at,
            deadline,
            member_snapshot,
            finalized_at: None,
            executed_at: None,
            cancelled_at: None,
            votes: HashMap::new(),
        }
    }

    pub fn option_count(&self) -> u32 {
        self.options.len() as u32
    }

    /// Cast a vote.
    pub fn cast_vote(
        &mut self,
        voter: Address,
        option: u32,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if !self.status.is_active() {
            return Err(GovernanceError::ProposalNotActive {
                proposal_id: self.id,
                status: self.status,
            });
        }
        if now > self.deadline {
            return Err(GovernanceError::VotingClosed {
                proposal_id: self.id,
                deadline: self.deadline,
                now,
            });
        }
        if self.votes.contains_key(&voter) {
            return Err(GovernanceError::AlreadyVoted {
                proposal_id: self.id,
                voter,
            });
        }
        if option >= self.option_count() {
            return Err(GovernanceError::InvalidOption {
                proposal_id: self.id,
                option,
                options: self.option_count(),
            });
        }

        let weight = tally::vote_weight(&voter);
        self.option_votes[option as usize] += weight;
        if option == 0 {
            self.votes_for += weight;
        } else {
            self.votes_against += weight;
        }
        self.votes.insert(voter, option);
        Ok(())
    }

    /// Close voting and decide the outcome.
    pub fn finalize(&mut self, now: Timestamp, quorum_bps: u16) -> Result<Decision, GovernanceError> {
        if !self.status.is_active() {
            return Err(GovernanceError::ProposalNotActive {
                proposal_id: self.id,
                status: self.status,
            });
        }
        if now <= self.deadline {
            return Err(GovernanceError::VotingClosed {
                proposal_id: self.id,
                deadline: self.deadline,
                now,
            });
        }

        let decision = tally::decide(
            self.votes_for,
            self.votes_against,
            self.quorum_needed(quorum_bps),
        );
        self.status = if decision.passed() {
            ProposalStatus::Passed
        } else {
            ProposalStatus::Rejected
        };
        self.finalized_at = Some(now);
        Ok(decision)
    }

    pub fn cancel(&mut self, now: Timestamp) -> Result<(), GovernanceError> {
        if !self.status.is_active() {
            return Err(GovernanceError::ProposalNotActive {
                proposal_id: self.id,
                status: self.status,
            });
        }
        self.status = ProposalStatus::Cancelled;
        self.cancelled_at = Some(now);
        Ok(())
    }

    pub fn mark_executed(&mut self, now: Timestamp) -> Result<(), GovernanceError> {
        if !self.status.is_executable() {
            return Err(GovernanceError::ProposalNotPassed {
                proposal_id: self.id,
                status: self.status,
            });
        }
        self.status = ProposalStatus::Executed;
        self.executed_at = Some(now);
        Ok(())
    }

    /// Undo [`Proposal::mark_executed`].
    pub fn revert_execution(&mut self) -> Result<(), GovernanceError> {
        if self.status != ProposalStatus::Executed {
            return Err(GovernanceError::InvalidTransition {
                proposal_id: self.id,
                from: self.status,
                to: ProposalStatus::Passed,
            });
        }
        self.status = ProposalStatus::Passed;
        self.executed_at = None;
        Ok(())
    }

    pub fn quorum_needed(&self, quorum_bps: u16) -> u64 {
        tally::quorum_needed(self.member_snapshot, quorum_bps)
    }

    pub fn vote_of(&self, voter: &Address) -> Option<u32> {
        self.votes.get(voter).copied()
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.votes.contains_key(voter)
    }

    pub fn total_votes(&self) -> u64 {
        self.votes_for + self.votes_against
    }

    /// Option with the most votes; ties go to the lowest index. `None` until
    /// someone votes.
    pub fn leading_option(&self) -> Option<u32> {
        if self.total_votes() == 0 {
            return None;
        }
        let mut best = 0usize;
        for (index, count) in self.option_votes.iter().enumerate() {
            if *count > self.option_votes[best] {
                best = index;
            }
        }
        Some(best as u32)
    }
}
