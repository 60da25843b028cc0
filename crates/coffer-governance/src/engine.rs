//! Governance engine.
//!
//! Owns every proposal and vote. Members propose and vote, anyone can
//! finalize once the voting window has passed, and only the registered
//! executor can mark a passed proposal as executed.

use crate::error::GovernanceError;
use crate::proposal::{Proposal, ProposalDraft, ProposalStatus};
use coffer_core::{admits, AccessControl, Clock, EventJournal, GovernanceConfig, MembershipGate};
use coffer_types::{Address, Amount, Event, ProposalId, BPS_DENOMINATOR};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Returned by [`GovernanceEngine::get_vote`] when an account has not voted.
pub const NO_VOTE: u32 = u32::MAX;

/// Tunable governance parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernanceParams {
    pub voting_duration: u64,
    pub quorum_bps: u16,
    /// Member count copied onto new proposals
    pub member_count: u64,
    pub max_options: u32,
}

impl GovernanceParams {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if u64::from(self.quorum_bps) > BPS_DENOMINATOR {
            return Err(GovernanceError::InvalidRange {
                name: "quorum_bps",
                value: u64::from(self.quorum_bps),
                min: 0,
                max: BPS_DENOMINATOR,
            });
        }
        if self.voting_duration == 0 {
            return Err(GovernanceError::InvalidRange {
                name: "voting_duration",
                value: 0,
                min: 1,
                max: u64::MAX,
            });
        }
        if self.max_options < 2 {
            return Err(GovernanceError::InvalidRange {
                name: "max_options",
                value: u64::from(self.max_options),
                min: 2,
                max: u64::from(u32::MAX),
            });
        }
        Ok(())
    }
}

impl From<&GovernanceConfig> for GovernanceParams {
    fn from(config: &GovernanceConfig) -> Self {
        Self {
            voting_duration: config.voting_duration_secs,
            quorum_bps: config.quorum_bps,
            member_count: config.member_count,
            max_options: config.max_options,
        }
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self::from(&GovernanceConfig::default())
    }
}

#[derive(Debug)]
struct EngineState {
    proposals: BTreeMap<ProposalId, Proposal>,
    next_id: ProposalId,
    params: GovernanceParams,
    executor: Option<Address>,
}

impl EngineState {
    fn proposal_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    fn proposal(&self, id: ProposalId) -> Result<&Proposal, GovernanceError> {
        self.proposals.get(&id).ok_or(GovernanceError::ProposalNotFound(id))
    }
}

#[derive(Debug)]
pub struct GovernanceEngine {
    access: Arc<AccessControl>,
    gate: RwLock<Arc<dyn MembershipGate>>,
    clock: Arc<dyn Clock>,
    journal: Arc<EventJournal>,
    state: RwLock<EngineState>,
}

impl GovernanceEngine {
    pub fn new(
        params: GovernanceParams,
        access: Arc<AccessControl>,
        gate: Arc<dyn MembershipGate>,
        clock: Arc<dyn Clock>,
        journal: Arc<EventJournal>,
    ) -> Result<Self, GovernanceError> {
        params.validate()?;
        Ok(Self {
            access,
            gate: RwLock::new(gate),
            clock,
            journal,
            state: RwLock::new(EngineState {
                proposals: BTreeMap::new(),
                next_id: 1,
                params,
                executor: None,
            }),
        })
    }

    /// Open a funding proposal. Voting closes `voting_duration` seconds
    /// from now.
    pub fn create_proposal(
        &self,
        proposer: Address,
        title: impl Into<String>,
        description: impl Into<String>,
        options: Vec<String>,
        destination: Address,
        amount: Amount,
    ) -> Result<ProposalId, GovernanceError> {
        self.access.ensure_running("create_proposal")?;
        self.ensure_member(&proposer)?;

        let draft = ProposalDraft {
            title: title.into(),
            description: description.into(),
            options,
            destination,
            amount,
        };

        let now = self.clock.now();
        let (id, deadline) = {
            let mut state = self.state.write();
            draft.validate(state.params.max_options)?;

            let id = state.next_id;
            state.next_id += 1;
            let deadline = now.saturating_add(state.params.voting_duration);
            let member_snapshot = state.params.member_count;

            state.proposals.insert(
                id,
                Proposal::new(id, proposer, draft, now, deadline, member_snapshot),
            );
            (id, deadline)
        };

        tracing::info!(proposal_id = id, proposer = %proposer, amount, deadline, "Proposal created");
        self.journal.emit(Event::ProposalCreated {
            proposal_id: id,
            proposer,
            destination,
            amount,
            deadline,
        });
        Ok(id)
    }

    /// Record `account`'s choice of `option` on an active proposal.
    ///
    /// Checks run in order: membership, existence, status, deadline, prior
    /// vote, option range.
    pub fn vote(
        &self,
        account: Address,
        proposal_id: ProposalId,
        option: u32,
    ) -> Result<(), GovernanceError> {
        self.access.ensure_running("vote")?;
        self.ensure_member(&account)?;

        let now = self.clock.now();
        self.state
            .write()
            .proposal_mut(proposal_id)?
            .cast_vote(account, option, now)?;

        tracing::debug!(proposal_id, voter = %account, option, "Vote cast");
        self.journal.emit(Event::VoteCast {
            proposal_id,
            voter: account,
            option,
        });
        Ok(())
    }

    /// Close voting on a proposal whose deadline has passed. Callable by
    /// anyone, exactly once.
    pub fn finalize(&self, proposal_id: ProposalId) -> Result<ProposalStatus, GovernanceError> {
        self.access.ensure_running("finalize")?;

        let now = self.clock.now();
        let (status, decision, votes_for, votes_against, quorum_needed) = {
            let mut state = self.state.write();
            let quorum_bps = state.params.quorum_bps;
            let proposal = state.proposal_mut(proposal_id)?;
            let decision = proposal.finalize(now, quorum_bps)?;
            (
                proposal.status,
                decision,
                proposal.votes_for,
                proposal.votes_against,
                proposal.quorum_needed(quorum_bps),
            )
        };

        tracing::info!(
            proposal_id,
            %status,
            ?decision,
            votes_for,
            votes_against,
            quorum_needed,
            "Proposal finalized"
        );
        self.journal.emit(Event::ProposalFinalized {
            proposal_id,
            passed: decision.passed(),
            votes_for,
            votes_against,
            quorum_needed,
        });
        Ok(status)
    }

    /// Withdraw an active proposal. Only its proposer or an administrator
    /// may cancel.
    pub fn cancel_proposal(
        &self,
        proposal_id: ProposalId,
        caller: Address,
    ) -> Result<(), GovernanceError> {
        self.access.ensure_running("cancel_proposal")?;

        let now = self.clock.now();
        {
            let mut state = self.state.write();
            let proposal = state.proposal_mut(proposal_id)?;
            if proposal.proposer != caller && !self.access.is_admin(&caller) {
                return Err(GovernanceError::Unauthorized {
                    caller,
                    action: format!("cancel proposal {}", proposal_id),
                });
            }
            proposal.cancel(now)?;
        }

        tracing::info!(proposal_id, cancelled_by = %caller, "Proposal cancelled");
        self.journal.emit(Event::ProposalCancelled {
            proposal_id,
            cancelled_by: caller,
        });
        Ok(())
    }

    /// Passed -> Executed. Registered executor only.
    ///
    /// Emits no event. The executor journals `ProposalExecuted` once the
    /// payout it guards has gone through, so an unwound attempt leaves
    /// nothing in the audit stream.
    pub fn mark_executed(
        &self,
        proposal_id: ProposalId,
        caller: Address,
    ) -> Result<(), GovernanceError> {
        let now = self.clock.now();
        {
            let mut state = self.state.write();
            ensure_executor(&state, &caller, "mark a proposal executed")?;
            state.proposal_mut(proposal_id)?.mark_executed(now)?;
        }

        tracing::debug!(proposal_id, "Proposal marked executed");
        Ok(())
    }

    /// Executed -> Passed, for the executor unwinding a payout that failed
    /// within the same call. Emits no event.
    pub fn revert_execution(
        &self,
        proposal_id: ProposalId,
        caller: Address,
    ) -> Result<(), GovernanceError> {
        let mut state = self.state.write();
        ensure_executor(&state, &caller, "revert a proposal execution")?;
        state.proposal_mut(proposal_id)?.revert_execution()?;

        tracing::warn!(proposal_id, "Proposal execution reverted");
        Ok(())
    }

    pub fn get_proposal(&self, proposal_id: ProposalId) -> Option<Proposal> {
        self.state.read().proposals.get(&proposal_id).cloned()
    }

    /// Option chosen by `account`, or [`NO_VOTE`].
    pub fn get_vote(&self, proposal_id: ProposalId, account: &Address) -> u32 {
        self.vote_of(proposal_id, account).unwrap_or(NO_VOTE)
    }

    pub fn vote_of(&self, proposal_id: ProposalId, account: &Address) -> Option<u32> {
        self.state
            .read()
            .proposals
            .get(&proposal_id)
            .and_then(|p| p.vote_of(account))
    }

    /// Per-option tallies.
    pub fn get_option_votes(&self, proposal_id: ProposalId) -> Result<Vec<u64>, GovernanceError> {
        Ok(self.state.read().proposal(proposal_id)?.option_votes.clone())
    }

    pub fn proposal_count(&self) -> u64 {
        self.state.read().proposals.len() as u64
    }

    /// Ids of proposals currently in `status`, ascending.
    pub fn proposals_by_status(&self, status: ProposalStatus) -> Vec<ProposalId> {
        self.state
            .read()
            .proposals
            .values()
            .filter(|p| p.status == status)
            .map(|p| p.id)
            .collect()
    }

    /// Turnout the proposal needs under the current quorum setting.
    pub fn quorum_needed(&self, proposal_id: ProposalId) -> Result<u64, GovernanceError> {
        let state = self.state.read();
        let quorum_bps = state.params.quorum_bps;
        Ok(state.proposal(proposal_id)?.quorum_needed(quorum_bps))
    }

    pub fn leading_option(&self, proposal_id: ProposalId) -> Result<Option<u32>, GovernanceError> {
        Ok(self.state.read().proposal(proposal_id)?.leading_option())
    }

    pub fn params(&self) -> GovernanceParams {
        self.state.read().params
    }

    pub fn executor(&self) -> Option<Address> {
        self.state.read().executor
    }

    pub fn set_executor(&self, executor: Address, caller: Address) -> Result<(), GovernanceError> {
        self.access.ensure_admin(&caller, "set governance executor")?;
        if executor.is_zero() {
            return Err(GovernanceError::InvalidParams(
                "Executor cannot be the zero address".into(),
            ));
        }

        self.state.write().executor = Some(executor);
        self.journal.emit(Event::ExecutorRegistered {
            component: "governance".to_string(),
            executor,
        });
        Ok(())
    }

    /// Update the member count used by proposals created from now on.
    pub fn set_member_count(&self, count: u64, caller: Address) -> Result<(), GovernanceError> {
        self.update_params(caller, "member_count", count, |p| p.member_count = count)
    }

    pub fn set_quorum_bps(&self, quorum_bps: u16, caller: Address) -> Result<(), GovernanceError> {
        self.update_params(caller, "quorum_bps", u64::from(quorum_bps), |p| {
            p.quorum_bps = quorum_bps
        })
    }

    pub fn set_voting_duration(&self, secs: u64, caller: Address) -> Result<(), GovernanceError> {
        self.update_params(caller, "voting_duration", secs, |p| p.voting_duration = secs)
    }

    pub fn set_membership_gate(
        &self,
        gate: Arc<dyn MembershipGate>,
        caller: Address,
    ) -> Result<(), GovernanceError> {
        self.access.ensure_admin(&caller, "set governance membership gate")?;
        *self.gate.write() = gate;
        tracing::info!(caller = %caller, "Governance membership gate replaced");
        Ok(())
    }

    fn update_params(
        &self,
        caller: Address,
        name: &'static str,
        value: u64,
        apply: impl FnOnce(&mut GovernanceParams),
    ) -> Result<(), GovernanceError> {
        self.access.ensure_admin(&caller, &format!("set {}", name))?;
        {
            let mut state = self.state.write();
            let mut params = state.params;
            apply(&mut params);
            params.validate()?;
            state.params = params;
        }

        tracing::info!(name, value, changed_by = %caller, "Governance parameter changed");
        self.journal.emit(Event::ParameterChanged {
            name: name.to_string(),
            value,
            changed_by: caller,
        });
        Ok(())
    }

    fn ensure_member(&self, account: &Address) -> Result<(), GovernanceError> {
        let gate = self.gate.read().clone();
        if admits(gate.as_ref(), account) {
            Ok(())
        } else {
            Err(GovernanceError::NotMember(*account))
        }
    }
}

fn ensure_executor(
    state: &EngineState,
    caller: &Address,
    action: &str,
) -> Result<(), GovernanceError> {
    if state.executor == Some(*caller) {
        return Ok(());
    }
    tracing::warn!(caller = %caller, action, "Rejected call from non-executor");
    Err(GovernanceError::Unauthorized {
        caller: *caller,
        action: action.to_string(),
    })
}
