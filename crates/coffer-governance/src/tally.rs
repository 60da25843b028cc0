//! Vote counting rules.
//!
//! Every member's vote weighs one. Quorum is a fraction of the member count
//! snapshot taken when the proposal was created, rounded up.

use coffer_types::{Address, BPS_DENOMINATOR};

/// Weight of a single vote.
pub fn vote_weight(_voter: &Address) -> u64 {
    1
}

/// Turnout required for a finalization to count:
/// `ceil(member_snapshot * quorum_bps / 10000)`.
pub fn quorum_needed(member_snapshot: u64, quorum_bps: u16) -> u64 {
    let scaled = u128::from(member_snapshot) * u128::from(quorum_bps);
    let denominator = u128::from(BPS_DENOMINATOR);
    // Never exceeds member_snapshot since quorum_bps <= 10000
    ((scaled + denominator - 1) / denominator) as u64
}

/// Result of tallying a closed vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Passed,
    /// Turnout below quorum
    NoQuorum,
    /// Quorum reached but "for" did not strictly beat "against"
    NoMajority,
}

impl Decision {
    pub fn passed(&self) -> bool {
        matches!(self, Decision::Passed)
    }
}

pub fn decide(votes_for: u64, votes_against: u64, quorum: u64) -> Decision {
    let turnout = votes_for.saturating_add(votes_against);
    if turnout < quorum {
        Decision::NoQuorum
    } else if votes_for <= votes_against {
        Decision::NoMajority
    } else {
        Decision::Passed
    }
}
