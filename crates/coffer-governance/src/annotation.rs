//! Advisory annotations.
//!
//! Free-form notes and scores that reviewers attach to proposals. The engine
//! never reads them when deciding anything.

use coffer_types::{Address, ProposalId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub proposal_id: ProposalId,
    pub author: Address,
    pub note: String,
    /// Reviewer-defined score, e.g. a risk rating
    pub score: i32,
}

pub trait AnnotationStore: Send + Sync + fmt::Debug {
    fn annotate(&self, proposal_id: ProposalId, author: Address, note: &str, score: i32);

    /// Annotations for a proposal, oldest first.
    fn annotations(&self, proposal_id: ProposalId) -> Vec<Annotation>;
}

#[derive(Debug, Default)]
pub struct InMemoryAnnotations {
    notes: RwLock<HashMap<ProposalId, Vec<Annotation>>>,
}

impl InMemoryAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnnotationStore for InMemoryAnnotations {
    fn annotate(&self, proposal_id: ProposalId, author: Address, note: &str, score: i32) {
        tracing::debug!(proposal_id, author = %author, score, "Annotation added");
        self.notes.write().entry(proposal_id).or_default().push(Annotation {
            proposal_id,
            author,
            note: note.to_string(),
            score,
        });
    }

    fn annotations(&self, proposal_id: ProposalId) -> Vec<Annotation> {
        self.notes.read().get(&proposal_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotations_by_proposal() {
        let store = InMemoryAnnotations::new();
        assert!(store.is_empty());

        let reviewer = Address::from_bytes([9u8; 20]);
        store.annotate(1, reviewer, "vendor looks legit", 4);
        store.annotate(1, reviewer, "quote is high", -1);
        store.annotate(2, reviewer, "duplicate of #1", 0);

        let first = store.annotations(1);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].note, "vendor looks legit");
        assert_eq!(first[1].score, -1);
        assert!(store.annotations(3).is_empty());
        assert_eq!(store.len(), 3);
    }
}
