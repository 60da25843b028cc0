//! Coffer Governance - member proposals and voting.
//!
//! This crate provides:
//! - Proposal lifecycle management
//! - One-member-one-vote tallying with quorum and majority rules
//! - The governance engine that owns proposals and votes
//! - An advisory annotation store for human reviewers

pub mod annotation;
pub mod engine;
pub mod error;
pub mod proposal;
pub mod tally;

pub use annotation::{Annotation, AnnotationStore, InMemoryAnnotations};
pub use engine::{GovernanceEngine, GovernanceParams, NO_VOTE};
pub use error::GovernanceError;
pub use proposal::{Proposal, ProposalDraft, ProposalStatus};
pub use tally::{quorum_needed, Decision};
