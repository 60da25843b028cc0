//! Coffer Types - Core type definitions for the Coffer treasury.
//!
//! This crate provides the fundamental types shared by every Coffer component:
//! - Addresses (20-byte, Bech32m encoded)
//! - Hashes (32-byte, blake3 digests) for the execution audit chain
//! - Amount, timestamp and identifier aliases
//! - The audit `Event` stream
//! - The error taxonomy categories

pub mod address;
pub mod hash;
pub mod event;
pub mod error;

#[cfg(feature = "serde")]
mod serialization;

pub use address::Address;
pub use hash::Hash;
pub use event::{Event, EventKind};
pub use error::{ErrorCategory, TypesError};

/// Native currency units held by the treasury.
pub type Amount = u128;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Sequential, 1-indexed proposal identifier.
pub type ProposalId = u64;

/// Sequential, 1-indexed execution log identifier.
pub type LogId = u64;

/// Basis points denominator (10000 = 100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Address, Amount, ErrorCategory, Event, EventKind, Hash, LogId, ProposalId, Timestamp,
        TypesError, BPS_DENOMINATOR,
    };
}
