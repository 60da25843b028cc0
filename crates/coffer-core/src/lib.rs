//! Coffer Core - runtime pieces shared by the ledger, the governance engine
//! and the execution coordinator.
//!
//! This crate provides:
//! - Administrator roles and the pause circuit breaker
//! - The injected clock and membership gate capabilities
//! - Non-reentrant call guards
//! - The queryable audit event journal
//! - Configuration loading and telemetry setup

pub mod access;
pub mod clock;
pub mod config;
pub mod error;
pub mod journal;
pub mod membership;
pub mod reentrancy;
pub mod telemetry;

pub use access::AccessControl;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CofferConfig, GovernanceConfig, LoggingConfig, TreasuryConfig};
pub use error::CoreError;
pub use journal::{EventJournal, EventRecord};
pub use membership::{admits, MemberDirectory, MembershipError, MembershipGate};
pub use reentrancy::{CallFrame, CallScope, ReentrancyGuard};
