//! Coffer Executor - turns passed proposals into payouts.
//!
//! This crate provides:
//! - The execution coordinator, which marks a proposal executed, allocates
//!   its funds and records the payout as one logical unit
//! - The hash-chained execution log
//! - The `Coffer` facade wiring ledger, governance and coordinator together

pub mod coffer;
pub mod coordinator;
pub mod error;
pub mod log;

pub use coffer::Coffer;
pub use coordinator::ExecutionCoordinator;
pub use error::ExecutionError;
pub use log::{ExecutionLog, LogEntry};
