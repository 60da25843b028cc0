//! Coffer Ledger - the only component that moves value.
//!
//! This crate provides:
//! - Per-member credited balances and the depositor registry
//! - Deposits, withdrawals and privileged allocations
//! - Exact and basis-point ownership shares
//! - The outbound value transfer interface

pub mod error;
pub mod ledger;
pub mod share;
pub mod transfer;

pub use error::LedgerError;
pub use ledger::TreasuryLedger;
pub use share::Share;
pub use transfer::{RecordingTransfer, TransferError, ValueTransfer};
