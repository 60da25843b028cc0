//! Outbound value transfer.
//!
//! Moving value to an external account hands control to code the ledger
//! does not trust: an implementation may call back into any Coffer
//! component before returning. The ledger finishes all of its own state
//! changes before calling [`ValueTransfer::transfer`] and undoes them if the
//! transfer fails.

use coffer_types::{Address, Amount};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Failure reported by the transfer backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransferError {
    #[error("Recipient {to:x} rejected {amount}: {reason}")]
    Rejected {
        to: Address,
        amount: Amount,
        reason: String,
    },

    #[error("Recipient {0:x} is unreachable")]
    Unreachable(Address),
}

/// Sends value out of the treasury.
pub trait ValueTransfer: Send + Sync + fmt::Debug {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<(), TransferError>;
}

/// Transfer backend that records every payout and can be told to refuse
/// specific recipients.
#[derive(Debug, Default)]
pub struct RecordingTransfer {
    sent: Mutex<Vec<(Address, Amount)>>,
    refused: RwLock<HashSet<Address>>,
}

impl RecordingTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future transfer to `account` fail.
    pub fn refuse(&self, account: Address) {
        self.refused.write().insert(account);
    }

    pub fn accept(&self, account: &Address) {
        self.refused.write().remove(account);
    }

    /// All completed transfers in order.
    pub fn sent(&self) -> Vec<(Address, Amount)> {
        self.sent.lock().clone()
    }

    pub fn total_sent_to(&self, account: &Address) -> Amount {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| to == account)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

impl ValueTransfer for RecordingTransfer {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        if self.refused.read().contains(to) {
            return Err(TransferError::Rejected {
                to: *to,
                amount,
                reason: "recipient refuses payment".to_string(),
            });
        }
        self.sent.lock().push((*to, amount));
        Ok(())
    }
}
