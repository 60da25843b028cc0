use coffer_core::CoreError;
use coffer_types::{Address, Amount, ErrorCategory};
use thiserror::Error;

/// Errors that can occur in ledger operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Account {0:x} is not an active member")]
    NotMember(Address),

    #[error("Unauthorized: {caller:x} may not {action}")]
    Unauthorized { caller: Address, action: String },

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Invalid parameter: {0}")]
    InvalidParams(String),

    #[error("Amount overflow crediting {amount} to {account:x}")]
    AmountOverflow { account: Address, amount: Amount },

    #[error("Insufficient balance for {account:x}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: Address,
        requested: Amount,
        available: Amount,
    },

    #[error("Insufficient treasury funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("Reentrant call into ledger::{entry_point} while {active} is executing")]
    Reentrant {
        entry_point: &'static str,
        active: &'static str,
    },

    #[error("Transfer of {amount} to {to:x} failed: {reason}")]
    TransferFailed {
        to: Address,
        amount: Amount,
        reason: String,
    },

    #[error("Operation {action} rejected: system is paused")]
    Paused { action: &'static str },
}

impl LedgerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LedgerError::NotMember(_) | LedgerError::Unauthorized { .. } => {
                ErrorCategory::Authorization
            }
            LedgerError::ZeroAmount
            | LedgerError::InvalidParams(_)
            | LedgerError::AmountOverflow { .. } => ErrorCategory::Validation,
            LedgerError::InsufficientBalance { .. } | LedgerError::InsufficientFunds { .. } => {
                ErrorCategory::Resource
            }
            LedgerError::Reentrant { .. } => ErrorCategory::Reentrancy,
            LedgerError::TransferFailed { .. } => ErrorCategory::Transfer,
            LedgerError::Paused { .. } => ErrorCategory::Halted,
        }
    }
}

impl From<CoreError> for LedgerError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Unauthorized { caller, action } => LedgerError::Unauthorized { caller, action },
            CoreError::LastAdmin(account) => LedgerError::Unauthorized {
                caller: account,
                action: "revoke the last administrator".to_string(),
            },
            CoreError::Paused { action } => LedgerError::Paused { action },
            CoreError::Reentrant {
                entry_point,
                active,
                ..
            } => LedgerError::Reentrant { entry_point, active },
            CoreError::InvalidConfig(msg) => LedgerError::InvalidParams(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_reports_amounts() {
        let err = LedgerError::InsufficientBalance {
            account: Address::ZERO,
            requested: 500,
            available: 200,
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("200"));
        assert_eq!(err.category(), ErrorCategory::Resource);
    }

    #[test]
    fn test_core_error_conversion() {
        let err: LedgerError = CoreError::Reentrant {
            component: "ledger",
            entry_point: "withdraw",
            active: "withdraw",
        }
        .into();
        assert_eq!(
            err,
            LedgerError::Reentrant {
                entry_point: "withdraw",
                active: "withdraw"
            }
        );
    }
}
