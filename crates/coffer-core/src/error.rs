use coffer_types::{Address, ErrorCategory};
use thiserror::Error;

/// Errors raised by the shared runtime pieces.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unauthorized: {caller:x} may not {action}")]
    Unauthorized { caller: Address, action: String },

    #[error("Operation {action} rejected: system is paused")]
    Paused { action: &'static str },

    #[error("Cannot revoke the last administrator {0:x}")]
    LastAdmin(Address),

    #[error("Reentrant call into {component}::{entry_point} while {active} is executing")]
    Reentrant {
        component: &'static str,
        entry_point: &'static str,
        active: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::Unauthorized { .. } | CoreError::LastAdmin(_) => ErrorCategory::Authorization,
            CoreError::Paused { .. } => ErrorCategory::Halted,
            CoreError::Reentrant { .. } => ErrorCategory::Reentrancy,
            CoreError::InvalidConfig(_) => ErrorCategory::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentrant_display() {
        let err = CoreError::Reentrant {
            component: "ledger",
            entry_point: "withdraw",
            active: "withdraw",
        };
        assert!(err.to_string().contains("ledger::withdraw"));
        assert_eq!(err.category(), ErrorCategory::Reentrancy);
    }
}
