use std::fmt;
use thiserror::Error;

/// Errors that can occur in type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address length: expected 20, got {0}")]
    InvalidAddressLength(usize),

    #[error("Invalid hash length: expected 32, got {0}")]
    InvalidHashLength(usize),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Bech32 error: {0}")]
    Bech32Error(String),
}

impl From<hex::FromHexError> for TypesError {
    fn from(e: hex::FromHexError) -> Self {
        TypesError::InvalidHex(e.to_string())
    }
}

/// Category of a rejected operation.
///
/// Every component error maps onto exactly one category. All categories are
/// recoverable by the caller: a rejected call leaves no partial state behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller lacks membership or privilege
    Authorization,
    /// Malformed or out-of-range input
    Validation,
    /// Operation not legal in the current proposal/log state
    StateConflict,
    /// Not enough balance or funds
    Resource,
    /// Nested entry into a guarded operation
    Reentrancy,
    /// Outbound value transfer failed
    Transfer,
    /// Administrator circuit breaker engaged
    Halted,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::Validation => "validation",
            ErrorCategory::StateConflict => "state-conflict",
            ErrorCategory::Resource => "resource",
            ErrorCategory::Reentrancy => "reentrancy",
            ErrorCategory::Transfer => "transfer",
            ErrorCategory::Halted => "halted",
        };
        f.write_str(name)
    }
}
