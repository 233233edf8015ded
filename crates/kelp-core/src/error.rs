// crates/kelp-core/src/error.rs

use thiserror::Error;

/// Protocol-wide error types for the KelpFi reward engine.
///
/// Every failure aborts the enclosing operation with no partial state
/// mutation. The only silent no-ops in the system are documented business
/// rules (zero-pending harvest, zero-stake no-mint, zero-balance buyback),
/// never suppressed errors.
#[derive(Debug, Error)]
pub enum KelpError {
    /// Caller lacks the required role (admin-only operation, or a mint
    /// attempted without the authority capability).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Withdrawal or transfer exceeds the available staked/held balance.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// A transfer_from exceeds the spender's approved allowance.
    #[error("Insufficient allowance: {0}")]
    InsufficientAllowance(String),

    /// An underlying token transfer could not be completed.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// A mint would push total issuance above the hard supply cap.
    #[error("Supply cap exceeded: {0}")]
    SupplyCapExceeded(String),

    /// A pool is already registered for this stake token.
    #[error("Duplicate stake token: {0}")]
    DuplicateStakeToken(String),

    /// Resource not found (unknown pool id, missing user record).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The exchange collaborator is unreachable or rejected the call.
    #[error("Exchange unavailable: {0}")]
    ExchangeUnavailable(String),

    /// The swap would return less than the tolerated minimum output.
    #[error("Slippage exceeded: {0}")]
    SlippageExceeded(String),

    /// Invalid state transition or arithmetic overflow in accounting.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for KelpError {
    fn from(e: serde_json::Error) -> Self {
        KelpError::Serialization(e.to_string())
    }
}
