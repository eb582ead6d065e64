use crate::types::balance::Balance;
use crate::types::ids::{CryptoId, UserId};
use crate::types::quantity::Quantity;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Request validation
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(Quantity),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    // Catalog
    #[error("Cryptocurrency not found: {0}")]
    CryptoNotFound(CryptoId),

    // Accounts
    #[error("Account not found: {0}")]
    AccountNotFound(UserId),

    #[error("Account is deactivated: {0}")]
    AccountInactive(UserId),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    // Business-rule rejections: no mutation occurred, safe to retry
    #[error("Insufficient funds: required={required}, available={available}")]
    InsufficientFunds {
        required: Balance,
        available: Balance,
    },

    #[error("Insufficient holding: requested={requested}, held={held}")]
    InsufficientHolding {
        requested: Quantity,
        held: Quantity,
    },

    // Audit
    #[error("Reconciliation failed: expected={expected}, actual={actual}")]
    ReconciliationFailed {
        expected: Balance,
        actual: Balance,
    },

    // Persistence faults: commit outcome unknown to the caller, but the
    // engine guarantees balance and ledger were left consistent
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
