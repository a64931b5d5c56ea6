//! Error types for treasury operations.

use num_bigint::BigUint;
use thiserror::Error;
use vuser_chain::ChainError;

/// Errors that can occur during treasury operations.
///
/// A refused operation never mutates treasury or publisher state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    /// The treasury has not been initialized.
    #[error("Treasury not initialized")]
    Uninitialized,

    /// The treasury was already initialized.
    #[error("Treasury already initialized")]
    AlreadyInitialized,

    /// Publisher is not on the approved list.
    #[error("Publisher not approved for sponsorship: {0}")]
    PublisherNotApproved(String),

    /// Treasury balance does not cover the requested amount.
    #[error("Insufficient treasury funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount requested.
        required: BigUint,
        /// Current balance.
        available: BigUint,
    },

    /// Ledger error.
    #[error("Ledger error: {0}")]
    Chain(#[from] ChainError),
}

/// Result type for treasury operations.
pub type Result<T> = std::result::Result<T, TreasuryError>;
