//! Error types for Zyra storage.

use rust_decimal::Decimal;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        entity: &'static str,
        /// The key that was looked up.
        id: String,
    },

    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Sender balance cannot cover the transfer.
    #[error("insufficient balance: balance={balance}, required={required}")]
    InsufficientBalance {
        /// The sender's current balance.
        balance: Decimal,
        /// The amount requested.
        required: Decimal,
    },

    /// The deposit was already settled by an earlier callback.
    #[error("transaction already settled: {transaction_id}")]
    AlreadySettled {
        /// The transaction that was settled twice.
        transaction_id: String,
    },
}
