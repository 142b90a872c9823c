//! Key encoding utilities for `RocksDB`.

use zyra_core::{CanonicalPhone, TransactionId, UserId};

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a phone-index key from a canonical phone number.
#[must_use]
pub fn phone_key(phone: &CanonicalPhone) -> Vec<u8> {
    phone.as_str().as_bytes().to_vec()
}

/// Create an email-index key.
///
/// Emails are indexed case-insensitively.
#[must_use]
pub fn email_key(email: &str) -> Vec<u8> {
    email.to_lowercase().into_bytes()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create a user-transaction index key.
///
/// Format: `user_id (16 bytes) || transaction_id (16 bytes)`
///
/// Since ULIDs are time-ordered, transactions for a user sort by time.
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all transactions for a user.
#[must_use]
pub fn user_transactions_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the transaction ID from a user-transaction index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_transaction_id_from_user_key(key: &[u8]) -> TransactionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    TransactionId::from_bytes(bytes)
}

/// Create a correlation-index key from a provider correlation id.
#[must_use]
pub fn correlation_key(correlation_id: &str) -> Vec<u8> {
    correlation_id.as_bytes().to_vec()
}
