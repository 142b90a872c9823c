//! `RocksDB` storage layer for Zyra.
//!
//! Persistent storage for wallet accounts and money movements using
//! `RocksDB` with column families for indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: Primary account records, keyed by `user_id`
//! - `accounts_by_phone`: Unique index from canonical phone to `user_id`
//! - `accounts_by_email`: Unique index from email to `user_id`
//! - `transactions`: Money movements, keyed by `transaction_id` (ULID)
//! - `transactions_by_user`: Index for listing transactions by user
//! - `transactions_by_correlation`: Index from payment-provider
//!   correlation ids to `transaction_id`, used to match deposit callbacks
//!
//! # Example
//!
//! ```no_run
//! use zyra_store::{RocksStore, Store};
//! use zyra_core::{Account, CanonicalPhone};
//!
//! let store = RocksStore::open("/tmp/zyra-db").unwrap();
//!
//! let account = Account::new(
//!     CanonicalPhone::normalize("0712345678"),
//!     "user@example.com".into(),
//!     "$2b$10$hash".into(),
//!     "GPUBLIC".into(),
//!     "SSECRET".into(),
//! );
//! store.create_account(&account).unwrap();
//!
//! let found = store.get_account_by_phone(&account.phone).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use rust_decimal::Decimal;
use zyra_core::{Account, CanonicalPhone, Transaction, TransactionId, TransactionStatus, UserId};

/// Terminal outcome applied to a pending deposit by its provider callback.
#[derive(Debug, Clone)]
pub struct DepositSettlement {
    /// `Success` or `Failed`.
    pub status: TransactionStatus,

    /// Provider receipt number, present on success.
    pub receipt_number: Option<String>,

    /// Provider result code from the callback.
    pub result_code: i64,

    /// Provider result description from the callback.
    pub result_desc: String,

    /// Amount credited to the account in the same write, on success.
    pub credit: Option<Decimal>,
}

/// The storage trait defining all database operations.
///
/// Abstracts the storage layer so handlers can be tested against an
/// in-memory or temporary-directory implementation.
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert a new account, maintaining the phone and email indexes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the phone or email is already
    /// registered.
    fn create_account(&self, account: &Account) -> Result<()>;

    /// Rewrite an existing account record.
    ///
    /// Phone and email are immutable; only the primary record is written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn update_account(&self, account: &Account) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>>;

    /// Get an account by canonical phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account_by_phone(&self, phone: &CanonicalPhone) -> Result<Option<Account>>;

    /// Get an account by registration email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Insert a transaction, maintaining the user index and, for
    /// deposits, the correlation index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>>;

    /// Find a transaction by a payment-provider correlation id (merchant
    /// request id or checkout request id).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_transaction_by_correlation(&self, correlation_id: &str)
        -> Result<Option<Transaction>>;

    /// List transactions for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Apply a P2P transfer: debit the sender, credit the recipient, and
    /// record the send transaction in one atomic write.
    ///
    /// The sender's balance is re-checked inside this call so a stale
    /// pre-check at the handler cannot overdraw. Returns the sender's new
    /// balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if either account doesn't exist.
    /// - `StoreError::InsufficientBalance` if the sender cannot cover
    ///   the amount.
    fn apply_transfer(
        &self,
        sender: &UserId,
        recipient: &UserId,
        amount: Decimal,
        transaction: &Transaction,
    ) -> Result<Decimal>;

    /// Settle a pending deposit exactly once.
    ///
    /// Applies the terminal status and callback fields to the
    /// transaction and, when `settlement.credit` is set, credits the
    /// owning account in the same atomic write. Returns the settled
    /// transaction.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the transaction or its account
    ///   doesn't exist.
    /// - `StoreError::AlreadySettled` if the transaction is already
    ///   terminal.
    fn settle_deposit(
        &self,
        transaction_id: &TransactionId,
        settlement: &DepositSettlement,
    ) -> Result<Transaction>;
}
