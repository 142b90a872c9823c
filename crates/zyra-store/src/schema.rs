//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Index: account id by canonical phone number. Value is the
    /// 16-byte `user_id`.
    pub const ACCOUNTS_BY_PHONE: &str = "accounts_by_phone";

    /// Index: account id by registration email. Value is the 16-byte
    /// `user_id`.
    pub const ACCOUNTS_BY_EMAIL: &str = "accounts_by_email";

    /// Money-movement records, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Index: transaction id by payment-provider correlation id (merchant
    /// request id or checkout request id). Value is the 16-byte
    /// `transaction_id`.
    pub const TRANSACTIONS_BY_CORRELATION: &str = "transactions_by_correlation";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::ACCOUNTS_BY_PHONE,
        cf::ACCOUNTS_BY_EMAIL,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::TRANSACTIONS_BY_CORRELATION,
    ]
}
