//! Account types for Zyra.
//!
//! An account ties a phone number to a ledger keypair and a cached balance.
//! The private ledger credential lives only in the store; it is loaded to
//! sign transfers and must never appear in an API response or a chat
//! message.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CanonicalPhone, UserId};

/// A Zyra wallet account.
///
/// The phone number is unique across accounts and is the primary lookup
/// key for inbound WhatsApp traffic. `balance` is the locally tracked
/// balance; it is advisory with respect to the chain and is mutated only
/// by completed transfers and settled deposits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Internal account id.
    pub id: UserId,

    /// Canonical phone number (unique).
    pub phone: CanonicalPhone,

    /// Registration email (unique).
    pub email: String,

    /// Bcrypt hash of the login password.
    pub password_hash: String,

    /// Public ledger address.
    pub public_key: String,

    /// Private ledger credential. Sensitive: store-only, never exposed.
    pub secret_key: String,

    /// Cached balance, refreshed by completed money movements.
    pub balance: Decimal,

    /// WhatsApp verification state.
    pub verification: VerificationState,

    /// Pending six-digit verification code, cleared on success.
    pub verification_code: Option<String>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new unverified account with zero balance.
    #[must_use]
    pub fn new(
        phone: CanonicalPhone,
        email: String,
        password_hash: String,
        public_key: String,
        secret_key: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            phone,
            email,
            password_hash,
            public_key,
            secret_key,
            balance: Decimal::ZERO,
            verification: VerificationState::Unverified,
            verification_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the cached balance covers a requested amount.
    #[must_use]
    pub fn has_sufficient_balance(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }

    /// Issue a verification code, moving to the code-issued state.
    pub fn issue_verification_code(&mut self, code: String) {
        self.verification = VerificationState::CodeIssued;
        self.verification_code = Some(code);
        self.updated_at = Utc::now();
    }

    /// Whether `code` matches the pending verification code.
    #[must_use]
    pub fn code_matches(&self, code: &str) -> bool {
        self.verification_code.as_deref() == Some(code)
    }

    /// Mark the account verified, clearing the single-use code.
    pub fn mark_verified(&mut self) {
        self.verification = VerificationState::Verified;
        self.verification_code = None;
        self.updated_at = Utc::now();
    }
}

/// WhatsApp verification lifecycle of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    /// No verification attempted yet.
    Unverified,

    /// A code has been issued and awaits the user's WhatsApp message.
    CodeIssued,

    /// The phone number has been proven via WhatsApp.
    Verified,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn test_account() -> Account {
        Account::new(
            CanonicalPhone::normalize("0712345678"),
            "user@example.com".into(),
            "$2b$10$hash".into(),
            "GTESTPUBLICKEY".into(),
            "STESTSECRET".into(),
        )
    }

    #[test]
    fn new_account_is_unverified_with_zero_balance() {
        let account = test_account();
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.verification, VerificationState::Unverified);
        assert!(account.verification_code.is_none());
    }

    #[test]
    fn sufficient_balance_is_inclusive() {
        let mut account = test_account();
        account.balance = Decimal::from(100);

        assert!(account.has_sufficient_balance(Decimal::from(50)));
        assert!(account.has_sufficient_balance(Decimal::from(100)));
        assert!(!account.has_sufficient_balance(Decimal::from(101)));
    }

    #[test]
    fn verification_lifecycle() {
        let mut account = test_account();

        account.issue_verification_code("123456".into());
        assert_eq!(account.verification, VerificationState::CodeIssued);
        assert!(account.code_matches("123456"));
        assert!(!account.code_matches("654321"));

        account.mark_verified();
        assert_eq!(account.verification, VerificationState::Verified);
        assert!(account.verification_code.is_none());
        assert!(!account.code_matches("123456"));
    }
}
