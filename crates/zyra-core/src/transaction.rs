//! Money-movement records.
//!
//! A `Transaction` is written for every attempted movement: deposits start
//! `PENDING` and are settled exactly once by the provider callback matched
//! through the correlation ids; sends are written already terminal after
//! the ledger transfer succeeds, or not at all.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CanonicalPhone, TransactionId, UserId};

/// A record of an attempted money movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id (ULID, time-ordered).
    pub id: TransactionId,

    /// The account this transaction belongs to.
    pub user_id: UserId,

    /// Counterparty phone for P2P sends; `None` for deposits.
    pub counterparty: Option<CanonicalPhone>,

    /// Positive amount.
    pub amount: Decimal,

    /// Deposit or send.
    pub kind: TransactionKind,

    /// Current status.
    pub status: TransactionStatus,

    /// Payment-provider merchant request id (deposits).
    pub merchant_request_id: Option<String>,

    /// Payment-provider checkout request id (deposits).
    pub checkout_request_id: Option<String>,

    /// Ledger transaction hash (sends).
    pub ledger_tx_hash: Option<String>,

    /// Provider receipt number, set on settled deposits.
    pub receipt_number: Option<String>,

    /// Provider result code, set when the transaction reaches a terminal
    /// state via callback.
    pub result_code: Option<i64>,

    /// Provider result description.
    pub result_desc: Option<String>,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,

    /// When the transaction was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a `PENDING` deposit awaiting its provider callback.
    #[must_use]
    pub fn pending_deposit(
        user_id: UserId,
        amount: Decimal,
        merchant_request_id: String,
        checkout_request_id: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::generate(),
            user_id,
            counterparty: None,
            amount,
            kind: TransactionKind::Deposit,
            status: TransactionStatus::Pending,
            merchant_request_id: Some(merchant_request_id),
            checkout_request_id: Some(checkout_request_id),
            ledger_tx_hash: None,
            receipt_number: None,
            result_code: None,
            result_desc: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an already-successful send, recorded after the ledger
    /// transfer confirmed.
    #[must_use]
    pub fn completed_send(
        user_id: UserId,
        recipient: CanonicalPhone,
        amount: Decimal,
        ledger_tx_hash: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::generate(),
            user_id,
            counterparty: Some(recipient),
            amount,
            kind: TransactionKind::Send,
            status: TransactionStatus::Success,
            merchant_request_id: None,
            checkout_request_id: None,
            ledger_tx_hash,
            receipt_number: None,
            result_code: None,
            result_desc: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the transaction has reached a terminal state.
    ///
    /// Terminal transactions must never transition again: a second
    /// provider callback for a settled deposit is a no-op.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Success | TransactionStatus::Failed
        )
    }
}

/// The kind of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Mobile-money on-ramp into the wallet.
    Deposit,

    /// P2P transfer to another account.
    Send,
}

/// Transaction lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Awaiting the provider callback.
    Pending,

    /// Completed successfully.
    Success,

    /// Terminally failed.
    Failed,
}
