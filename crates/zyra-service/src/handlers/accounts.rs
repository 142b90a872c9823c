//! Account registration and verification handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use zyra_core::{
    Account, CanonicalPhone, Transaction, TransactionKind, TransactionStatus, VerificationState,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Account registration request.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Phone number in any local or international shape.
    pub phone: String,
    /// Registration email.
    pub email: String,
    /// Login password (hashed before storage).
    pub password: String,
}

/// Account representation returned by the API.
///
/// The ledger secret and the password hash never appear here.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account id.
    pub id: String,
    /// Canonical phone number.
    pub phone: CanonicalPhone,
    /// Registration email.
    pub email: String,
    /// Public ledger address.
    pub public_key: String,
    /// Current balance.
    pub balance: Decimal,
    /// Verification state.
    pub verification: VerificationState,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            phone: account.phone,
            email: account.email,
            public_key: account.public_key,
            balance: account.balance,
            verification: account.verification,
            created_at: account.created_at,
        }
    }
}

/// Register a new account.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    if request.phone.trim().is_empty() {
        return Err(ApiError::BadRequest("phone is required".into()));
    }
    if !request.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    if request.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    let phone = CanonicalPhone::normalize(&request.phone);

    // bcrypt is deliberately slow; keep it off the async worker.
    let password_hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(request.password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(|e| ApiError::Internal(e.to_string()))?;

    let keypair = state
        .ledger
        .create_keypair()
        .await
        .map_err(|e| ApiError::ExternalService(e.to_string()))?;

    let account = Account::new(
        phone,
        request.email,
        password_hash,
        keypair.public_key,
        keypair.secret_key,
    );
    state.store.create_account(&account)?;

    tracing::info!(user_id = %account.id, phone = %account.phone, "Account created");

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Verification code request.
#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    /// Phone number of the account to verify.
    pub phone: String,
}

/// Verification code response.
///
/// The code is returned to the caller for out-of-band delivery; the
/// user proves control of the number by sending it back over WhatsApp.
#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    /// Canonical phone number.
    pub phone: CanonicalPhone,
    /// The issued six-digit code.
    pub code: String,
}

/// Issue a six-digit verification code for an account.
pub async fn request_verification(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerificationRequest>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let phone = CanonicalPhone::normalize(&request.phone);
    let mut account = state
        .store
        .get_account_by_phone(&phone)?
        .ok_or_else(|| ApiError::NotFound(format!("account not found: {phone}")))?;

    let code = format!("{:06}", rand::thread_rng().gen_range(100_000..1_000_000));
    account.issue_verification_code(code.clone());
    state.store.update_account(&account)?;

    tracing::info!(user_id = %account.id, "Verification code issued");

    Ok(Json(VerificationResponse { phone, code }))
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    /// Maximum number of records to return (default 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Number of records to skip (default 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// One transaction in a history listing.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction id.
    pub id: String,
    /// Deposit or send.
    pub kind: TransactionKind,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Amount moved.
    pub amount: Decimal,
    /// Counterparty phone for sends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<CanonicalPhone>,
    /// Provider receipt number for settled deposits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    /// Ledger transaction hash for sends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_tx_hash: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            kind: tx.kind,
            status: tx.status,
            amount: tx.amount,
            counterparty: tx.counterparty,
            receipt_number: tx.receipt_number,
            ledger_tx_hash: tx.ledger_tx_hash,
            created_at: tx.created_at,
        }
    }
}

/// Transaction history response.
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    /// Transactions, newest first.
    pub transactions: Vec<TransactionResponse>,
}

/// List an account's transactions, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let phone = CanonicalPhone::normalize(&phone);
    let account = state
        .store
        .get_account_by_phone(&phone)?
        .ok_or_else(|| ApiError::NotFound(format!("account not found: {phone}")))?;

    let transactions = state
        .store
        .list_transactions_by_user(&account.id, pagination.limit, pagination.offset)?
        .into_iter()
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(TransactionListResponse { transactions }))
}
