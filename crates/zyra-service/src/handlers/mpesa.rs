//! M-Pesa callback handler.
//!
//! Daraja posts the STK push result here once the user completes or
//! cancels the prompt. The callback is matched to its pending deposit
//! through the correlation indexes and settled exactly once; replays
//! and unknown correlations are acknowledged without effect so Daraja
//! stops retrying.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use zyra_core::TransactionStatus;
use zyra_store::{DepositSettlement, StoreError};

use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::mpesa::types::{CallbackAck, CallbackEnvelope, StkCallback};
use crate::state::AppState;

/// Callback query parameters.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Shared secret baked into the registered callback URL.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Handle an STK push result callback.
pub async fn payment_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
    Json(envelope): Json<CallbackEnvelope>,
) -> Result<Json<CallbackAck>, ApiError> {
    if let Some(expected) = &state.config.mpesa_callback_secret {
        let provided = params.secret.as_deref().unwrap_or_default();
        if !constant_time_eq(expected, provided) {
            tracing::warn!("M-Pesa callback with missing or wrong secret");
            return Err(ApiError::Forbidden);
        }
    }

    let callback = envelope.body.stk_callback;
    tracing::info!(
        checkout_request_id = %callback.checkout_request_id,
        result_code = callback.result_code,
        "M-Pesa callback received"
    );

    // Match on either correlation id; Daraja is not consistent about
    // which one survives retries.
    let transaction = match state
        .store
        .find_transaction_by_correlation(&callback.checkout_request_id)?
    {
        Some(tx) => Some(tx),
        None => state
            .store
            .find_transaction_by_correlation(&callback.merchant_request_id)?,
    };
    let Some(transaction) = transaction else {
        tracing::warn!(
            checkout_request_id = %callback.checkout_request_id,
            merchant_request_id = %callback.merchant_request_id,
            "Callback matches no pending deposit, acknowledging"
        );
        return Ok(Json(CallbackAck::accepted()));
    };

    if transaction.is_terminal() {
        tracing::warn!(
            transaction_id = %transaction.id,
            "Callback for already-settled deposit, acknowledging"
        );
        return Ok(Json(CallbackAck::accepted()));
    }

    if callback.is_success() {
        settle_success(&state, &transaction, &callback).await?;
    } else {
        settle_failure(&state, &transaction, &callback)?;
    }

    Ok(Json(CallbackAck::accepted()))
}

async fn settle_success(
    state: &Arc<AppState>,
    transaction: &zyra_core::Transaction,
    callback: &StkCallback,
) -> Result<(), ApiError> {
    let receipt = callback.receipt_number();
    if receipt.is_none() {
        tracing::warn!(
            transaction_id = %transaction.id,
            "Success callback without MpesaReceiptNumber"
        );
    }

    let account = state
        .store
        .get_account(&transaction.user_id)?
        .ok_or_else(|| {
            ApiError::Internal(format!(
                "deposit {} references missing account {}",
                transaction.id, transaction.user_id
            ))
        })?;

    // Fund before settling: if the faucet fails the deposit stays
    // pending and the next Daraja retry gets another shot.
    state
        .ledger
        .fund_test_account(&account.public_key)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %account.id, error = %e, "Faucet funding failed");
            ApiError::ExternalService(e.to_string())
        })?;

    let topup = state.config.deposit_topup_amount;
    let settlement = DepositSettlement {
        status: TransactionStatus::Success,
        receipt_number: receipt,
        result_code: callback.result_code,
        result_desc: callback.result_desc.clone(),
        credit: Some(topup),
    };

    match state.store.settle_deposit(&transaction.id, &settlement) {
        Ok(settled) => {
            tracing::info!(
                transaction_id = %settled.id,
                user_id = %account.id,
                "Deposit settled"
            );
        }
        // Lost a race with a concurrent retry; the winner already
        // credited and notified.
        Err(StoreError::AlreadySettled { .. }) => {
            tracing::warn!(transaction_id = %transaction.id, "Deposit settled concurrently");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let body = format!(
        "\u{1f389} Congratulations! Your account has been funded with {topup} XLM from the testnet faucet. \u{1f389}"
    );
    if let Err(e) = state.messenger.send_text(&account.phone, &body).await {
        tracing::error!(to = %account.phone, error = %e, "Failed to send funding notification");
    }

    Ok(())
}

fn settle_failure(
    state: &Arc<AppState>,
    transaction: &zyra_core::Transaction,
    callback: &StkCallback,
) -> Result<(), ApiError> {
    let settlement = DepositSettlement {
        status: TransactionStatus::Failed,
        receipt_number: None,
        result_code: callback.result_code,
        result_desc: callback.result_desc.clone(),
        credit: None,
    };

    match state.store.settle_deposit(&transaction.id, &settlement) {
        Ok(settled) => {
            tracing::info!(
                transaction_id = %settled.id,
                result_code = callback.result_code,
                result_desc = %callback.result_desc,
                "Deposit failed"
            );
            Ok(())
        }
        Err(StoreError::AlreadySettled { .. }) => {
            tracing::warn!(transaction_id = %transaction.id, "Deposit settled concurrently");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
