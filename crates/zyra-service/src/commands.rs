//! Command execution.
//!
//! [`execute`] carries out one classified command for one sender. The
//! classifier stays pure; everything effectful (store lookups, ledger
//! transfers, payment pushes, replies) happens here.
//!
//! Wallet commands from a phone with no registered account fail with a
//! not-found error. Verification codes are the one exception: a code
//! from an unknown number is dropped silently, the same as a mismatched
//! code for a known one.

use rust_decimal::Decimal;

use zyra_core::{Account, CanonicalPhone, Command, SendArgs, Transaction};

use crate::error::ApiError;
use crate::state::AppState;
use crate::whatsapp::types::MenuButton;

/// Buttons offered once a number is verified.
const MENU_BUTTONS: [MenuButton; 3] = [
    MenuButton {
        id: "deposit",
        title: "Deposit",
    },
    MenuButton {
        id: "send",
        title: "Send",
    },
    MenuButton {
        id: "balance",
        title: "Balance",
    },
];

/// Execute one command on behalf of `sender_phone`.
///
/// # Errors
///
/// Returns `ApiError::NotFound` when a wallet command arrives from a
/// phone with no account, `ApiError::ExternalService` when a dependency
/// (payment provider, ledger) fails, and store errors mapped through
/// `From<StoreError>`. Reply delivery failures are logged, not
/// propagated: the inbound webhook must still be acknowledged.
pub async fn execute(
    state: &AppState,
    sender_phone: &CanonicalPhone,
    command: Command,
) -> Result<(), ApiError> {
    match command {
        Command::Verify { code } => verify(state, sender_phone, &code).await,
        Command::Deposit { amount } => deposit(state, sender_phone, amount).await,
        Command::Send { args } => send(state, sender_phone, args).await,
        Command::Balance => balance(state, sender_phone).await,
        Command::Unrecognized => {
            tracing::debug!(from = %sender_phone, "Unrecognized message, ignoring");
            Ok(())
        }
    }
}

async fn verify(
    state: &AppState,
    sender_phone: &CanonicalPhone,
    code: &str,
) -> Result<(), ApiError> {
    // Codes from unknown numbers are dropped like mismatched ones:
    // an error reply would confirm which numbers hold wallets.
    let Some(mut account) = state.store.get_account_by_phone(sender_phone)? else {
        tracing::debug!(from = %sender_phone, "Verification code from unregistered number, ignoring");
        return Ok(());
    };

    if !account.code_matches(code) {
        tracing::warn!(from = %sender_phone, "Verification code mismatch, ignoring");
        return Ok(());
    }

    account.mark_verified();
    state.store.update_account(&account)?;
    tracing::info!(user_id = %account.id, "Account verified");

    let body = "\u{2705} Your number is verified! What would you like to do?";
    if let Err(e) = state
        .messenger
        .send_menu(sender_phone, body, &MENU_BUTTONS)
        .await
    {
        tracing::error!(to = %sender_phone, error = %e, "Failed to send menu message");
    }
    Ok(())
}

async fn deposit(
    state: &AppState,
    sender_phone: &CanonicalPhone,
    amount: Option<u64>,
) -> Result<(), ApiError> {
    let account = require_account(state, sender_phone)?;

    let Some(amount) = amount else {
        reply(
            state,
            sender_phone,
            "How much would you like to deposit? Reply with 'deposit <amount>', e.g. 'deposit 500'.",
        )
        .await;
        return Ok(());
    };
    let amount = Decimal::from(amount);

    let initiation = state
        .payments
        .initiate_deposit(sender_phone, amount, &account.public_key)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %account.id, error = %e, "STK push failed");
            ApiError::ExternalService(e.to_string())
        })?;

    let transaction = Transaction::pending_deposit(
        account.id,
        amount,
        initiation.merchant_request_id,
        initiation.checkout_request_id,
    );
    state.store.put_transaction(&transaction)?;

    tracing::info!(
        user_id = %account.id,
        transaction_id = %transaction.id,
        %amount,
        "Deposit initiated"
    );

    reply(
        state,
        sender_phone,
        &format!(
            "STK Push initiated for {amount} KES. Check your phone to complete the transaction."
        ),
    )
    .await;
    Ok(())
}

async fn send(
    state: &AppState,
    sender_phone: &CanonicalPhone,
    args: Option<SendArgs>,
) -> Result<(), ApiError> {
    let sender = require_account(state, sender_phone)?;

    let Some(args) = args else {
        reply(
            state,
            sender_phone,
            "To send money, use 'send <amount> to <phone>'.",
        )
        .await;
        return Ok(());
    };

    let amount = Decimal::from(args.amount);
    let recipient_phone = CanonicalPhone::normalize(&args.recipient);

    let Some(recipient) = state.store.get_account_by_phone(&recipient_phone)? else {
        reply(
            state,
            sender_phone,
            &format!("{recipient_phone} is not registered with Zyra."),
        )
        .await;
        return Ok(());
    };

    if recipient.id == sender.id {
        reply(state, sender_phone, "You cannot send money to yourself.").await;
        return Ok(());
    }

    // Cheap local check before touching the ledger; the store re-checks
    // when the balances actually move.
    if !sender.has_sufficient_balance(amount) {
        reply(
            state,
            sender_phone,
            &format!("Insufficient balance. Your balance is {}.", sender.balance),
        )
        .await;
        return Ok(());
    }

    let hash = state
        .ledger
        .transfer(&sender.secret_key, &recipient.public_key, amount)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %sender.id, error = %e, "Ledger transfer failed");
            ApiError::ExternalService(e.to_string())
        })?;

    let transaction =
        Transaction::completed_send(sender.id, recipient_phone.clone(), amount, Some(hash));
    state
        .store
        .apply_transfer(&sender.id, &recipient.id, amount, &transaction)?;

    tracing::info!(
        user_id = %sender.id,
        transaction_id = %transaction.id,
        recipient = %recipient_phone,
        %amount,
        "Transfer completed"
    );

    reply(
        state,
        sender_phone,
        &format!("Successfully sent {amount} to {recipient_phone}"),
    )
    .await;
    reply(
        state,
        &recipient.phone,
        &format!("You have received {amount} from {sender_phone}"),
    )
    .await;
    Ok(())
}

async fn balance(state: &AppState, sender_phone: &CanonicalPhone) -> Result<(), ApiError> {
    let account = require_account(state, sender_phone)?;

    reply(
        state,
        sender_phone,
        &format!("Your balance is {}.", account.balance),
    )
    .await;
    Ok(())
}

/// Look up the account for a sender, failing with not-found for
/// unknown numbers.
fn require_account(state: &AppState, phone: &CanonicalPhone) -> Result<Account, ApiError> {
    state
        .store
        .get_account_by_phone(phone)?
        .ok_or_else(|| ApiError::NotFound(format!("account not found: {phone}")))
}

/// Send a text reply, logging delivery failures instead of propagating.
async fn reply(state: &AppState, to: &CanonicalPhone, body: &str) {
    if let Err(e) = state.messenger.send_text(to, body).await {
        tracing::error!(to = %to, error = %e, "Failed to send WhatsApp message");
    }
}
