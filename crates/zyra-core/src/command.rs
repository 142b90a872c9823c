//! WhatsApp message classification.
//!
//! [`classify`] turns one inbound message into one [`Command`]. It is a
//! pure function so the ordered matching rules can be tested without a
//! store, a ledger, or an HTTP stack; executing the command is the
//! service's job.
//!
//! Interactive button replies are resolved to their button id (`deposit`,
//! `send`, `balance`) before reaching this function, so a button tap
//! classifies exactly like typing the bare keyword.

use std::fmt;

/// One classified inbound message.
///
/// Classification order is fixed and first-match-wins; keywords are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A six-digit verification code.
    Verify {
        /// The code as typed.
        code: String,
    },

    /// A deposit request. `None` means the bare keyword: the user is
    /// prompted for an amount rather than rejected.
    Deposit {
        /// Whole-unit amount, when given.
        amount: Option<u64>,
    },

    /// A P2P send. `None` means the bare keyword: reply with usage.
    Send {
        /// Parsed `send <amount> to <phone>` arguments, when given.
        args: Option<SendArgs>,
    },

    /// A balance query.
    Balance,

    /// Anything else. Logged, never answered.
    Unrecognized,
}

/// Arguments of a fully-specified send command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendArgs {
    /// Whole-unit amount to move.
    pub amount: u64,

    /// Raw recipient phone as typed; normalized by the executor.
    pub recipient: String,
}

/// A recognized command keyword with malformed arguments.
///
/// These are client errors surfaced to the webhook caller (HTTP 400), not
/// chat replies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// `deposit` with a non-numeric or non-positive amount.
    #[error("invalid deposit amount")]
    InvalidDeposit,

    /// `send` with a bad amount or missing recipient.
    #[error("invalid send command, use 'send <amount> to <phone>'")]
    InvalidSend,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verify { .. } => f.write_str("verify"),
            Self::Deposit { .. } => f.write_str("deposit"),
            Self::Send { .. } => f.write_str("send"),
            Self::Balance => f.write_str("balance"),
            Self::Unrecognized => f.write_str("unrecognized"),
        }
    }
}

/// Classify one inbound message.
///
/// Rules, in order:
///
/// 1. exactly six ASCII digits → [`Command::Verify`]
/// 2. starts with `deposit` → bare keyword prompts for an amount; token 1
///    must otherwise be a positive integer
/// 3. starts with `send` → bare keyword prompts with usage; otherwise the
///    expected shape is `send <amount> to <phone>` (token 2, the literal
///    `to`, is not separately validated)
/// 4. starts with `balance` → [`Command::Balance`]
/// 5. anything else → [`Command::Unrecognized`]
///
/// # Errors
///
/// Returns [`ParseError`] when a recognized keyword carries malformed
/// arguments.
pub fn classify(text: &str) -> Result<Command, ParseError> {
    let text = text.trim();

    if text.len() == 6 && text.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Command::Verify {
            code: text.to_string(),
        });
    }

    let lowered = text.to_lowercase();

    if lowered.starts_with("deposit") {
        let mut tokens = text.split_whitespace();
        let _keyword = tokens.next();
        return match tokens.next() {
            None => Ok(Command::Deposit { amount: None }),
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .map(|amount| Command::Deposit {
                    amount: Some(amount),
                })
                .ok_or(ParseError::InvalidDeposit),
        };
    }

    if lowered.starts_with("send") {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() == 1 {
            return Ok(Command::Send { args: None });
        }

        let amount = tokens
            .get(1)
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .ok_or(ParseError::InvalidSend)?;
        let recipient = tokens
            .get(3)
            .filter(|r| !r.is_empty())
            .ok_or(ParseError::InvalidSend)?;

        return Ok(Command::Send {
            args: Some(SendArgs {
                amount,
                recipient: (*recipient).to_string(),
            }),
        });
    }

    if lowered.starts_with("balance") {
        return Ok(Command::Balance);
    }

    Ok(Command::Unrecognized)
}
