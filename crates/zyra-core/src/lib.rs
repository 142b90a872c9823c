//! Core types for the Zyra wallet service.
//!
//! This crate provides the domain types shared by the store and the HTTP
//! service:
//!
//! - **Identifiers**: `UserId`, `TransactionId`
//! - **Phone numbers**: `CanonicalPhone` and its normalization rules
//! - **Accounts**: `Account`, `VerificationState`
//! - **Transactions**: `Transaction`, `TransactionKind`, `TransactionStatus`
//! - **Commands**: the pure WhatsApp message classifier (`classify`)
//!
//! # Money
//!
//! Balances and amounts are `rust_decimal::Decimal`, never a binary float:
//! stored balances are compared against requested amounts, and a float
//! comparison could mint or destroy money at the margins.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod command;
pub mod ids;
pub mod phone;
pub mod transaction;

pub use account::{Account, VerificationState};
pub use command::{classify, Command, ParseError, SendArgs};
pub use ids::{IdError, TransactionId, UserId};
pub use phone::CanonicalPhone;
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
