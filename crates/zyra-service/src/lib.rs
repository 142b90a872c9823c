//! Zyra HTTP API Service.
//!
//! This crate provides the HTTP surface of the Zyra wallet, including:
//!
//! - Account registration and WhatsApp verification
//! - The WhatsApp webhook that routes conversational commands
//! - The M-Pesa callback that settles pending deposits
//! - Ledger transfers via the signing gateway
//!
//! # Conversation flow
//!
//! A user registers over HTTP, requests a verification code, and proves
//! control of their phone number by messaging the code over WhatsApp.
//! From then on `deposit`, `send`, and `balance` messages drive the
//! wallet entirely in chat.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod commands;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod mpesa;
pub mod routes;
pub mod state;
pub mod stellar;
pub mod whatsapp;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use mpesa::{DarajaClient, PaymentError, PaymentProvider};
pub use routes::create_router;
pub use state::AppState;
pub use stellar::{GatewayClient, LedgerClient, LedgerError};
pub use whatsapp::{Messenger, MessengerError, WhatsAppClient};
