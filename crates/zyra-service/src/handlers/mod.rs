//! HTTP request handlers.

pub mod accounts;
pub mod health;
pub mod mpesa;
pub mod whatsapp;
