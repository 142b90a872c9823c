//! WhatsApp messaging client.
//!
//! [`Messenger`] is the seam handlers talk through; [`WhatsAppClient`]
//! implements it against the Graph API, and [`LogMessenger`] stands in
//! when no access token is configured so local development never needs
//! Meta credentials.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use zyra_core::CanonicalPhone;

use self::types::{MenuButton, OutboundMenu, OutboundText};

/// Error type for messaging operations.
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Graph API returned an error.
    #[error("WhatsApp API error: {status} - {error}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        error: String,
    },
}

/// Outbound WhatsApp messaging.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, to: &CanonicalPhone, body: &str) -> Result<(), MessengerError>;

    /// Send an interactive button-menu message.
    async fn send_menu(
        &self,
        to: &CanonicalPhone,
        body: &str,
        buttons: &[MenuButton],
    ) -> Result<(), MessengerError>;
}

/// Graph API messaging client.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: Client,
    base_url: String,
    phone_number_id: String,
    access_token: String,
}

impl WhatsAppClient {
    /// Create a new Graph API client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    pub fn new(
        base_url: impl Into<String>,
        phone_number_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.into(),
            access_token: access_token.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base_url, self.phone_number_id)
    }

    async fn post<T: serde::Serialize>(&self, payload: &T) -> Result<(), MessengerError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error = response.text().await.unwrap_or_else(|_| status.to_string());
        Err(MessengerError::Api {
            status: status.as_u16(),
            error,
        })
    }
}

#[async_trait]
impl Messenger for WhatsAppClient {
    async fn send_text(&self, to: &CanonicalPhone, body: &str) -> Result<(), MessengerError> {
        self.post(&OutboundText::new(to.as_str(), body)).await
    }

    async fn send_menu(
        &self,
        to: &CanonicalPhone,
        body: &str,
        buttons: &[MenuButton],
    ) -> Result<(), MessengerError> {
        self.post(&OutboundMenu::new(to.as_str(), body, buttons))
            .await
    }
}

/// Fallback messenger that logs outbound messages instead of sending.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send_text(&self, to: &CanonicalPhone, body: &str) -> Result<(), MessengerError> {
        tracing::info!(to = %to, body = %body, "WhatsApp not configured, logging text message");
        Ok(())
    }

    async fn send_menu(
        &self,
        to: &CanonicalPhone,
        body: &str,
        buttons: &[MenuButton],
    ) -> Result<(), MessengerError> {
        let labels: Vec<&str> = buttons.iter().map(|b| b.title).collect();
        tracing::info!(
            to = %to,
            body = %body,
            buttons = ?labels,
            "WhatsApp not configured, logging menu message"
        );
        Ok(())
    }
}
