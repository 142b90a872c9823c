//! Application state.

use std::sync::Arc;

use zyra_store::Store;

use crate::config::ServiceConfig;
use crate::mpesa::{DarajaClient, DisabledProvider, PaymentProvider};
use crate::stellar::{GatewayClient, LedgerClient};
use crate::whatsapp::{LogMessenger, Messenger, WhatsAppClient};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Outbound WhatsApp messaging.
    pub messenger: Arc<dyn Messenger>,

    /// Mobile-money deposit initiation.
    pub payments: Arc<dyn PaymentProvider>,

    /// Ledger keypair, funding, and transfer operations.
    pub ledger: Arc<dyn LedgerClient>,
}

impl AppState {
    /// Create application state, wiring real clients from the config.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let messenger: Arc<dyn Messenger> = match (
            config.whatsapp_phone_number_id.as_ref(),
            config.whatsapp_access_token.as_ref(),
        ) {
            (Some(phone_number_id), Some(access_token)) => {
                tracing::info!(phone_number_id = %phone_number_id, "WhatsApp integration enabled");
                Arc::new(WhatsAppClient::new(
                    &config.whatsapp_api_url,
                    phone_number_id,
                    access_token,
                ))
            }
            _ => {
                tracing::warn!("WhatsApp not configured - outbound messages will be logged only");
                Arc::new(LogMessenger)
            }
        };

        let payments: Arc<dyn PaymentProvider> = match (
            config.mpesa_consumer_key.as_ref(),
            config.mpesa_consumer_secret.as_ref(),
            config.mpesa_passkey.as_ref(),
        ) {
            (Some(key), Some(secret), Some(passkey)) => {
                tracing::info!(shortcode = %config.mpesa_shortcode, "M-Pesa integration enabled");
                Arc::new(DarajaClient::new(
                    &config.mpesa_api_url,
                    key,
                    secret,
                    &config.mpesa_shortcode,
                    passkey,
                    config.mpesa_callback_url(),
                ))
            }
            _ => {
                tracing::warn!("M-Pesa not configured - deposits will be rejected");
                Arc::new(DisabledProvider)
            }
        };

        let ledger: Arc<dyn LedgerClient> = Arc::new(GatewayClient::new(
            &config.ledger_gateway_url,
            &config.horizon_url,
            &config.friendbot_url,
        ));

        Self {
            store,
            config,
            messenger,
            payments,
            ledger,
        }
    }

    /// Create application state with explicit clients, for tests.
    #[must_use]
    pub fn with_clients(
        store: Arc<dyn Store>,
        config: ServiceConfig,
        messenger: Arc<dyn Messenger>,
        payments: Arc<dyn PaymentProvider>,
        ledger: Arc<dyn LedgerClient>,
    ) -> Self {
        Self {
            store,
            config,
            messenger,
            payments,
            ledger,
        }
    }
}
