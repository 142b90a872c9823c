//! M-Pesa (Daraja) payment client.
//!
//! [`PaymentProvider`] abstracts deposit initiation; [`DarajaClient`]
//! implements it against the Daraja STK push API. The OAuth token is
//! fetched per request rather than cached: deposit volume is
//! conversational, far below the token lifetime.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use rust_decimal::Decimal;

use zyra_core::CanonicalPhone;

use self::types::{OAuthResponse, StkPushRequest, StkPushResponse};

/// Error type for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Daraja API returned an error.
    #[error("Daraja API error: {status} - {error}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        error: String,
    },

    /// The push was received but not accepted for processing.
    #[error("STK push rejected: {code} - {description}")]
    Rejected {
        /// Daraja response code.
        code: String,
        /// Daraja response description.
        description: String,
    },

    /// No payment credentials configured.
    #[error("payment provider not configured")]
    NotConfigured,
}

/// Correlation ids returned when a deposit is initiated.
#[derive(Debug, Clone)]
pub struct DepositInitiation {
    /// Daraja merchant request id.
    pub merchant_request_id: String,
    /// Daraja checkout request id.
    pub checkout_request_id: String,
}

/// Mobile-money deposit initiation.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Push a payment prompt to `phone` for `amount` and return the
    /// correlation ids the result callback will carry. `account_ref`
    /// labels the payment on the provider side; callers pass the
    /// account's public ledger address.
    async fn initiate_deposit(
        &self,
        phone: &CanonicalPhone,
        amount: Decimal,
        account_ref: &str,
    ) -> Result<DepositInitiation, PaymentError>;
}

/// Daraja STK push client.
#[derive(Debug, Clone)]
pub struct DarajaClient {
    client: Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    shortcode: String,
    passkey: String,
    callback_url: String,
}

impl DarajaClient {
    /// Create a new Daraja client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    pub fn new(
        base_url: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        shortcode: impl Into<String>,
        passkey: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            shortcode: shortcode.into(),
            passkey: passkey.into(),
            callback_url: callback_url.into(),
        }
    }

    /// Fetch a bearer token via client-credentials OAuth.
    async fn access_token(&self) -> Result<String, PaymentError> {
        let url = format!(
            "{}/oauth/v1/generate?grant_type=client_credentials",
            self.base_url
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(PaymentError::Api {
                status: status.as_u16(),
                error,
            });
        }

        let token: OAuthResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// The STK push password: `base64(shortcode + passkey + timestamp)`.
    fn password(&self, timestamp: &str) -> String {
        BASE64.encode(format!("{}{}{timestamp}", self.shortcode, self.passkey))
    }
}

#[async_trait]
impl PaymentProvider for DarajaClient {
    async fn initiate_deposit(
        &self,
        phone: &CanonicalPhone,
        amount: Decimal,
        account_ref: &str,
    ) -> Result<DepositInitiation, PaymentError> {
        let token = self.access_token().await?;

        let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S").to_string();
        // Daraja wants the subscriber number without the plus.
        let msisdn = phone.as_str().trim_start_matches('+').to_string();

        let request = StkPushRequest {
            business_short_code: self.shortcode.clone(),
            password: self.password(&timestamp),
            timestamp,
            transaction_type: "CustomerPayBillOnline",
            amount: amount.normalize().to_string(),
            party_a: msisdn.clone(),
            party_b: self.shortcode.clone(),
            phone_number: msisdn,
            callback_url: self.callback_url.clone(),
            account_reference: account_ref.to_string(),
            transaction_desc: "Wallet deposit".into(),
        };

        let url = format!("{}/mpesa/stkpush/v1/processrequest", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(PaymentError::Api {
                status: status.as_u16(),
                error,
            });
        }

        let push: StkPushResponse = response.json().await?;
        if push.response_code != "0" {
            return Err(PaymentError::Rejected {
                code: push.response_code,
                description: push.response_description,
            });
        }

        Ok(DepositInitiation {
            merchant_request_id: push.merchant_request_id,
            checkout_request_id: push.checkout_request_id,
        })
    }
}

/// Fallback provider used when no Daraja credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

#[async_trait]
impl PaymentProvider for DisabledProvider {
    async fn initiate_deposit(
        &self,
        _phone: &CanonicalPhone,
        _amount: Decimal,
        _account_ref: &str,
    ) -> Result<DepositInitiation, PaymentError> {
        Err(PaymentError::NotConfigured)
    }
}
