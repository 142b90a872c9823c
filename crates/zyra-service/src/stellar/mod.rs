//! Stellar ledger client.
//!
//! Keypair creation and transfer signing are delegated to a small
//! signing gateway so secret keys never pass through third-party SDK
//! code paths we don't control. Funding goes straight to friendbot, and
//! transfer confirmation polls Horizon with a bounded number of
//! attempts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How many times to poll Horizon for a transfer before giving up.
const MAX_CONFIRMATION_ATTEMPTS: u32 = 30;

/// Delay between confirmation polls.
const CONFIRMATION_INTERVAL: Duration = Duration::from_secs(1);

/// Error type for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway or Horizon returned an error.
    #[error("ledger API error: {status} - {error}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        error: String,
    },

    /// The submitted transfer never confirmed within the polling budget.
    #[error("transfer {hash} not confirmed after {attempts} attempts")]
    ConfirmationTimeout {
        /// The transaction hash that was polled.
        hash: String,
        /// How many polls were made.
        attempts: u32,
    },
}

/// A newly created ledger keypair.
#[derive(Debug, Clone, Deserialize)]
pub struct Keypair {
    /// Public address.
    pub public_key: String,
    /// Signing secret.
    pub secret_key: String,
}

/// Ledger operations used by account registration and transfers.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Create a fresh keypair.
    async fn create_keypair(&self) -> Result<Keypair, LedgerError>;

    /// Fund a testnet account via friendbot.
    async fn fund_test_account(&self, public_key: &str) -> Result<(), LedgerError>;

    /// Sign and submit a payment, wait for confirmation, and return the
    /// transaction hash.
    async fn transfer(
        &self,
        source_secret: &str,
        destination: &str,
        amount: Decimal,
    ) -> Result<String, LedgerError>;

    /// Read an account's native-asset balance from the ledger.
    async fn get_balance(&self, public_key: &str) -> Result<Decimal, LedgerError>;
}

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    source_secret: &'a str,
    destination: &'a str,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct TransferResponse {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct HorizonTransaction {
    #[serde(default)]
    successful: bool,
}

#[derive(Debug, Deserialize)]
struct HorizonAccount {
    #[serde(default)]
    balances: Vec<HorizonBalance>,
}

#[derive(Debug, Deserialize)]
struct HorizonBalance {
    balance: Decimal,
    asset_type: String,
}

/// HTTP client for the signing gateway, Horizon, and friendbot.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    gateway_url: String,
    horizon_url: String,
    friendbot_url: String,
}

impl GatewayClient {
    /// Create a new gateway client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    pub fn new(
        gateway_url: impl Into<String>,
        horizon_url: impl Into<String>,
        friendbot_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
            horizon_url: horizon_url.into().trim_end_matches('/').to_string(),
            friendbot_url: friendbot_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error = response.text().await.unwrap_or_else(|_| status.to_string());
        Err(LedgerError::Api {
            status: status.as_u16(),
            error,
        })
    }

    /// Poll Horizon until the transaction confirms or the budget runs out.
    async fn await_confirmation(&self, hash: &str) -> Result<(), LedgerError> {
        let url = format!("{}/transactions/{hash}", self.horizon_url);

        for attempt in 1..=MAX_CONFIRMATION_ATTEMPTS {
            let response = self.client.get(&url).send().await?;

            // Horizon 404s until the transaction is ingested.
            if response.status() != reqwest::StatusCode::NOT_FOUND {
                let response = Self::check(response).await?;
                let transaction: HorizonTransaction = response.json().await?;
                if transaction.successful {
                    tracing::debug!(hash = %hash, attempt, "Transfer confirmed");
                    return Ok(());
                }
            }

            tokio::time::sleep(CONFIRMATION_INTERVAL).await;
        }

        Err(LedgerError::ConfirmationTimeout {
            hash: hash.to_string(),
            attempts: MAX_CONFIRMATION_ATTEMPTS,
        })
    }
}

#[async_trait]
impl LedgerClient for GatewayClient {
    async fn create_keypair(&self) -> Result<Keypair, LedgerError> {
        let url = format!("{}/keypairs", self.gateway_url);
        let response = self.client.post(&url).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn fund_test_account(&self, public_key: &str) -> Result<(), LedgerError> {
        let response = self
            .client
            .get(&self.friendbot_url)
            .query(&[("addr", public_key)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn transfer(
        &self,
        source_secret: &str,
        destination: &str,
        amount: Decimal,
    ) -> Result<String, LedgerError> {
        let url = format!("{}/transfers", self.gateway_url);
        let response = self
            .client
            .post(&url)
            .json(&TransferRequest {
                source_secret,
                destination,
                amount: amount.normalize().to_string(),
            })
            .send()
            .await?;
        let response = Self::check(response).await?;
        let submitted: TransferResponse = response.json().await?;

        self.await_confirmation(&submitted.hash).await?;
        Ok(submitted.hash)
    }

    async fn get_balance(&self, public_key: &str) -> Result<Decimal, LedgerError> {
        let url = format!("{}/accounts/{public_key}", self.horizon_url);
        let response = self.client.get(&url).send().await?;
        let response = Self::check(response).await?;
        let account: HorizonAccount = response.json().await?;

        // Unfunded accounts 404 above; funded ones always carry a
        // native entry, so zero only shows up on malformed responses.
        let native = account
            .balances
            .into_iter()
            .find(|b| b.asset_type == "native")
            .map_or(Decimal::ZERO, |b| b.balance);
        Ok(native)
    }
}
