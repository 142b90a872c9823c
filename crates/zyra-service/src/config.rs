//! Service configuration.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/zyra").
    pub data_dir: String,

    /// Publicly reachable base URL of this service, used to build the
    /// payment callback URL (default: `<http://localhost:8080>`).
    pub public_url: String,

    /// WhatsApp Graph API base URL.
    pub whatsapp_api_url: String,

    /// WhatsApp business phone number id (optional; outbound messages
    /// are logged instead of sent when unset).
    pub whatsapp_phone_number_id: Option<String>,

    /// WhatsApp Graph API access token (optional).
    pub whatsapp_access_token: Option<String>,

    /// Token echoed back during the webhook subscription handshake.
    pub whatsapp_verify_token: String,

    /// App secret for `X-Hub-Signature-256` verification (optional).
    pub whatsapp_app_secret: Option<String>,

    /// Daraja API base URL.
    pub mpesa_api_url: String,

    /// Daraja consumer key (optional).
    pub mpesa_consumer_key: Option<String>,

    /// Daraja consumer secret (optional).
    pub mpesa_consumer_secret: Option<String>,

    /// Business shortcode for STK pushes.
    pub mpesa_shortcode: String,

    /// Daraja passkey used to derive the STK push password (optional).
    pub mpesa_passkey: Option<String>,

    /// Shared secret appended to the callback URL (optional; callbacks
    /// are accepted unverified when unset).
    pub mpesa_callback_secret: Option<String>,

    /// Ledger signing gateway base URL.
    pub ledger_gateway_url: String,

    /// Horizon base URL for transfer confirmation.
    pub horizon_url: String,

    /// Friendbot base URL for testnet funding.
    pub friendbot_url: String,

    /// Amount credited to a wallet when its deposit settles on testnet
    /// (default: 10000).
    pub deposit_topup_amount: Decimal,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// WhatsApp secrets file structure.
#[derive(Debug, Deserialize)]
struct WhatsAppSecrets {
    phone_number_id: String,
    access_token: String,
    #[serde(default)]
    verify_token: Option<String>,
    #[serde(default)]
    app_secret: Option<String>,
}

/// M-Pesa secrets file structure.
#[derive(Debug, Deserialize)]
struct MpesaSecrets {
    consumer_key: String,
    consumer_secret: String,
    passkey: String,
    #[serde(default)]
    shortcode: Option<String>,
    #[serde(default)]
    callback_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        // Try to load secrets from files first, then fall back to env vars
        let whatsapp = load_whatsapp_secrets();
        let mpesa = load_mpesa_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/zyra".into()),
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            whatsapp_api_url: std::env::var("WHATSAPP_API_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com/v18.0".into()),
            whatsapp_phone_number_id: whatsapp.0,
            whatsapp_access_token: whatsapp.1,
            whatsapp_verify_token: whatsapp
                .2
                .unwrap_or_else(|| "zyra-verify".into()),
            whatsapp_app_secret: whatsapp.3,
            mpesa_api_url: std::env::var("MPESA_API_URL")
                .unwrap_or_else(|_| "https://sandbox.safaricom.co.ke".into()),
            mpesa_consumer_key: mpesa.0,
            mpesa_consumer_secret: mpesa.1,
            mpesa_shortcode: mpesa.3.unwrap_or_else(|| "174379".into()),
            mpesa_passkey: mpesa.2,
            mpesa_callback_secret: mpesa.4,
            ledger_gateway_url: std::env::var("LEDGER_GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:8100".into()),
            horizon_url: std::env::var("HORIZON_URL")
                .unwrap_or_else(|_| "https://horizon-testnet.stellar.org".into()),
            friendbot_url: std::env::var("FRIENDBOT_URL")
                .unwrap_or_else(|_| "https://friendbot.stellar.org".into()),
            deposit_topup_amount: std::env::var("DEPOSIT_TOPUP_AMOUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| Decimal::from(10_000)),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }

    /// The callback URL registered with Daraja for STK push results.
    #[must_use]
    pub fn mpesa_callback_url(&self) -> String {
        let base = format!(
            "{}/webhooks/mpesa",
            self.public_url.trim_end_matches('/')
        );
        match &self.mpesa_callback_secret {
            Some(secret) => format!("{base}?secret={secret}"),
            None => base,
        }
    }
}

type WhatsAppFields = (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Load WhatsApp secrets from file or environment.
fn load_whatsapp_secrets() -> WhatsAppFields {
    let secret_paths = [".secrets/whatsapp.json", "../.secrets/whatsapp.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<WhatsAppSecrets>(path) {
            tracing::info!(path = %path, "Loaded WhatsApp secrets from file");
            return (
                Some(secrets.phone_number_id),
                Some(secrets.access_token),
                secrets.verify_token,
                secrets.app_secret,
            );
        }
    }

    tracing::debug!("WhatsApp secrets file not found, using environment variables");
    (
        std::env::var("WHATSAPP_PHONE_NUMBER_ID").ok(),
        std::env::var("WHATSAPP_ACCESS_TOKEN").ok(),
        std::env::var("WHATSAPP_VERIFY_TOKEN").ok(),
        std::env::var("WHATSAPP_APP_SECRET").ok(),
    )
}

type MpesaFields = (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Load M-Pesa secrets from file or environment.
fn load_mpesa_secrets() -> MpesaFields {
    let secret_paths = [".secrets/mpesa.json", "../.secrets/mpesa.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<MpesaSecrets>(path) {
            tracing::info!(path = %path, "Loaded M-Pesa secrets from file");
            return (
                Some(secrets.consumer_key),
                Some(secrets.consumer_secret),
                Some(secrets.passkey),
                secrets.shortcode,
                secrets.callback_secret,
            );
        }
    }

    tracing::debug!("M-Pesa secrets file not found, using environment variables");
    (
        std::env::var("MPESA_CONSUMER_KEY").ok(),
        std::env::var("MPESA_CONSUMER_SECRET").ok(),
        std::env::var("MPESA_PASSKEY").ok(),
        std::env::var("MPESA_SHORTCODE").ok(),
        std::env::var("MPESA_CALLBACK_SECRET").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/zyra".into(),
            public_url: "http://localhost:8080".into(),
            whatsapp_api_url: "https://graph.facebook.com/v18.0".into(),
            whatsapp_phone_number_id: None,
            whatsapp_access_token: None,
            whatsapp_verify_token: "zyra-verify".into(),
            whatsapp_app_secret: None,
            mpesa_api_url: "https://sandbox.safaricom.co.ke".into(),
            mpesa_consumer_key: None,
            mpesa_consumer_secret: None,
            mpesa_shortcode: "174379".into(),
            mpesa_passkey: None,
            mpesa_callback_secret: None,
            ledger_gateway_url: "http://localhost:8100".into(),
            horizon_url: "https://horizon-testnet.stellar.org".into(),
            friendbot_url: "https://friendbot.stellar.org".into(),
            deposit_topup_amount: Decimal::from(10_000),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
