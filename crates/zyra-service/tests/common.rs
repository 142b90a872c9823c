//! Common test utilities for zyra integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use rust_decimal::Decimal;
use tempfile::TempDir;

use zyra_core::CanonicalPhone;
use zyra_service::whatsapp::types::MenuButton;
use zyra_service::{
    create_router, AppState, LedgerClient, LedgerError, Messenger, MessengerError, PaymentError,
    PaymentProvider, ServiceConfig,
};
use zyra_service::mpesa::DepositInitiation;
use zyra_service::stellar::Keypair;
use zyra_store::{RocksStore, Store};

/// Secret baked into the callback URL for tests.
pub const CALLBACK_SECRET: &str = "test-callback-secret";

/// Verify token for the WhatsApp handshake in tests.
pub const VERIFY_TOKEN: &str = "test-verify";

/// One message captured by the recording messenger.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
    pub buttons: Vec<String>,
}

impl SentMessage {
    pub fn is_menu(&self) -> bool {
        !self.buttons.is_empty()
    }
}

/// Messenger that records outbound messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<SentMessage>>,
}

impl RecordingMessenger {
    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages_to(&self, phone: &str) -> Vec<SentMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.to == phone)
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, to: &CanonicalPhone, body: &str) -> Result<(), MessengerError> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            buttons: Vec::new(),
        });
        Ok(())
    }

    async fn send_menu(
        &self,
        to: &CanonicalPhone,
        body: &str,
        buttons: &[MenuButton],
    ) -> Result<(), MessengerError> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            buttons: buttons.iter().map(|b| b.title.to_string()).collect(),
        });
        Ok(())
    }
}

/// Payment provider that hands out sequential correlation ids.
#[derive(Debug, Default)]
pub struct MockPayments {
    counter: AtomicUsize,
    pub calls: Mutex<Vec<(String, Decimal, String)>>,
    pub fail: AtomicBool,
}

impl MockPayments {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentProvider for MockPayments {
    async fn initiate_deposit(
        &self,
        phone: &CanonicalPhone,
        amount: Decimal,
        account_ref: &str,
    ) -> Result<DepositInitiation, PaymentError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PaymentError::NotConfigured);
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls
            .lock()
            .unwrap()
            .push((phone.to_string(), amount, account_ref.to_string()));

        Ok(DepositInitiation {
            merchant_request_id: format!("mr-{n}"),
            checkout_request_id: format!("co-{n}"),
        })
    }
}

/// Ledger client that fabricates keypairs and transfer hashes.
#[derive(Debug, Default)]
pub struct MockLedger {
    counter: AtomicUsize,
    pub funded: Mutex<Vec<String>>,
    pub transfers: Mutex<Vec<(String, Decimal)>>,
    pub fail_transfer: AtomicBool,
}

impl MockLedger {
    pub fn funded_keys(&self) -> Vec<String> {
        self.funded.lock().unwrap().clone()
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn create_keypair(&self) -> Result<Keypair, LedgerError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Keypair {
            public_key: format!("GTEST{n}"),
            secret_key: format!("STEST{n}"),
        })
    }

    async fn fund_test_account(&self, public_key: &str) -> Result<(), LedgerError> {
        self.funded.lock().unwrap().push(public_key.to_string());
        Ok(())
    }

    async fn transfer(
        &self,
        _source_secret: &str,
        destination: &str,
        amount: Decimal,
    ) -> Result<String, LedgerError> {
        if self.fail_transfer.load(Ordering::SeqCst) {
            return Err(LedgerError::ConfirmationTimeout {
                hash: "deadbeef".into(),
                attempts: 30,
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.transfers
            .lock()
            .unwrap()
            .push((destination.to_string(), amount));
        Ok(format!("hash-{n}"))
    }

    async fn get_balance(&self, _public_key: &str) -> Result<Decimal, LedgerError> {
        Ok(Decimal::ZERO)
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// Direct store handle for seeding and assertions.
    pub store: Arc<RocksStore>,
    /// Captured outbound WhatsApp messages.
    pub messenger: Arc<RecordingMessenger>,
    /// Recorded deposit initiations.
    pub payments: Arc<MockPayments>,
    /// Recorded ledger operations.
    pub ledger: Arc<MockLedger>,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and mock clients.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let config = ServiceConfig {
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            whatsapp_verify_token: VERIFY_TOKEN.into(),
            mpesa_callback_secret: Some(CALLBACK_SECRET.into()),
            deposit_topup_amount: Decimal::from(10_000),
            ..ServiceConfig::default()
        };

        let messenger = Arc::new(RecordingMessenger::default());
        let payments = Arc::new(MockPayments::default());
        let ledger = Arc::new(MockLedger::default());

        let state = AppState::with_clients(
            store.clone(),
            config,
            messenger.clone(),
            payments.clone(),
            ledger.clone(),
        );
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            store,
            messenger,
            payments,
            ledger,
        }
    }

    /// Register an account over the API and return its canonical phone.
    pub async fn register(&self, phone: &str, email: &str) -> String {
        let response = self
            .server
            .post("/v1/accounts")
            .json(&serde_json::json!({
                "phone": phone,
                "email": email,
                "password": "hunter2hunter2"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["phone"].as_str().unwrap().to_string()
    }

    /// Request a verification code for a phone.
    pub async fn request_code(&self, phone: &str) -> String {
        let response = self
            .server
            .post("/v1/accounts/verification")
            .json(&serde_json::json!({ "phone": phone }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["code"].as_str().unwrap().to_string()
    }

    /// Deliver one WhatsApp text message through the webhook.
    pub async fn whatsapp_message(&self, from: &str, text: &str) -> axum_test::TestResponse {
        self.server
            .post("/webhooks/whatsapp")
            .json(&whatsapp_text_payload(from, text))
            .await
    }

    /// Seed a balance directly in the store.
    pub fn set_balance(&self, phone: &str, balance: Decimal) {
        let canonical = CanonicalPhone::normalize(phone);
        let mut account = self
            .store
            .get_account_by_phone(&canonical)
            .unwrap()
            .expect("account must exist");
        account.balance = balance;
        self.store.update_account(&account).unwrap();
    }

    /// Read a balance directly from the store.
    pub fn balance_of(&self, phone: &str) -> Decimal {
        let canonical = CanonicalPhone::normalize(phone);
        self.store
            .get_account_by_phone(&canonical)
            .unwrap()
            .expect("account must exist")
            .balance
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a Graph-style webhook payload carrying one text message.
///
/// `from` is delivered the way Meta sends it: digits without a plus.
pub fn whatsapp_text_payload(from: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "changes": [{
                "value": {
                    "messages": [{
                        "from": from.trim_start_matches('+'),
                        "id": "wamid.test",
                        "type": "text",
                        "text": { "body": text }
                    }]
                }
            }]
        }]
    })
}

/// Build a webhook payload carrying one button tap.
pub fn whatsapp_button_payload(from: &str, button_id: &str) -> serde_json::Value {
    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "changes": [{
                "value": {
                    "messages": [{
                        "from": from.trim_start_matches('+'),
                        "id": "wamid.test",
                        "type": "interactive",
                        "interactive": {
                            "button_reply": { "id": button_id, "title": button_id }
                        }
                    }]
                }
            }]
        }]
    })
}

/// Build a Daraja success callback for the given correlation ids.
pub fn mpesa_success_callback(
    merchant_request_id: &str,
    checkout_request_id: &str,
    receipt: &str,
) -> serde_json::Value {
    serde_json::json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": merchant_request_id,
                "CheckoutRequestID": checkout_request_id,
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        { "Name": "Amount", "Value": 500.0 },
                        { "Name": "MpesaReceiptNumber", "Value": receipt },
                        { "Name": "PhoneNumber", "Value": 254712345678u64 }
                    ]
                }
            }
        }
    })
}

/// Build a Daraja failure callback.
pub fn mpesa_failure_callback(
    merchant_request_id: &str,
    checkout_request_id: &str,
) -> serde_json::Value {
    serde_json::json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": merchant_request_id,
                "CheckoutRequestID": checkout_request_id,
                "ResultCode": 1032,
                "ResultDesc": "Request cancelled by user"
            }
        }
    })
}
