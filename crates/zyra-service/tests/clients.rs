//! HTTP client tests against mocked upstream APIs.

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zyra_core::CanonicalPhone;
use zyra_service::whatsapp::types::MenuButton;
use zyra_service::{
    DarajaClient, GatewayClient, LedgerClient, LedgerError, Messenger, PaymentProvider,
    WhatsAppClient,
};

// ============================================================================
// WhatsApp Graph API
// ============================================================================

#[tokio::test]
async fn whatsapp_sends_text_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/12345/messages"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "messaging_product": "whatsapp",
            "to": "+254712345678",
            "type": "text",
            "text": { "body": "Your balance is 50." }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": "wamid.out" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WhatsAppClient::new(server.uri(), "12345", "test-token");
    client
        .send_text(
            &CanonicalPhone::normalize("0712345678"),
            "Your balance is 50.",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn whatsapp_sends_button_menu() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/12345/messages"))
        .and(body_partial_json(json!({
            "type": "interactive",
            "interactive": {
                "type": "button",
                "action": {
                    "buttons": [
                        { "type": "reply", "reply": { "id": "deposit", "title": "Deposit" } }
                    ]
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = WhatsAppClient::new(server.uri(), "12345", "test-token");
    client
        .send_menu(
            &CanonicalPhone::normalize("0712345678"),
            "What next?",
            &[MenuButton {
                id: "deposit",
                title: "Deposit",
            }],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn whatsapp_surfaces_api_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/12345/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid OAuth access token" }
        })))
        .mount(&server)
        .await;

    let client = WhatsAppClient::new(server.uri(), "12345", "bad-token");
    let result = client
        .send_text(&CanonicalPhone::normalize("0712345678"), "hi")
        .await;

    assert!(result.is_err());
}

// ============================================================================
// Daraja
// ============================================================================

#[tokio::test]
async fn daraja_authenticates_then_pushes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/v1/generate"))
        .and(query_param("grant_type", "client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "oauth-token",
            "expires_in": "3599"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush/v1/processrequest"))
        .and(header("authorization", "Bearer oauth-token"))
        .and(body_partial_json(json!({
            "BusinessShortCode": "174379",
            "TransactionType": "CustomerPayBillOnline",
            "Amount": "500",
            "PartyA": "254712345678",
            "PhoneNumber": "254712345678",
            "AccountReference": "GPAYER"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DarajaClient::new(
        server.uri(),
        "consumer-key",
        "consumer-secret",
        "174379",
        "passkey",
        "http://localhost:8080/webhooks/mpesa?secret=s",
    );

    let initiation = client
        .initiate_deposit(
            &CanonicalPhone::normalize("0712345678"),
            Decimal::from(500),
            "GPAYER",
        )
        .await
        .unwrap();

    assert_eq!(initiation.merchant_request_id, "29115-34620561-1");
    assert_eq!(initiation.checkout_request_id, "ws_CO_191220191020363925");
}

#[tokio::test]
async fn daraja_rejected_push_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/v1/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "oauth-token"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush/v1/processrequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MerchantRequestID": "m",
            "CheckoutRequestID": "c",
            "ResponseCode": "1",
            "ResponseDescription": "Insufficient funds on shortcode"
        })))
        .mount(&server)
        .await;

    let client = DarajaClient::new(
        server.uri(),
        "consumer-key",
        "consumer-secret",
        "174379",
        "passkey",
        "http://localhost:8080/webhooks/mpesa",
    );

    let result = client
        .initiate_deposit(
            &CanonicalPhone::normalize("0712345678"),
            Decimal::from(500),
            "GPAYER",
        )
        .await;

    assert!(result.is_err());
}

// ============================================================================
// Ledger gateway
// ============================================================================

#[tokio::test]
async fn gateway_creates_keypair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/keypairs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_key": "GABC",
            "secret_key": "SABC"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::new(server.uri(), server.uri(), server.uri());
    let keypair = client.create_keypair().await.unwrap();

    assert_eq!(keypair.public_key, "GABC");
    assert_eq!(keypair.secret_key, "SABC");
}

#[tokio::test]
async fn gateway_funds_account_via_friendbot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("addr", "GABC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hash": "h" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::new(server.uri(), server.uri(), server.uri());
    client.fund_test_account("GABC").await.unwrap();
}

#[tokio::test]
async fn gateway_transfer_polls_until_confirmed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transfers"))
        .and(body_partial_json(json!({
            "source_secret": "SABC",
            "destination": "GDEF",
            "amount": "30"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hash": "abc123" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transactions/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "successful": true })))
        .mount(&server)
        .await;

    let client = GatewayClient::new(server.uri(), server.uri(), server.uri());
    let hash = client
        .transfer("SABC", "GDEF", Decimal::from(30))
        .await
        .unwrap();

    assert_eq!(hash, "abc123");
}

#[tokio::test]
async fn gateway_reads_native_balance_from_horizon() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts/GABC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "balances": [
                { "balance": "12.5000000", "asset_type": "credit_alphanum4", "asset_code": "USDC" },
                { "balance": "10000.0000000", "asset_type": "native" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::new(server.uri(), server.uri(), server.uri());
    let balance = client.get_balance("GABC").await.unwrap();

    assert_eq!(balance, "10000.0000000".parse::<Decimal>().unwrap());
}

#[tokio::test]
async fn gateway_balance_of_unfunded_account_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts/GABC"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": 404,
            "title": "Resource Missing"
        })))
        .mount(&server)
        .await;

    let client = GatewayClient::new(server.uri(), server.uri(), server.uri());
    let result = client.get_balance("GABC").await;

    assert!(matches!(result, Err(LedgerError::Api { status: 404, .. })));
}

#[tokio::test]
async fn gateway_surfaces_submission_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transfers"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "underfunded source account"
        })))
        .mount(&server)
        .await;

    let client = GatewayClient::new(server.uri(), server.uri(), server.uri());
    let result = client.transfer("SABC", "GDEF", Decimal::from(30)).await;

    assert!(matches!(result, Err(LedgerError::Api { status: 400, .. })));
}
