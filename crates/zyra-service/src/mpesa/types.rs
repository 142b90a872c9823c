//! Daraja API payload types.
//!
//! Field names follow the wire format exactly (PascalCase with embedded
//! acronyms), so every field carries a serde rename.

use serde::{Deserialize, Serialize};

/// OAuth token response.
#[derive(Debug, Deserialize)]
pub struct OAuthResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// Lifetime in seconds (string on the wire).
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// STK push request.
#[derive(Debug, Serialize)]
pub struct StkPushRequest {
    /// Business shortcode.
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    /// `base64(shortcode + passkey + timestamp)`.
    #[serde(rename = "Password")]
    pub password: String,
    /// Timestamp in `YYYYMMDDHHMMSS` form.
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    /// Always `CustomerPayBillOnline` for deposits.
    #[serde(rename = "TransactionType")]
    pub transaction_type: &'static str,
    /// Whole-unit amount.
    #[serde(rename = "Amount")]
    pub amount: String,
    /// Paying phone number (digits, no plus).
    #[serde(rename = "PartyA")]
    pub party_a: String,
    /// Receiving shortcode.
    #[serde(rename = "PartyB")]
    pub party_b: String,
    /// Phone prompted with the STK push.
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    /// Result callback URL.
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    /// Account reference shown on the prompt.
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    /// Description shown on the prompt.
    #[serde(rename = "TransactionDesc")]
    pub transaction_desc: String,
}

/// STK push response.
#[derive(Debug, Deserialize)]
pub struct StkPushResponse {
    /// Correlation id for the merchant request.
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    /// Correlation id for the checkout request.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    /// `"0"` when the push was accepted for processing.
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    /// Human-readable response description.
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
}

/// Callback envelope posted by Daraja when the STK push resolves.
#[derive(Debug, Deserialize)]
pub struct CallbackEnvelope {
    /// The envelope body.
    #[serde(rename = "Body")]
    pub body: CallbackBody,
}

/// Body of the callback envelope.
#[derive(Debug, Deserialize)]
pub struct CallbackBody {
    /// The STK push result.
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

/// The STK push result.
#[derive(Debug, Deserialize)]
pub struct StkCallback {
    /// Correlation id for the merchant request.
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    /// Correlation id for the checkout request.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    /// Zero on success; any other value is a failure.
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    /// Human-readable result description.
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    /// Metadata items, present on success.
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

impl StkCallback {
    /// Whether the push completed successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    /// Extract the M-Pesa receipt number from the metadata items.
    #[must_use]
    pub fn receipt_number(&self) -> Option<String> {
        self.callback_metadata
            .as_ref()?
            .item
            .iter()
            .find(|item| item.name == "MpesaReceiptNumber")
            .and_then(|item| item.value.as_ref())
            .and_then(|value| value.as_str().map(ToString::to_string))
    }
}

/// Metadata attached to a successful callback.
#[derive(Debug, Deserialize)]
pub struct CallbackMetadata {
    /// The metadata items.
    #[serde(rename = "Item", default)]
    pub item: Vec<MetadataItem>,
}

/// One metadata item.
#[derive(Debug, Deserialize)]
pub struct MetadataItem {
    /// Item name (`Amount`, `MpesaReceiptNumber`, ...).
    #[serde(rename = "Name")]
    pub name: String,
    /// Item value; absent for some names.
    #[serde(rename = "Value", default)]
    pub value: Option<serde_json::Value>,
}

/// Acknowledgement returned to Daraja.
#[derive(Debug, Serialize)]
pub struct CallbackAck {
    /// Zero to acknowledge receipt.
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    /// Acknowledgement description.
    #[serde(rename = "ResultDesc")]
    pub result_desc: &'static str,
}

impl CallbackAck {
    /// The standard acknowledgement.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted",
        }
    }
}
