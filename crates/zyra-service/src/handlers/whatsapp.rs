//! WhatsApp webhook handlers.
//!
//! `GET /webhooks/whatsapp` answers Meta's subscription handshake;
//! `POST /webhooks/whatsapp` receives message deliveries, classifies
//! each inbound message, and executes the resulting command.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use zyra_core::{classify, CanonicalPhone};

use crate::commands;
use crate::crypto::verify_hub_signature;
use crate::error::ApiError;
use crate::state::AppState;
use crate::whatsapp::types::WebhookPayload;

/// Subscription handshake query parameters.
#[derive(Debug, Deserialize)]
pub struct HandshakeParams {
    /// Must be `subscribe`.
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    /// Must match the configured verify token.
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    /// Echoed back verbatim on success.
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
}

/// Answer Meta's webhook subscription handshake.
pub async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HandshakeParams>,
) -> Result<String, ApiError> {
    let subscribed = params.mode.as_deref() == Some("subscribe")
        && params.verify_token.as_deref() == Some(state.config.whatsapp_verify_token.as_str());

    if subscribed {
        tracing::info!("WhatsApp webhook handshake verified");
        return Ok(params.challenge.unwrap_or_default());
    }

    tracing::warn!(mode = ?params.mode, "WhatsApp webhook handshake rejected");
    Err(ApiError::Forbidden)
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Handle WhatsApp message deliveries.
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    // Verify the payload signature if an app secret is configured
    if let Some(app_secret) = &state.config.whatsapp_app_secret {
        let signature = headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Forbidden)?;

        if !verify_hub_signature(app_secret, &body, signature) {
            tracing::warn!("Invalid WhatsApp webhook signature");
            return Err(ApiError::Forbidden);
        }
    } else {
        tracing::warn!("WhatsApp app_secret not configured - skipping signature verification");
    }

    let payload: WebhookPayload =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    for entry in &payload.entry {
        for change in &entry.changes {
            // Status-only deliveries carry no messages and are just acked.
            for message in &change.value.messages {
                let Some(text) = message.command_text() else {
                    tracing::debug!(
                        message_id = %message.id,
                        message_type = %message.message_type,
                        "Message carries no command text, ignoring"
                    );
                    continue;
                };

                let sender = CanonicalPhone::normalize(&message.from);
                let command =
                    classify(text).map_err(|e| ApiError::BadRequest(e.to_string()))?;

                tracing::info!(from = %sender, command = %command, "Inbound WhatsApp command");
                commands::execute(&state, &sender, command).await?;
            }
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}
