//! WhatsApp Graph API payload types.
//!
//! Inbound types cover the webhook envelope delivered by Meta; outbound
//! types cover the `/{phone_number_id}/messages` endpoint. Unknown fields
//! are ignored so the envelope survives Graph API additions.

use serde::{Deserialize, Serialize};

// ============================================================================
// Inbound webhook envelope
// ============================================================================

/// Top-level webhook payload.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// Always `whatsapp_business_account` for this integration.
    #[serde(default)]
    pub object: String,
    /// One entry per subscribed account.
    #[serde(default)]
    pub entry: Vec<Entry>,
}

/// One account entry.
#[derive(Debug, Deserialize)]
pub struct Entry {
    /// Changes batched into this delivery.
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// One change notification.
#[derive(Debug, Deserialize)]
pub struct Change {
    /// The change value; messages live here.
    pub value: ChangeValue,
}

/// The value of a change notification.
///
/// Status-only deliveries (sent/read receipts) carry no `messages` and
/// are acknowledged without processing.
#[derive(Debug, Deserialize)]
pub struct ChangeValue {
    /// Inbound messages, absent on status updates.
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

/// One inbound message.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    /// Sender phone number as delivered by Meta (digits, no plus).
    pub from: String,
    /// Message id.
    pub id: String,
    /// Message type (`text`, `interactive`, ...).
    #[serde(rename = "type", default)]
    pub message_type: String,
    /// Text content, present for `text` messages.
    #[serde(default)]
    pub text: Option<TextContent>,
    /// Interactive content, present for button replies.
    #[serde(default)]
    pub interactive: Option<InteractiveContent>,
}

impl InboundMessage {
    /// The command text carried by this message: the text body, or the
    /// tapped button's id so a tap classifies like the typed keyword.
    #[must_use]
    pub fn command_text(&self) -> Option<&str> {
        if let Some(text) = &self.text {
            return Some(&text.body);
        }
        self.interactive
            .as_ref()
            .and_then(|i| i.button_reply.as_ref())
            .map(|b| b.id.as_str())
    }
}

/// Text message content.
#[derive(Debug, Deserialize)]
pub struct TextContent {
    /// The message body.
    pub body: String,
}

/// Interactive message content.
#[derive(Debug, Deserialize)]
pub struct InteractiveContent {
    /// Button reply, present when the user tapped a menu button.
    #[serde(default)]
    pub button_reply: Option<ButtonReply>,
}

/// A tapped button.
#[derive(Debug, Deserialize)]
pub struct ButtonReply {
    /// The button id chosen when the menu was sent.
    pub id: String,
    /// The button label.
    #[serde(default)]
    pub title: String,
}

// ============================================================================
// Outbound messages
// ============================================================================

/// A menu button offered in an interactive message.
#[derive(Debug, Clone)]
pub struct MenuButton {
    /// Id delivered back in the button reply.
    pub id: &'static str,
    /// Label shown to the user.
    pub title: &'static str,
}

/// Outbound text message request.
#[derive(Debug, Serialize)]
pub struct OutboundText<'a> {
    pub(crate) messaging_product: &'static str,
    pub(crate) to: &'a str,
    #[serde(rename = "type")]
    pub(crate) message_type: &'static str,
    pub(crate) text: OutboundTextBody<'a>,
}

/// Body of an outbound text message.
#[derive(Debug, Serialize)]
pub struct OutboundTextBody<'a> {
    pub(crate) body: &'a str,
}

impl<'a> OutboundText<'a> {
    /// Build a text message to `to` (canonical phone form).
    #[must_use]
    pub fn new(to: &'a str, body: &'a str) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            message_type: "text",
            text: OutboundTextBody { body },
        }
    }
}

/// Outbound interactive button-menu request.
#[derive(Debug, Serialize)]
pub struct OutboundMenu<'a> {
    pub(crate) messaging_product: &'static str,
    pub(crate) to: &'a str,
    #[serde(rename = "type")]
    pub(crate) message_type: &'static str,
    pub(crate) interactive: OutboundInteractive<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OutboundInteractive<'a> {
    #[serde(rename = "type")]
    pub(crate) interactive_type: &'static str,
    pub(crate) body: OutboundTextBody<'a>,
    pub(crate) action: OutboundAction,
}

#[derive(Debug, Serialize)]
pub(crate) struct OutboundAction {
    pub(crate) buttons: Vec<OutboundButton>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OutboundButton {
    #[serde(rename = "type")]
    pub(crate) button_type: &'static str,
    pub(crate) reply: OutboundButtonReply,
}

#[derive(Debug, Serialize)]
pub(crate) struct OutboundButtonReply {
    pub(crate) id: &'static str,
    pub(crate) title: &'static str,
}

impl<'a> OutboundMenu<'a> {
    /// Build a button-menu message to `to` (canonical phone form).
    #[must_use]
    pub fn new(to: &'a str, body: &'a str, buttons: &[MenuButton]) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            message_type: "interactive",
            interactive: OutboundInteractive {
                interactive_type: "button",
                body: OutboundTextBody { body },
                action: OutboundAction {
                    buttons: buttons
                        .iter()
                        .map(|b| OutboundButton {
                            button_type: "reply",
                            reply: OutboundButtonReply {
                                id: b.id,
                                title: b.title,
                            },
                        })
                        .collect(),
                },
            },
        }
    }
}
