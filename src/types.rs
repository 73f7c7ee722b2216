use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single quick-reply button offered to the contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub title: String,
    pub value: Option<String>,
}

/// Free-form structured payload a bot fragment may carry instead of buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub elements: Vec<serde_json::Value>,
}

impl CustomPayload {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.elements.is_empty()
    }
}

/// Normalized bot reply, folded from however many fragments the bot sent.
#[derive(Debug, Clone, Default)]
pub struct BotReply {
    pub text: String,
    pub buttons: Vec<Button>,
    pub custom: Option<CustomPayload>,
    pub image: Option<Bytes>,
}

impl BotReply {
    /// True when the bot produced nothing worth posting: no text, no
    /// buttons, no custom payload, no image.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.buttons.is_empty()
            && self.custom.is_none()
            && self.image.is_none()
    }
}

/// What to do with an inbound event, derived once and never revisited.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
    Ignore,
    SendToBot(BotRoute),
    SendSurvey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotRoute {
    pub contact: String,
    pub message: String,
    pub private: bool,
    pub agent_mention: bool,
}

/// Wire shape of the platform's message-creation request.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_attributes: Option<ContentAttributes>,
    pub private: bool,
    #[serde(skip)]
    pub image: Option<Bytes>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentAttributes {
    pub items: serde_json::Value,
}
