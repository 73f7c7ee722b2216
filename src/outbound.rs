use crate::types::{BotReply, ContentAttributes, OutboundMessage};
use serde_json::json;

/// Map a normalized bot reply onto the platform's message-creation shape.
/// Buttons become an `input_select`; a custom payload supplies its own
/// content type and items, overwriting buttons when both are present
/// (observed last-writer-wins, kept as-is).
pub fn compose(reply: &BotReply, private: bool) -> OutboundMessage {
    let mut message = OutboundMessage {
        content: reply.text.clone(),
        content_type: None,
        content_attributes: None,
        private,
        image: reply.image.clone(),
    };

    if !reply.buttons.is_empty() {
        message.content_type = Some("input_select".to_string());
        message.content_attributes = Some(ContentAttributes {
            items: serde_json::to_value(&reply.buttons).unwrap_or(json!([])),
        });
    }

    if let Some(custom) = &reply.custom {
        message.content_type = custom.kind.clone();
        message.content_attributes = Some(ContentAttributes {
            items: serde_json::Value::Array(custom.elements.clone()),
        });
    }

    message
}

/// Satisfaction-survey prompt sent when a conversation resolves. Ignores
/// any bot output entirely.
pub fn compose_survey(prompt: &str) -> OutboundMessage {
    OutboundMessage {
        content: prompt.to_string(),
        content_type: Some("input_csat".to_string()),
        content_attributes: None,
        private: false,
        image: None,
    }
}
