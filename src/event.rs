use crate::config::Config;
use crate::error::BridgeError;
use crate::ocr::TextExtractor;
use crate::types::{BotRoute, RoutingDecision};
use serde::Deserialize;
use tracing::warn;

/// Raw webhook body. The platform emits two layouts: message events carry
/// a `conversation` object, conversation-status events put the status at
/// the top level and identify the conversation through `messages[0]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundEvent {
    pub event: Option<String>,
    pub message_type: Option<String>,
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub private: Option<bool>,
    pub sender: Option<Sender>,
    pub account: Option<Account>,
    pub conversation: Option<Conversation>,
    pub status: Option<String>,
    #[serde(default)]
    pub messages: Vec<EventMessage>,
    pub content_attributes: Option<EventContentAttributes>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub contact_inbox: Option<ContactInbox>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactInbox {
    pub contact_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationMessage {
    #[serde(default)]
    pub attachments: Vec<EventAttachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventAttachment {
    pub data_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    pub account_id: Option<i64>,
    pub conversation_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventContentAttributes {
    #[serde(default)]
    pub submitted_values: Vec<SubmittedValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedValue {
    pub value: Option<serde_json::Value>,
}

/// Canonical identifiers resolved once per request, whichever layout the
/// event arrived in.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    pub account_id: i64,
    pub conversation_id: i64,
    pub status: Option<String>,
}

/// Resolve conversation and account identifiers from either event layout.
/// An event matching neither is malformed and fails the request instead
/// of panicking downstream.
pub fn normalize(event: &InboundEvent) -> Result<EventContext, BridgeError> {
    let account_from_messages = event.messages.first().and_then(|m| m.account_id);
    let account_id = event
        .account
        .as_ref()
        .and_then(|a| a.id)
        .or(account_from_messages)
        .ok_or_else(|| BridgeError::MalformedEvent("account id missing".to_string()))?;

    if let Some(conversation) = &event.conversation {
        let conversation_id = conversation
            .id
            .ok_or_else(|| BridgeError::MalformedEvent("conversation id missing".to_string()))?;
        return Ok(EventContext {
            account_id,
            conversation_id,
            status: conversation.status.clone(),
        });
    }

    let conversation_id = event
        .messages
        .first()
        .and_then(|m| m.conversation_id)
        .ok_or_else(|| {
            BridgeError::MalformedEvent(
                "event carries neither a conversation nor messages".to_string(),
            )
        })?;
    Ok(EventContext {
        account_id,
        conversation_id,
        status: event.status.clone(),
    })
}

fn contact_id(event: &InboundEvent) -> Result<i64, BridgeError> {
    event
        .conversation
        .as_ref()
        .and_then(|c| c.contact_inbox.as_ref())
        .and_then(|ci| ci.contact_id)
        .ok_or_else(|| BridgeError::MalformedEvent("conversation contact id missing".to_string()))
}

fn sender_id(event: &InboundEvent) -> Result<i64, BridgeError> {
    event
        .sender
        .as_ref()
        .and_then(|s| s.id)
        .ok_or_else(|| BridgeError::MalformedEvent("sender id missing".to_string()))
}

fn attachment_urls(event: &InboundEvent) -> Vec<String> {
    event
        .conversation
        .iter()
        .flat_map(|c| &c.messages)
        .flat_map(|m| &m.attachments)
        .filter_map(|a| a.data_url.clone())
        .collect()
}

fn submitted_value_text(value: &SubmittedValue) -> String {
    match &value.value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Decide what an inbound event means for the bot. Rules apply in
/// precedence order: agent mention, form-submission replacement,
/// attachment text synthesis, survey trigger, then the plain routing
/// predicate.
pub async fn classify(
    event: &InboundEvent,
    ctx: &EventContext,
    config: &Config,
    extractor: &dyn TextExtractor,
) -> Result<RoutingDecision, BridgeError> {
    let message_type = event.message_type.as_deref();
    let status = ctx.status.as_deref();
    let event_kind = event.event.as_deref();
    let is_update = event_kind == Some("message_updated");
    let csat_submission = event.content_type.as_deref() == Some("input_csat");

    let mut message = event.content.clone().unwrap_or_default();
    let mut private = event.private.unwrap_or(false);
    let mut contact = event
        .sender
        .as_ref()
        .and_then(|s| s.id)
        .map(|id| id.to_string());
    let mut agent_mention = false;

    if config.mention.enabled && message_type == Some("outgoing") {
        let token = format!("@{}", config.mention.bot_name);
        if let Some(stripped) = message.strip_prefix(&token) {
            contact = Some(contact_id(event)?.to_string());
            message = stripped.to_string();
            agent_mention = true;
        }
    }

    if is_update && !csat_submission {
        contact = Some(contact_id(event)?.to_string());
        let values = event
            .content_attributes
            .as_ref()
            .map(|ca| ca.submitted_values.as_slice())
            .unwrap_or(&[]);
        message = values
            .iter()
            .map(submitted_value_text)
            .collect::<Vec<_>>()
            .join("\n");
    }

    if event_kind == Some("message_created") && message.is_empty() {
        for url in attachment_urls(event) {
            let extracted = if url.ends_with(".pdf") {
                extractor.pdf_text(&url).await
            } else {
                extractor.image_text(&url).await
            };
            match extracted {
                Ok(text) => message.push_str(&text),
                Err(err) => {
                    warn!(url = %url, error = %err, "attachment text extraction failed");
                }
            }
        }
    }

    if status == Some("resolved") && message_type.is_none() && config.csat.enabled {
        return Ok(RoutingDecision::SendSurvey);
    }

    let routable = (message_type == Some("incoming") || is_update)
        && status == Some("pending")
        && !csat_submission
        && !message.is_empty();

    if routable || agent_mention {
        if agent_mention && status == Some("pending") {
            private = false;
        } else if agent_mention {
            contact = Some(format!("agent-{}", sender_id(event)?));
        }
        let contact =
            contact.ok_or_else(|| BridgeError::MalformedEvent("sender id missing".to_string()))?;
        return Ok(RoutingDecision::SendToBot(BotRoute {
            contact,
            message,
            private,
            agent_mention,
        }));
    }

    Ok(RoutingDecision::Ignore)
}
