use crate::config::PlatformConfig;
use crate::error::BridgeError;
use crate::types::OutboundMessage;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypingStatus {
    On,
    Off,
}

impl TypingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TypingStatus::On => "on",
            TypingStatus::Off => "off",
        }
    }
}

/// Client for the support platform's conversation API. Message creation
/// is at-most-once: a rejected post is surfaced, never retried, so a
/// contact can't receive the same reply twice.
#[derive(Clone)]
pub struct PlatformClient {
    http: Client,
    config: PlatformConfig,
}

impl PlatformClient {
    pub fn new(http: Client, config: PlatformConfig) -> Self {
        Self { http, config }
    }

    fn conversation_url(&self, account: i64, conversation: i64, suffix: &str) -> String {
        format!(
            "{}/api/v1/accounts/{}/conversations/{}/{}",
            self.config.url.trim_end_matches('/'),
            account,
            conversation,
            suffix
        )
    }

    /// Post a message into a conversation. Replies carrying an image go
    /// out as a multipart upload under a generated filename; the platform
    /// treats an absent `private` field as non-private, so it is omitted
    /// from the form when false.
    pub async fn create_message(
        &self,
        account: i64,
        conversation: i64,
        message: &OutboundMessage,
    ) -> Result<Value, BridgeError> {
        let url = self.conversation_url(account, conversation, "messages");

        let resp = if let Some(image) = &message.image {
            let filename = format!("{}.jpg", Uuid::new_v4().simple());
            let part = reqwest::multipart::Part::bytes(image.to_vec())
                .file_name(filename)
                .mime_str("image/jpg")?;
            let mut form = reqwest::multipart::Form::new()
                .text("content", message.content.clone())
                .part("attachments[]", part);
            if message.private {
                form = form.text("private", "true");
            }
            if let Some(content_type) = &message.content_type {
                form = form.text("content_type", content_type.clone());
            }
            if let Some(attributes) = &message.content_attributes {
                form = form.text(
                    "content_attributes",
                    serde_json::to_string(attributes).unwrap_or_default(),
                );
            }
            self.http
                .post(&url)
                .header("api_access_token", &self.config.bot_token)
                .multipart(form)
                .send()
                .await?
        } else {
            self.http
                .post(&url)
                .header("api_access_token", &self.config.bot_token)
                .json(message)
                .send()
                .await?
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BridgeError::PlatformPost { status, body });
        }
        Ok(resp.json().await?)
    }

    /// Flip the typing indicator. Cosmetic only: failures are logged and
    /// swallowed so they can never break the reply flow.
    pub async fn toggle_typing(&self, account: i64, conversation: i64, status: TypingStatus) {
        let url = self.conversation_url(account, conversation, "toggle_typing_status");
        let result = self
            .http
            .post(&url)
            .header("api_access_token", &self.config.bot_token)
            .json(&json!({"status": status.as_str()}))
            .send()
            .await;
        match result {
            Ok(resp) if !resp.status().is_success() => {
                warn!(status = %resp.status(), "typing toggle rejected");
            }
            Err(err) => {
                warn!(error = %err, "typing toggle failed");
            }
            _ => {}
        }
    }
}
