use crate::config::{BotConfig, LimitsConfig};
use crate::reply::{self, RawBotReply};
use crate::types::BotReply;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Serialize)]
struct TokenClaims<'a> {
    user: TokenUser<'a>,
}

#[derive(Serialize)]
struct TokenUser<'a> {
    username: &'a str,
    role: &'a str,
}

/// Client for the dialogue-management bot backend. A send is one
/// conversation turn: the message goes out under a per-call signed
/// identity, and transient or semantically-empty replies are retried
/// with exponential backoff until the budget runs out.
#[derive(Clone)]
pub struct BotClient {
    http: Client,
    config: BotConfig,
    limits: LimitsConfig,
}

impl BotClient {
    pub fn new(http: Client, config: BotConfig, limits: LimitsConfig) -> Self {
        Self {
            http,
            config,
            limits,
        }
    }

    /// Delay slept before retrying after attempt `attempt` (0-indexed).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.config.retry_base_delay_ms.saturating_mul(factor))
    }

    fn webhook_url(&self) -> String {
        format!(
            "{}/webhooks/{}/webhook",
            self.config.url.trim_end_matches('/'),
            self.config.channel
        )
    }

    fn sign_token(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = TokenClaims {
            user: TokenUser {
                username,
                role: "guest",
            },
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
    }

    /// Send one conversation turn to the bot. Never fails: when every
    /// attempt yields a transport error or an empty reply, the last
    /// (possibly empty) reply is returned and the bridge degrades to
    /// silence.
    pub async fn send(&self, contact: &str, message: &str, conversation_id: i64) -> BotReply {
        let message: String = message
            .chars()
            .take(self.limits.max_message_characters)
            .collect();
        let username = format!("{contact}_{conversation_id}");
        let token = match self.sign_token(&username) {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "bot token signing failed");
                return BotReply::default();
            }
        };
        let url = self.webhook_url();
        let payload = json!({"sender": username, "message": message});

        let mut last = BotReply::default();
        let attempts = self.config.retry_count.max(1);
        for attempt in 0..attempts {
            let result = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .timeout(Duration::from_secs(self.config.request_timeout_seconds))
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<RawBotReply>().await {
                        Ok(raw) => {
                            last = reply::extract(&self.http, raw, &self.limits).await;
                            if !last.is_empty() {
                                return last;
                            }
                            debug!(attempt, "bot reply empty, retrying");
                        }
                        Err(err) => {
                            warn!(attempt, error = %err, "bot reply parse failed");
                        }
                    }
                }
                Ok(resp) => {
                    warn!(attempt, status = %resp.status(), "bot call rejected");
                }
                Err(err) => {
                    warn!(attempt, error = %err, "bot call failed");
                }
            }

            if attempt + 1 < attempts {
                sleep(self.backoff_delay(attempt)).await;
            }
        }
        last
    }
}
