use crate::config::LimitsConfig;
use crate::types::{BotReply, Button, CustomPayload};
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

/// The two shapes the bot backend answers with: an ordered list of reply
/// fragments, or a single object carrying only a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawBotReply {
    Fragments(Vec<Fragment>),
    Single(SingleReply),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fragment {
    pub text: Option<String>,
    #[serde(default)]
    pub buttons: Vec<RawButton>,
    pub custom: Option<CustomPayload>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawButton {
    pub title: Option<String>,
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingleReply {
    pub message: Option<String>,
}

/// Reply folded down to one value per field, image still a URL.
#[derive(Debug, Clone, Default)]
pub struct FoldedReply {
    pub text: String,
    pub buttons: Vec<Button>,
    pub custom: Option<CustomPayload>,
    pub image_url: Option<String>,
}

pub fn truncate_title(title: &str, max_length: usize) -> String {
    if title.chars().count() > max_length {
        let kept: String = title.chars().take(max_length.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        title.to_string()
    }
}

/// Fold a raw reply into one text/buttons/custom/image view. Fragment
/// texts join in order with newlines; buttons accumulate across fragments
/// and are capped at the end; the last fragment wins for custom payloads
/// and images.
pub fn fold_reply(raw: RawBotReply, limits: &LimitsConfig) -> FoldedReply {
    let mut folded = FoldedReply::default();
    match raw {
        RawBotReply::Fragments(fragments) => {
            let mut texts = Vec::new();
            for fragment in fragments {
                if let Some(text) = fragment.text {
                    if !text.is_empty() {
                        texts.push(text);
                    }
                }
                for button in fragment.buttons {
                    folded.buttons.push(Button {
                        title: truncate_title(
                            button.title.as_deref().unwrap_or_default(),
                            limits.max_button_title_length,
                        ),
                        value: button.payload,
                    });
                }
                if let Some(custom) = fragment.custom {
                    if !custom.is_empty() {
                        folded.custom = Some(custom);
                    }
                }
                if let Some(image) = fragment.image {
                    folded.image_url = Some(image);
                }
            }
            folded.text = texts.join("\n");
            folded.buttons.truncate(limits.max_buttons);
        }
        RawBotReply::Single(single) => {
            folded.text = single.message.unwrap_or_default();
        }
    }
    folded
}

/// Turn an image reference into bytes: base64 data URLs decode in place,
/// anything else is fetched. Failures are logged and drop the image.
pub async fn resolve_image(client: &Client, url: &str) -> Option<Bytes> {
    if let Some(rest) = url.strip_prefix("data:") {
        let encoded = rest.split_once(";base64,").map(|(_, data)| data)?;
        return match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(bytes) => Some(Bytes::from(bytes)),
            Err(err) => {
                warn!(error = %err, "bot image data url decode failed");
                None
            }
        };
    }

    let resp = match client.get(url).send().await {
        Ok(resp) => resp,
        Err(err) => {
            warn!(url, error = %err, "bot image fetch failed");
            return None;
        }
    };
    match resp.bytes().await {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!(url, error = %err, "bot image body read failed");
            None
        }
    }
}

/// Parse and normalize a raw bot reply, resolving any image to bytes.
pub async fn extract(client: &Client, raw: RawBotReply, limits: &LimitsConfig) -> BotReply {
    let folded = fold_reply(raw, limits);
    let image = match folded.image_url.as_deref() {
        Some(url) => resolve_image(client, url).await,
        None => None,
    };
    BotReply {
        text: folded.text,
        buttons: folded.buttons,
        custom: folded.custom,
        image,
    }
}
