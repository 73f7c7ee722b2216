use reqwest::StatusCode;
use thiserror::Error;

/// Failures that surface to the webhook caller. Transient bot trouble is
/// absorbed by the retry loop in [`crate::bot::BotClient`] and never
/// appears here.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("platform message create failed: {status} {body}")]
    PlatformPost { status: StatusCode, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl BridgeError {
    /// HTTP status the webhook response should carry for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
            BridgeError::PlatformPost { .. } | BridgeError::Http(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
