pub mod bot;
pub mod config;
pub mod error;
pub mod event;
pub mod ocr;
pub mod outbound;
pub mod platform;
pub mod reply;
pub mod types;

pub use config::Config;
pub use error::BridgeError;

use self::bot::BotClient;
use self::event::InboundEvent;
use self::ocr::{NoopExtractor, TextExtractor};
use self::platform::{PlatformClient, TypingStatus};
use self::types::RoutingDecision;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub bot: BotClient,
    pub platform: PlatformClient,
    pub extractor: Arc<dyn TextExtractor>,
}

pub fn create_app(config: Config) -> (AppState, Router) {
    create_app_with_extractor(config, Arc::new(NoopExtractor))
}

pub fn create_app_with_extractor(
    config: Config,
    extractor: Arc<dyn TextExtractor>,
) -> (AppState, Router) {
    let http = reqwest::Client::new();
    let state = AppState {
        bot: BotClient::new(http.clone(), config.bot.clone(), config.limits.clone()),
        platform: PlatformClient::new(http, config.platform.clone()),
        config,
        extractor,
    };

    let app = Router::new()
        .route("/", post(handle_event))
        .route("/health-check/", get(health_check))
        .with_state(state.clone());

    (state, app)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn handle_event(State(state): State<AppState>, Json(event): Json<InboundEvent>) -> Response {
    match process_event(&state, &event).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            error!(error = %err, "event handling failed");
            (
                err.status_code(),
                Json(json!({"error": err.to_string()})),
            )
                .into_response()
        }
    }
}

/// One webhook, handled to completion: normalize, classify, then run the
/// bot flow or the survey flow. Ignored events answer with an empty
/// object so the platform sees a 200 either way.
async fn process_event(state: &AppState, event: &InboundEvent) -> Result<Value, BridgeError> {
    let ctx = event::normalize(event)?;
    let decision = event::classify(event, &ctx, &state.config, state.extractor.as_ref()).await?;

    match decision {
        RoutingDecision::Ignore => Ok(json!({})),
        RoutingDecision::SendToBot(route) => {
            info!(
                conversation = ctx.conversation_id,
                agent_mention = route.agent_mention,
                "routing message to bot"
            );
            if state.config.typing.enabled {
                state
                    .platform
                    .toggle_typing(ctx.account_id, ctx.conversation_id, TypingStatus::On)
                    .await;
            }
            let reply = state
                .bot
                .send(&route.contact, &route.message, ctx.conversation_id)
                .await;
            let message = outbound::compose(&reply, route.private);
            let created = state
                .platform
                .create_message(ctx.account_id, ctx.conversation_id, &message)
                .await;
            if state.config.typing.enabled {
                state
                    .platform
                    .toggle_typing(ctx.account_id, ctx.conversation_id, TypingStatus::Off)
                    .await;
            }
            created
        }
        RoutingDecision::SendSurvey => {
            info!(conversation = ctx.conversation_id, "sending satisfaction survey");
            let message = outbound::compose_survey(&state.config.csat.message);
            state
                .platform
                .create_message(ctx.account_id, ctx.conversation_id, &message)
                .await
        }
    }
}
