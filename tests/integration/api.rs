use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use desk_bridge::config::Config;
use desk_bridge::create_app;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(bot: &MockServer, platform: &MockServer) -> Config {
    let mut config = Config::default();
    config.bot.url = bot.uri();
    config.bot.channel = "support".to_string();
    config.bot.jwt_secret = "secret".to_string();
    config.bot.retry_base_delay_ms = 1;
    config.platform.url = platform.uri();
    config.platform.bot_token = "platform-token".to_string();
    config
}

async fn post_event(app: Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(json!(null));
    (status, value)
}

fn incoming_event() -> serde_json::Value {
    json!({
        "event": "message_created",
        "message_type": "incoming",
        "content": "hi",
        "conversation": {"id": 5, "status": "pending"},
        "account": {"id": 1},
        "sender": {"id": 9}
    })
}

#[tokio::test]
async fn test_health_check() {
    let (_state, app) = create_app(Config::default());
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health-check/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_ignored_event_returns_empty_object() {
    let (_state, app) = create_app(Config::default());
    let event = json!({
        "event": "message_created",
        "message_type": "outgoing",
        "content": "agent reply",
        "conversation": {"id": 5, "status": "pending"},
        "account": {"id": 1},
        "sender": {"id": 9}
    });
    let (status, body) = post_event(app, event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_event_without_identifiers_is_client_error() {
    let (_state, app) = create_app(Config::default());
    let (status, body) = post_event(app, json!({"event": "message_created"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("account id"));
}

#[tokio::test]
async fn test_incoming_message_flows_to_platform() {
    let bot = MockServer::start().await;
    let platform = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhooks/support/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"text": "hello"}])))
        .expect(1)
        .mount(&bot)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/messages"))
        .and(body_partial_json(json!({"content": "hello", "private": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&platform)
        .await;

    let (_state, app) = create_app(test_config(&bot, &platform));
    let (status, body) = post_event(app, incoming_event()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 42}));
}

#[tokio::test]
async fn test_typing_indicator_toggled_around_bot_call() {
    let bot = MockServer::start().await;
    let platform = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhooks/support/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "hello"})))
        .mount(&bot)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/toggle_typing_status"))
        .and(body_partial_json(json!({"status": "on"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&platform)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/toggle_typing_status"))
        .and(body_partial_json(json!({"status": "off"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&platform)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&platform)
        .await;

    let mut config = test_config(&bot, &platform);
    config.typing.enabled = true;
    let (_state, app) = create_app(config);
    let (status, _body) = post_event(app, incoming_event()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_typing_failure_does_not_break_flow() {
    let bot = MockServer::start().await;
    let platform = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhooks/support/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "hello"})))
        .mount(&bot)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/toggle_typing_status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&platform)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&platform)
        .await;

    let mut config = test_config(&bot, &platform);
    config.typing.enabled = true;
    let (_state, app) = create_app(config);
    let (status, body) = post_event(app, incoming_event()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 7}));
}

#[tokio::test]
async fn test_resolved_conversation_sends_survey() {
    let bot = MockServer::start().await;
    let platform = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/messages"))
        .and(body_partial_json(json!({
            "content": "Please rate the conversation",
            "content_type": "input_csat"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&platform)
        .await;

    let mut config = test_config(&bot, &platform);
    config.csat.enabled = true;
    let (_state, app) = create_app(config);
    let event = json!({
        "event": "conversation_status_changed",
        "status": "resolved",
        "messages": [{"account_id": 1, "conversation_id": 5}]
    });
    let (status, body) = post_event(app, event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 9}));
    // the bot is never consulted for surveys
    assert!(bot.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_image_reply_uploaded_as_multipart() {
    let bot = MockServer::start().await;
    let platform = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhooks/support/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"text": "here is the map", "image": "data:image/jpg;base64,anBlZw=="}
        ])))
        .mount(&bot)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 11})))
        .expect(1)
        .mount(&platform)
        .await;

    let (_state, app) = create_app(test_config(&bot, &platform));
    let (status, body) = post_event(app, incoming_event()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 11}));

    let requests = platform.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path().ends_with("/messages"))
        .unwrap();
    let content_type = upload.headers.get("content-type").unwrap();
    assert!(content_type
        .to_str()
        .unwrap()
        .starts_with("multipart/form-data"));
}

#[tokio::test]
async fn test_platform_rejection_propagates_as_gateway_error() {
    let bot = MockServer::start().await;
    let platform = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhooks/support/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "hello"})))
        .mount(&bot)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/messages"))
        .respond_with(ResponseTemplate::new(422).set_body_string("unprocessable"))
        .expect(1)
        .mount(&platform)
        .await;

    let (_state, app) = create_app(test_config(&bot, &platform));
    let (status, body) = post_event(app, incoming_event()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("422"));
}

#[tokio::test]
async fn test_bot_outage_degrades_to_empty_message() {
    let bot = MockServer::start().await;
    let platform = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhooks/support/webhook"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&bot)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/1/conversations/5/messages"))
        .and(body_partial_json(json!({"content": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 0})))
        .expect(1)
        .mount(&platform)
        .await;

    let (_state, app) = create_app(test_config(&bot, &platform));
    let (status, _body) = post_event(app, incoming_event()).await;
    assert_eq!(status, StatusCode::OK);
}
