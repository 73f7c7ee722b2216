use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub bot: BotConfig,
    pub platform: PlatformConfig,
    pub limits: LimitsConfig,
    pub csat: CsatConfig,
    pub typing: TypingConfig,
    pub mention: MentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub url: String,
    pub channel: String,
    pub jwt_secret: String,
    pub retry_count: u32,
    pub retry_base_delay_ms: u64,
    pub request_timeout_seconds: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            channel: String::new(),
            jwt_secret: String::new(),
            retry_count: 3,
            retry_base_delay_ms: 1000,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub url: String,
    pub bot_token: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            bot_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_message_characters: usize,
    pub max_button_title_length: usize,
    pub max_buttons: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_characters: 420,
            // WhatsApp interactive-message constraints
            max_button_title_length: 24,
            max_buttons: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsatConfig {
    pub enabled: bool,
    pub message: String,
}

impl Default for CsatConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            message: "Please rate the conversation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TypingConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MentionConfig {
    pub enabled: bool,
    pub bot_name: String,
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn resolve_config_path() -> PathBuf {
    env::var("DESK_BRIDGE_CONFIG")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(|| expand_tilde("~/.desk-bridge/desk-bridge.json"))
}

fn env_string(key: &str, target: &mut String) {
    if let Ok(value) = env::var(key) {
        if !value.trim().is_empty() {
            *target = value;
        }
    }
}

fn env_flag(key: &str, target: &mut bool) {
    if let Ok(value) = env::var(key) {
        let value = value.trim().to_lowercase();
        if !value.is_empty() {
            *target = matches!(value.as_str(), "1" | "true" | "yes" | "on");
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(value) = env::var(key) {
        if let Ok(parsed) = value.trim().parse::<T>() {
            *target = parsed;
        }
    }
}

pub fn load_config() -> Config {
    let config_path = resolve_config_path();

    let mut cfg = Config::default();

    if config_path.exists() {
        if let Ok(raw) = fs::read_to_string(&config_path) {
            if let Ok(file_cfg) = serde_json::from_str::<Config>(&raw) {
                cfg = file_cfg;
            }
        }
    }

    // Override from environment
    env_string("DESK_BRIDGE_HOST", &mut cfg.server.host);
    env_parse("DESK_BRIDGE_PORT", &mut cfg.server.port);

    env_string("BOT_URL", &mut cfg.bot.url);
    env_string("BOT_CHANNEL", &mut cfg.bot.channel);
    env_string("BOT_JWT_SECRET", &mut cfg.bot.jwt_secret);
    env_parse("BOT_RESPONSE_RETRY_COUNT", &mut cfg.bot.retry_count);
    env_parse("BOT_RETRY_BASE_DELAY_MS", &mut cfg.bot.retry_base_delay_ms);
    env_parse(
        "BOT_REQUEST_TIMEOUT_SECONDS",
        &mut cfg.bot.request_timeout_seconds,
    );

    env_string("PLATFORM_URL", &mut cfg.platform.url);
    env_string("PLATFORM_BOT_TOKEN", &mut cfg.platform.bot_token);

    env_parse(
        "MAX_MESSAGE_CHARACTERS",
        &mut cfg.limits.max_message_characters,
    );
    env_parse(
        "MAX_BUTTON_TITLE_LENGTH",
        &mut cfg.limits.max_button_title_length,
    );
    env_parse("MAX_NO_OF_BUTTONS", &mut cfg.limits.max_buttons);

    env_flag("ENABLE_CSAT", &mut cfg.csat.enabled);
    env_string("CSAT_MESSAGE", &mut cfg.csat.message);

    env_flag("TYPING_STATUS_ENABLED", &mut cfg.typing.enabled);

    env_flag("ALLOW_BOT_MENTION", &mut cfg.mention.enabled);
    env_string("BOT_NAME", &mut cfg.mention.bot_name);

    cfg
}
