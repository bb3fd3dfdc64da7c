use dotenvy::dotenv;
use std::env;
use thiserror::Error;

pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_LEADERBOARD_API_BASE: &str =
    "http://loadbalancer-e2a9b2a-1115437761.us-east-1.elb.amazonaws.com";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_OCR_API_URL: &str = "https://api.ocr.space/parse/image";
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 300;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("invalid QUEUE_MODE value (expected channel|forward): {0}")]
    InvalidQueueMode(String),
    #[error("invalid URL in {var}: {value}")]
    InvalidUrl { var: &'static str, value: String },
    #[error("invalid number in {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },
}

/// How the fast-ack route hands a command over to the deferred processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueMode {
    /// In-process queue drained by the worker task.
    Channel,
    /// Best-effort POST to this deployment's own deferred route.
    Forward,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord_public_key: String,
    pub handler_function_key: Option<String>,
    pub interaction_function_key: Option<String>,
    pub base_url: Option<url::Url>,
    pub spreadsheet_id: String,
    pub sheets_api_key: String,
    pub ocr_api_key: String,
    pub port: u16,
    pub queue_mode: QueueMode,
    pub keepalive_interval_secs: u64,
    pub discord_api_base: url::Url,
    pub leaderboard_api_base: url::Url,
    pub sheets_api_base: url::Url,
    pub ocr_api_url: url::Url,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if cfg!(not(test)) {
            let _ = dotenv();
        }

        let discord_public_key = env::var("DISCORD_PUBLIC_KEY")
            .map_err(|_| ConfigError::MissingEnv("DISCORD_PUBLIC_KEY"))?;

        let queue_mode = match optional_var("QUEUE_MODE") {
            None => QueueMode::Channel,
            Some(raw) => match raw.to_lowercase().as_str() {
                "channel" | "queue" => QueueMode::Channel,
                "forward" | "http" => QueueMode::Forward,
                other => return Err(ConfigError::InvalidQueueMode(other.to_string())),
            },
        };

        let base_url = match optional_var("BASE_URL") {
            Some(s) => Some(parse_url("BASE_URL", &s)?),
            None => None,
        };

        let interaction_function_key = optional_var("INTERACTION_FUNCTION_KEY");

        // Forward mode exposes the deferred route, which must never run keyless.
        if queue_mode == QueueMode::Forward {
            if base_url.is_none() {
                return Err(ConfigError::MissingEnv("BASE_URL"));
            }
            if interaction_function_key.is_none() {
                return Err(ConfigError::MissingEnv("INTERACTION_FUNCTION_KEY"));
            }
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080u16);

        let keepalive_interval_secs = match optional_var("KEEPALIVE_INTERVAL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "KEEPALIVE_INTERVAL_SECS",
                    value: raw.clone(),
                })?,
            None => DEFAULT_KEEPALIVE_INTERVAL_SECS,
        };

        Ok(AppConfig {
            discord_public_key,
            handler_function_key: optional_var("HANDLER_FUNCTION_KEY"),
            interaction_function_key,
            base_url,
            spreadsheet_id: optional_var("SPREADSHEET_ID").unwrap_or_default(),
            sheets_api_key: optional_var("SHEETS_API_KEY").unwrap_or_default(),
            ocr_api_key: optional_var("OCR_API_KEY").unwrap_or_default(),
            port,
            queue_mode,
            keepalive_interval_secs,
            discord_api_base: url_or_default("DISCORD_API_BASE", DEFAULT_DISCORD_API_BASE)?,
            leaderboard_api_base: url_or_default(
                "LEADERBOARD_API_BASE",
                DEFAULT_LEADERBOARD_API_BASE,
            )?,
            sheets_api_base: url_or_default("SHEETS_API_BASE", DEFAULT_SHEETS_API_BASE)?,
            ocr_api_url: url_or_default("OCR_API_URL", DEFAULT_OCR_API_URL)?,
        })
    }
}

/// Settings for the `register-commands` tool only.
#[derive(Clone, Debug)]
pub struct RegistrationConfig {
    pub bot_token: String,
    pub application_id: String,
    pub discord_api_base: url::Url,
}

impl RegistrationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if cfg!(not(test)) {
            let _ = dotenv();
        }

        let bot_token = env::var("DISCORD_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnv("DISCORD_BOT_TOKEN"))?;
        let application_id = env::var("DISCORD_BOT_APPLICATION_ID")
            .map_err(|_| ConfigError::MissingEnv("DISCORD_BOT_APPLICATION_ID"))?;

        Ok(RegistrationConfig {
            bot_token,
            application_id,
            discord_api_base: url_or_default("DISCORD_API_BASE", DEFAULT_DISCORD_API_BASE)?,
        })
    }
}

// Empty or whitespace-only values count as unset.
fn optional_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<url::Url, ConfigError> {
    url::Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
        var,
        value: value.to_string(),
    })
}

fn url_or_default(var: &'static str, default: &str) -> Result<url::Url, ConfigError> {
    let raw = optional_var(var).unwrap_or_else(|| default.to_string());
    parse_url(var, &raw)
}
