use anyhow::Context;
use serde::Deserialize;
use time::UtcOffset;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://financify.db";
/// Brasília time.
pub const DEFAULT_UTC_OFFSET_HOURS: i8 = -3;

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub insight_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub telegram: TelegramConfig,
    pub gemini: GeminiConfig,
    /// Shared secret for the insight trigger endpoint. `None` rejects every call.
    pub trigger_secret: Option<String>,
    /// Operator chat that receives a report after each insight run.
    pub admin_telegram_id: Option<i64>,
    /// Seconds between scheduled insight runs, 0 disables the scheduler.
    pub insight_interval_secs: u64,
    /// Offset the users live in, used to decide what "today" is.
    pub utc_offset: UtcOffset,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());

        let telegram = TelegramConfig {
            bot_token: std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?,
            api_base: std::env::var("TELEGRAM_API_BASE")
                .unwrap_or_else(|_| "https://api.telegram.org".into()),
        };

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());
        let gemini = GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?,
            api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into()),
            insight_model: std::env::var("GEMINI_INSIGHT_MODEL").unwrap_or_else(|_| model.clone()),
            model,
        };

        let trigger_secret = std::env::var("TRIGGER_SECRET")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let admin_telegram_id = std::env::var("ADMIN_TELEGRAM_ID")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|id| *id != 0);
        let insight_interval_secs = std::env::var("INSIGHT_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(7 * 24 * 60 * 60);

        let offset_hours = std::env::var("APP_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|v| v.parse::<i8>().ok())
            .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);
        let utc_offset = UtcOffset::from_hms(offset_hours, 0, 0)
            .with_context(|| format!("APP_UTC_OFFSET_HOURS out of range: {}", offset_hours))?;

        Ok(Self {
            database_url,
            telegram,
            gemini,
            trigger_secret,
            admin_telegram_id,
            insight_interval_secs,
            utc_offset,
        })
    }
}
