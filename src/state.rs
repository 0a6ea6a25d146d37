use std::sync::Arc;

use sqlx::SqlitePool;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::db;
use crate::gemini::{Extractor, GeminiClient};
use crate::telegram::{Messenger, TelegramClient};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub messenger: Arc<dyn Messenger>,
    pub extractor: Arc<dyn Extractor>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;

        let clock = Arc::new(SystemClock::new(config.utc_offset)) as Arc<dyn Clock>;
        let messenger = Arc::new(TelegramClient::new(&config.telegram)) as Arc<dyn Messenger>;
        let extractor =
            Arc::new(GeminiClient::new(&config.gemini, clock.clone())) as Arc<dyn Extractor>;

        Ok(Self::from_parts(db, config, messenger, extractor, clock))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        messenger: Arc<dyn Messenger>,
        extractor: Arc<dyn Extractor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            config,
            messenger,
            extractor,
            clock,
        }
    }

    /// In-memory database wired to the given test doubles, with the clock
    /// fixed at [`FAKE_NOW`].
    #[cfg(test)]
    pub async fn fake(
        messenger: Arc<crate::testing::RecordingMessenger>,
        extractor: Arc<crate::testing::ScriptedExtractor>,
    ) -> Self {
        use crate::clock::FixedClock;
        use crate::config::{GeminiConfig, TelegramConfig};

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            telegram: TelegramConfig {
                bot_token: "test".into(),
                api_base: "http://telegram.invalid".into(),
            },
            gemini: GeminiConfig {
                api_key: "test".into(),
                api_base: "http://gemini.invalid".into(),
                model: "test-model".into(),
                insight_model: "test-model".into(),
            },
            trigger_secret: Some("s3cret".into()),
            admin_telegram_id: None,
            insight_interval_secs: 0,
            utc_offset: time::UtcOffset::UTC,
        });

        Self::from_parts(
            db::memory_pool().await,
            config,
            messenger,
            extractor,
            Arc::new(FixedClock::new(FAKE_NOW)),
        )
    }
}

#[cfg(test)]
pub const FAKE_NOW: time::OffsetDateTime = time::macros::datetime!(2025-07-15 12:00 UTC);
