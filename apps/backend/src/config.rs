//! Environment configuration.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use wordmatch_core::GameSettings;

use crate::services::llm::LlmConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub llm: LlmConfig,
    pub game: GameSettings,
}

impl AppConfig {
    /// Read configuration from the environment. Call `dotenvy::dotenv()` first
    /// to pick up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = GameSettings::default();
        let game = GameSettings {
            time_limit_secs: env_parse("ROUND_TIME_LIMIT_SECS")?.unwrap_or(defaults.time_limit_secs),
            pairs_per_round: env_parse("PAIRS_PER_ROUND")?.unwrap_or(defaults.pairs_per_round),
            remedial_sample_size: env_parse("REMEDIAL_SAMPLE_SIZE")?
                .unwrap_or(defaults.remedial_sample_size),
            graduation_threshold: env_parse("GRADUATION_THRESHOLD")?
                .unwrap_or(defaults.graduation_threshold),
        };
        game.validate()?;

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT")?.unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_db_path()),
            llm: LlmConfig::from_env()?,
            game,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_db_path() -> PathBuf {
    // Use app data directory for production, fallback to current dir
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wordmatch")
        .join("mastery.db")
}

pub(crate) fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {key}: {value}")),
        _ => Ok(None),
    }
}
