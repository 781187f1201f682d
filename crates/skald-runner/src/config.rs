//! Runner configuration read from the environment.

use std::path::PathBuf;

use skald_chronicler::ChroniclerConfig;
use skald_core::env::{self, Lookup, ProcessEnv};
use skald_core::error::DomainError;
use skald_core::service::NarrativeStyle;
use skald_director::DirectorConfig;
use skald_llm::LlmConfig;
use skald_persona::EngineConfig;
use uuid::Uuid;

use crate::error::AppError;

/// Where the campaign log lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogBackend {
    /// Kept in memory for the life of the process.
    Memory,
    /// A JSON-lines file.
    Jsonl(PathBuf),
    /// A `PostgreSQL` table. Without a campaign id a new campaign is started.
    Postgres {
        database_url: String,
        campaign_id: Option<Uuid>,
    },
}

/// Everything the runner needs to assemble a campaign.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub scenario: PathBuf,
    pub turns: u64,
    pub style: NarrativeStyle,
    pub log: LogBackend,
    pub director: DirectorConfig,
    pub engine: EngineConfig,
    pub chronicler: ChroniclerConfig,
    /// `None` runs every decision and narration deterministically.
    pub llm: Option<LlmConfig>,
}

fn config_error(error: DomainError) -> AppError {
    match error {
        DomainError::Validation(message) => AppError::Config(message),
        other => AppError::Config(other.to_string()),
    }
}

impl RunnerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `SKALD_SCENARIO` is missing or any
    /// value is invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(&ProcessEnv)
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `SKALD_SCENARIO` is missing or any
    /// value is invalid.
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, AppError> {
        let scenario = lookup
            .get("SKALD_SCENARIO")
            .map(PathBuf::from)
            .ok_or_else(|| AppError::Config("SKALD_SCENARIO must be set".into()))?;
        let turns = env::parsed(lookup, "SKALD_TURNS", 3_u64).map_err(config_error)?;
        if turns == 0 {
            return Err(AppError::Config("SKALD_TURNS must be positive".into()));
        }

        let log = if let Some(database_url) = lookup.get("DATABASE_URL") {
            let campaign_id = lookup
                .get("SKALD_CAMPAIGN_ID")
                .map(|raw| {
                    Uuid::parse_str(raw.trim())
                        .map_err(|e| AppError::Config(format!("SKALD_CAMPAIGN_ID={raw}: {e}")))
                })
                .transpose()?;
            LogBackend::Postgres {
                database_url,
                campaign_id,
            }
        } else if let Some(path) = lookup.get("SKALD_LOG_PATH") {
            LogBackend::Jsonl(PathBuf::from(path))
        } else {
            LogBackend::Memory
        };

        Ok(Self {
            scenario,
            turns,
            style: env::parsed(lookup, "SKALD_STYLE", NarrativeStyle::Terse)
                .map_err(config_error)?,
            log,
            director: DirectorConfig::from_lookup(lookup).map_err(config_error)?,
            engine: EngineConfig::from_lookup(lookup).map_err(config_error)?,
            chronicler: ChroniclerConfig::from_lookup(lookup).map_err(config_error)?,
            llm: LlmConfig::from_lookup(lookup).map_err(config_error)?,
        })
    }
}
