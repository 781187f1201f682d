//! Assembles a Director, its agents, a campaign log and a Chronicler from
//! configuration.

use std::sync::Arc;

use skald_campaign_store::{InMemoryCampaignLog, JsonlCampaignLog, PgCampaignLog};
use skald_chronicler::{Chronicler, NarrativeSegment};
use skald_core::clock::SharedClock;
use skald_core::repository::CampaignLogRepository;
use skald_core::service::{NarrativeStyle, ProseGenerator, ReasoningService};
use skald_core::turn::TurnRange;
use skald_core::world::WorldState;
use skald_director::{Director, RunReport};
use skald_llm::{ChatCompletionClient, LlmConfig};
use skald_persona::{DecisionEngine, Persona, ProfileFormat};
use tracing::info;
use uuid::Uuid;

use crate::config::{LogBackend, RunnerConfig};
use crate::error::AppError;
use crate::scenario::Scenario;

/// The external services a campaign may use. Either may be absent.
#[derive(Clone, Default)]
pub struct Services {
    pub reasoning: Option<Arc<dyn ReasoningService>>,
    pub prose: Option<Arc<dyn ProseGenerator>>,
}

impl Services {
    /// Uses one chat-completion client for both services when `llm` is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Domain` if the HTTP client cannot be built.
    pub fn from_llm(llm: Option<&LlmConfig>) -> Result<Self, AppError> {
        let Some(config) = llm else {
            return Ok(Self::default());
        };
        let client = Arc::new(ChatCompletionClient::new(config.clone())?);
        info!(model = %config.model, "using chat-completion service");
        Ok(Self {
            reasoning: Some(client.clone()),
            prose: Some(client),
        })
    }
}

/// Opens the campaign log selected by `backend`.
///
/// # Errors
///
/// Returns `AppError::Domain` if the file or database cannot be opened.
pub async fn open_log(backend: &LogBackend) -> Result<Arc<dyn CampaignLogRepository>, AppError> {
    let log: Arc<dyn CampaignLogRepository> = match backend {
        LogBackend::Memory => Arc::new(InMemoryCampaignLog::new()),
        LogBackend::Jsonl(path) => Arc::new(JsonlCampaignLog::open(path).await?),
        LogBackend::Postgres {
            database_url,
            campaign_id,
        } => {
            let campaign_id = campaign_id.unwrap_or_else(|| {
                let id = Uuid::now_v7();
                info!(%id, "starting a new campaign; set SKALD_CAMPAIGN_ID to resume it");
                id
            });
            let log = PgCampaignLog::connect(database_url, campaign_id).await?;
            log.ensure_schema().await?;
            Arc::new(log)
        }
    };
    Ok(log)
}

/// A ready-to-run campaign.
pub struct Campaign {
    director: Director,
    log: Arc<dyn CampaignLogRepository>,
    chronicler: Chronicler,
}

impl std::fmt::Debug for Campaign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Campaign")
            .field("director", &self.director)
            .field("chronicler", &self.chronicler)
            .finish_non_exhaustive()
    }
}

impl Campaign {
    /// Builds the world, registers every character and replays whatever
    /// the log already holds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Domain` if the world is inconsistent, a profile is
    /// malformed or the existing log does not replay.
    pub async fn assemble(
        config: &RunnerConfig,
        scenario: &Scenario,
        log: Arc<dyn CampaignLogRepository>,
        services: Services,
        clock: SharedClock,
    ) -> Result<Self, AppError> {
        let world = WorldState::from_document(scenario.world.clone())?;
        let mut director = Director::new(config.director, world, Arc::clone(&log), clock)?;

        let mut engine = DecisionEngine::new(config.engine).with_bus(director.bus().handle());
        if let Some(reasoning) = services.reasoning {
            engine = engine.with_reasoning(reasoning);
        }
        let persona: Arc<dyn Persona> = Arc::new(engine);
        for document in scenario.profile_documents()? {
            director.register_agent_from_document(
                &document,
                ProfileFormat::Yaml,
                Arc::clone(&persona),
            )?;
        }

        if let Some(turn) = director.resume_from_log().await? {
            info!(%turn, "resumed campaign from log");
        }

        let mut chronicler = Chronicler::new(config.chronicler);
        if let Some(prose) = services.prose {
            chronicler = chronicler.with_generator(prose);
        }

        Ok(Self {
            director,
            log,
            chronicler,
        })
    }

    #[must_use]
    pub fn director(&self) -> &Director {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut Director {
        &mut self.director
    }

    /// Runs `turns` more turns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Run` if the Director refuses to start or halts.
    pub async fn run(&mut self, turns: u64) -> Result<RunReport, AppError> {
        let report = self.director.start(turns).await?;
        info!(
            outcome = ?report.outcome,
            completed = report.completed,
            requested = report.requested,
            "run finished"
        );
        Ok(report)
    }

    /// Narrates the logged turns within `range`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Domain` if the log cannot be read.
    pub async fn transcribe(
        &self,
        range: TurnRange,
        style: NarrativeStyle,
    ) -> Result<Vec<NarrativeSegment>, AppError> {
        let records = self.log.load_range(range).await?;
        Ok(self.chronicler.transcribe(&records, style).await)
    }
}
