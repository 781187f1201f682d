//! The decision engine: candidate ranking plus optional reasoning service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use skald_core::action::{Action, Proposal};
use skald_core::bus::BusHandle;
use skald_core::env::{self, Lookup, ProcessEnv};
use skald_core::error::DomainError;
use skald_core::event::{EventPayload, Topic};
use skald_core::reason::ReasonCode;
use skald_core::service::{ReasoningRequest, ReasoningService, ServiceError};
use tracing::{debug, warn};

use crate::application::context;
use crate::domain::candidate::{Candidate, Situation, rank};
use crate::domain::strategy::{DecisionStrategy, strategy_for_role};

pub use crate::domain::agent::{DecisionRequest, Persona};

/// Tuning for the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long to wait for the reasoning service before falling back.
    pub service_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_timeout: Duration::from_millis(1500),
        }
    }
}

impl EngineConfig {
    /// Reads `SKALD_SERVICE_TIMEOUT_MS` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the value is not a number.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(&ProcessEnv)
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a value does not parse.
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, DomainError> {
        let defaults = Self::default();
        Ok(Self {
            service_timeout: env::millis(
                lookup,
                "SKALD_SERVICE_TIMEOUT_MS",
                defaults.service_timeout,
            )?,
        })
    }
}

/// Decides by ranking candidates with the role strategy and, when a
/// reasoning service is configured, letting it choose among them.
#[derive(Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
    reasoning: Option<Arc<dyn ReasoningService>>,
    strategy: Option<Arc<dyn DecisionStrategy>>,
    bus: BusHandle,
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("config", &self.config)
            .field("reasoning", &self.reasoning.is_some())
            .field("strategy", &self.strategy)
            .field("bus", &self.bus)
            .finish()
    }
}

impl DecisionEngine {
    /// An engine without a reasoning service; every decision uses the
    /// deterministic fallback.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            reasoning: None,
            strategy: None,
            bus: BusHandle::detached(),
        }
    }

    /// Uses `service` to choose among candidates.
    #[must_use]
    pub fn with_reasoning(mut self, service: Arc<dyn ReasoningService>) -> Self {
        self.reasoning = Some(service);
        self
    }

    /// Uses `strategy` for every character instead of picking one by role.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn DecisionStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Announces decisions on the bus behind `bus`.
    #[must_use]
    pub fn with_bus(mut self, bus: BusHandle) -> Self {
        self.bus = bus;
        self
    }

    async fn choose(
        &self,
        request: &DecisionRequest,
        situation: &Situation<'_>,
        candidates: &[Candidate],
    ) -> Proposal {
        let actor = &request.profile.id;
        let priority = request.profile.initiative;
        let fallback = |reason: ReasonCode| {
            let action = candidates.first().map_or_else(
                || Action::no_op(actor.clone()),
                |top| top.to_action(actor, priority),
            );
            debug!(
                agent_id = %actor,
                turn = %request.turn,
                %reason,
                choice = %action.label(),
                "falling back to top candidate"
            );
            Proposal::fallback(action, reason)
        };

        let Some(service) = &self.reasoning else {
            return fallback(ReasonCode::NoService);
        };

        let reasoning_request = ReasoningRequest {
            agent_id: actor.clone(),
            turn: request.turn,
            context: context::describe(situation),
            character_profile: serde_json::to_value(&*request.profile).unwrap_or_default(),
            allowed_actions: candidates.iter().map(Candidate::to_option).collect(),
        };

        let response = match tokio::time::timeout(
            self.config.service_timeout,
            service.choose(&reasoning_request),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                warn!(agent_id = %actor, turn = %request.turn, %error, "reasoning service failed");
                return fallback(error.reason_code());
            }
            Err(_) => {
                warn!(agent_id = %actor, turn = %request.turn, "reasoning service timed out");
                return fallback(ServiceError::Timeout.reason_code());
            }
        };

        let chosen = response.chosen_action.trim();
        match candidates
            .iter()
            .find(|c| c.label().eq_ignore_ascii_case(chosen))
        {
            Some(candidate) => {
                let mut action = candidate.to_action(actor, priority);
                let rationale = response.rationale_text.trim();
                if !rationale.is_empty() {
                    action.rationale = Some(rationale.to_owned());
                }
                Proposal::reasoned(action)
            }
            None => {
                warn!(
                    agent_id = %actor,
                    turn = %request.turn,
                    chosen,
                    "reasoning service chose an unknown action"
                );
                fallback(ReasonCode::UnknownChoice)
            }
        }
    }
}

#[async_trait]
impl Persona for DecisionEngine {
    async fn decide(&self, request: &DecisionRequest) -> Proposal {
        let actor = &request.profile.id;
        let proposal = match request.snapshot.entity(actor) {
            None => {
                warn!(agent_id = %actor, turn = %request.turn, "agent has no entity in the snapshot");
                Proposal::failed(actor.clone(), ReasonCode::DecisionFailed)
            }
            Some(me) => {
                let situation = Situation {
                    profile: &request.profile,
                    world: &request.snapshot,
                    me,
                    history: &request.history,
                };
                let strategy = self
                    .strategy
                    .clone()
                    .unwrap_or_else(|| strategy_for_role(&request.profile.role));
                let candidates = rank(&*strategy, &situation);
                self.choose(request, &situation, &candidates).await
            }
        };

        self.bus.publish(
            Topic::AGENT_DECIDED,
            EventPayload::AgentDecided {
                turn: request.turn,
                agent_id: actor.clone(),
                kind: proposal.action.kind,
                origin: proposal.origin.clone(),
            },
        );
        proposal
    }
}
