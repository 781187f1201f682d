//! The turn orchestrator.

use std::sync::Arc;

use skald_adjudication::{Adjudicator, Ruling};
use skald_core::action::{ProposalOrigin, Target};
use skald_core::bus::EventBus;
use skald_core::clock::SharedClock;
use skald_core::error::DomainError;
use skald_core::event::{EventPayload, Topic};
use skald_core::ids::{AgentId, TurnNumber};
use skald_core::repository::{CampaignLogRepository, expected_next};
use skald_core::turn::{ProposalRecord, TurnRange, TurnRecord};
use skald_core::world::WorldState;
use skald_persona::{Agent, CharacterProfile, Experience, Persona, ProfileFormat};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use super::apply::apply_action;
use super::collection::{Assignment, Collected, CollectionLimits, collect};
use super::replay::replay;
use super::resolution::resolve;
use crate::domain::config::DirectorConfig;
use crate::domain::error::RunError;
use crate::domain::registry::AgentRegistry;
use crate::domain::report::{RunOutcome, RunReport};
use crate::domain::state::{DirectorState, DirectorStatus};

/// Requests cancellation of a run in progress.
///
/// A cancel stops the current turn if it has not begun applying; a turn
/// that is applying or logging finishes first. A cancel sent while no run
/// is active stops the next run before its first turn.
#[derive(Debug, Clone)]
pub struct CancelSignal(Arc<watch::Sender<bool>>);

impl CancelSignal {
    /// Asks the Director to stop.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    /// Whether a cancel is pending.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

enum TurnOutcome {
    Committed,
    Cancelled,
}

/// Drives the simulation one turn at a time.
///
/// The Director owns the authoritative world, the agent registry and the
/// turn counter. Agents only ever see immutable snapshots.
pub struct Director {
    config: DirectorConfig,
    initial: WorldState,
    world: Arc<WorldState>,
    registry: AgentRegistry,
    adjudicator: Adjudicator,
    log: Arc<dyn CampaignLogRepository>,
    bus: EventBus,
    clock: SharedClock,
    last_turn: Option<TurnNumber>,
    status: watch::Sender<DirectorStatus>,
    cancel: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for Director {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Director")
            .field("config", &self.config)
            .field("status", &*self.status.borrow())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Director {
    /// Creates an idle Director over `world`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an invalid configuration and
    /// `DomainError::Integrity` if the world is inconsistent.
    pub fn new(
        config: DirectorConfig,
        world: WorldState,
        log: Arc<dyn CampaignLogRepository>,
        clock: SharedClock,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        world.check_integrity()?;
        let (status, _) = watch::channel(DirectorStatus::default());
        let (cancel, _) = watch::channel(false);
        Ok(Self {
            config,
            initial: world.clone(),
            world: Arc::new(world),
            registry: AgentRegistry::new(),
            adjudicator: Adjudicator::new(),
            log,
            bus: EventBus::new(Arc::clone(&clock)),
            clock,
            last_turn: None,
            status,
            cancel: Arc::new(cancel),
        })
    }

    /// Replaces the adjudicator, e.g. to install extension rules.
    #[must_use]
    pub fn with_adjudicator(mut self, adjudicator: Adjudicator) -> Self {
        self.adjudicator = adjudicator;
        self
    }

    /// The event bus. Subscribe here before starting a run.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The current authoritative world.
    #[must_use]
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// The last committed turn.
    #[must_use]
    pub fn last_turn(&self) -> Option<TurnNumber> {
        self.last_turn
    }

    /// The registered agents, in registration order.
    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Current status.
    #[must_use]
    pub fn get_status(&self) -> DirectorStatus {
        *self.status.borrow()
    }

    /// A receiver that sees every state transition.
    #[must_use]
    pub fn status_watch(&self) -> watch::Receiver<DirectorStatus> {
        self.status.subscribe()
    }

    /// A handle for cancelling runs from another task.
    #[must_use]
    pub fn cancel_signal(&self) -> CancelSignal {
        CancelSignal(Arc::clone(&self.cancel))
    }

    /// Registers an agent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the Director has failed,
    /// `DomainError::UnknownEntity` if the world has no avatar for the agent
    /// and `DomainError::DuplicateAgent` if the id is taken.
    pub fn register_agent(&mut self, agent: Agent) -> Result<(), DomainError> {
        if self.get_status().state == DirectorState::Failed {
            return Err(DomainError::Validation(
                "cannot register agents after a failed run; resume from the log first".into(),
            ));
        }
        if self.world.entity(agent.id()).is_none() {
            return Err(DomainError::UnknownEntity(agent.id().clone()));
        }

        let agent_id = agent.id().clone();
        let name = agent.name().to_owned();
        self.registry.register(agent)?;
        info!(%agent_id, %name, "registered agent");
        self.bus.publish(
            Topic::AGENT_REGISTERED,
            EventPayload::AgentRegistered { agent_id, name },
        );
        self.refresh_status();
        Ok(())
    }

    /// Parses a character profile document and registers the agent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedProfile` if the document does not
    /// parse or validate, plus every error of [`Director::register_agent`].
    pub fn register_agent_from_document(
        &mut self,
        document: &str,
        format: ProfileFormat,
        persona: Arc<dyn Persona>,
    ) -> Result<AgentId, DomainError> {
        let profile = CharacterProfile::parse(document, format)?;
        let agent = Agent::new(profile, persona, self.config.history_capacity)?;
        let agent_id = agent.id().clone();
        self.register_agent(agent)?;
        Ok(agent_id)
    }

    /// Removes an agent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AgentNotFound` if no such agent is registered.
    pub fn deregister_agent(&mut self, agent_id: &AgentId) -> Result<Agent, DomainError> {
        let agent = self.registry.remove(agent_id)?;
        info!(%agent_id, "deregistered agent");
        self.bus.publish(
            Topic::AGENT_DEREGISTERED,
            EventPayload::AgentDeregistered {
                agent_id: agent_id.clone(),
            },
        );
        self.refresh_status();
        Ok(agent)
    }

    /// Rebuilds the world and agent histories from the campaign log.
    ///
    /// Returns the last committed turn.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the Director is idle or
    /// failed; `DomainError::Integrity` or `DomainError::TurnOutOfOrder` if
    /// the log does not replay; infrastructure errors from the log.
    pub async fn resume_from_log(&mut self) -> Result<Option<TurnNumber>, DomainError> {
        let state = self.get_status().state;
        if !matches!(state, DirectorState::Idle | DirectorState::Failed) {
            return Err(DomainError::Validation(format!(
                "cannot resume from the log while {state}"
            )));
        }

        let records = self.log.load_range(TurnRange::all()).await?;
        let world = replay(&self.initial, &records)?;

        for agent in self.registry.iter_mut() {
            agent.forget();
        }
        for record in &records {
            self.remember(record);
        }
        self.world = Arc::new(world);
        self.last_turn = records.last().map(|r| r.turn);
        info!(
            turns = records.len(),
            last_turn = ?self.last_turn,
            "resumed from campaign log"
        );
        self.set_state(DirectorState::Idle);
        Ok(self.last_turn)
    }

    /// Runs `requested` more turns.
    ///
    /// # Errors
    ///
    /// Returns `RunError::NotStarted` if `requested` is zero, no agent is
    /// registered or the Director has failed; `RunError::Failed` if a turn
    /// hit a fatal error.
    pub async fn start(&mut self, requested: u64) -> Result<RunReport, RunError> {
        if requested == 0 {
            return Err(RunError::NotStarted(DomainError::Validation(
                "requested turns must be positive".into(),
            )));
        }
        if self.registry.is_empty() {
            return Err(RunError::NotStarted(DomainError::Validation(
                "no agents registered".into(),
            )));
        }
        if self.get_status().state == DirectorState::Failed {
            return Err(RunError::NotStarted(DomainError::Validation(
                "the previous run failed; resume from the log first".into(),
            )));
        }

        info!(
            requested,
            agents = self.registry.len(),
            first_turn = %expected_next(self.last_turn),
            "starting simulation"
        );
        let mut cancel = self.cancel.subscribe();
        let mut completed = 0;

        while completed < requested {
            let turn = expected_next(self.last_turn);
            let outcome = if *cancel.borrow() {
                Ok(TurnOutcome::Cancelled)
            } else {
                self.run_turn(turn, &mut cancel).await
            };

            match outcome {
                Ok(TurnOutcome::Committed) => completed += 1,
                Ok(TurnOutcome::Cancelled) => {
                    self.cancel.send_replace(false);
                    info!(%turn, completed, "simulation cancelled");
                    self.bus
                        .publish(Topic::TURN_CANCELLED, EventPayload::TurnCancelled { turn });
                    self.set_state(DirectorState::Idle);
                    return Ok(RunReport {
                        outcome: RunOutcome::Cancelled,
                        requested,
                        completed,
                        last_turn: self.last_turn,
                    });
                }
                Err(source) => {
                    error!(%turn, completed, requested, error = %source, "turn failed");
                    self.set_state(DirectorState::Failed);
                    self.bus.publish(
                        Topic::TURN_FAILED,
                        EventPayload::TurnFailed {
                            turn,
                            last_committed: self.last_turn,
                            reason: source.to_string(),
                        },
                    );
                    return Err(RunError::Failed {
                        completed,
                        requested,
                        last_committed: self.last_turn,
                        source,
                    });
                }
            }
        }

        let last_turn = self.last_turn.unwrap_or_default();
        info!(completed, %last_turn, "simulation completed");
        self.set_state(DirectorState::Completed);
        self.bus.publish(
            Topic::SIMULATION_COMPLETED,
            EventPayload::SimulationCompleted {
                turns_completed: completed,
                last_turn,
            },
        );
        Ok(RunReport {
            outcome: RunOutcome::Completed,
            requested,
            completed,
            last_turn: self.last_turn,
        })
    }

    #[instrument(skip_all, fields(turn = %turn))]
    async fn run_turn(
        &mut self,
        turn: TurnNumber,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<TurnOutcome, DomainError> {
        let started_at = self.clock.now();
        let snapshot = Arc::clone(&self.world);

        self.set_state(DirectorState::CollectingDecisions);
        self.bus.publish(
            Topic::TURN_STARTED,
            EventPayload::TurnStarted {
                turn,
                agent_count: self.registry.len(),
                agent_deadline_ms: millis(self.config.agent_deadline),
                turn_deadline_ms: millis(self.config.turn_deadline),
                snapshot_digest: snapshot.digest(),
            },
        );
        let assignments = self
            .registry
            .iter()
            .map(|agent| Assignment {
                agent_id: agent.id().clone(),
                persona: agent.persona(),
                request: agent.decision_request(turn, Arc::clone(&snapshot)),
            })
            .collect();
        let limits = CollectionLimits {
            agent_deadline: self.config.agent_deadline,
            turn_deadline: self.config.turn_deadline,
            max_workers: self.config.max_workers,
        };
        let proposals = match collect(assignments, limits, cancel).await {
            Collected::Proposals(proposals) => proposals,
            Collected::Cancelled => return Ok(TurnOutcome::Cancelled),
        };
        for proposal in &proposals {
            if matches!(
                proposal.origin,
                ProposalOrigin::TimedOut | ProposalOrigin::Failed { .. }
            ) {
                self.bus.publish(
                    Topic::AGENT_DECIDED,
                    EventPayload::AgentDecided {
                        turn,
                        agent_id: proposal.actor().clone(),
                        kind: proposal.action.kind,
                        origin: proposal.origin.clone(),
                    },
                );
            }
        }

        self.set_state(DirectorState::Validating);
        let adjudication =
            self.adjudicator
                .adjudicate(&snapshot, &proposals, &self.registry.capabilities())?;

        self.set_state(DirectorState::Resolving);
        let rulings = resolve(adjudication, &self.registry)?;

        if *cancel.borrow() {
            return Ok(TurnOutcome::Cancelled);
        }

        self.set_state(DirectorState::Applying);
        let mut working = WorldState::clone(&snapshot);
        let mut deltas = Vec::new();
        for ruling in rulings.iter().filter(|r| r.verdict.is_committed()) {
            let might = self
                .registry
                .get(ruling.actor())
                .map_or(1, |agent| agent.profile().might());
            deltas.extend(apply_action(&mut working, &ruling.action, might)?);
        }
        working.check_integrity()?;

        self.set_state(DirectorState::Logging);
        let record = TurnRecord {
            turn,
            started_at,
            committed_at: self.clock.now(),
            entries: rulings.iter().map(|r| self.entry(&snapshot, r)).collect(),
            deltas,
            state_digest: working.digest(),
        };
        self.log.append(&record).await?;

        self.world = Arc::new(working);
        self.last_turn = Some(turn);
        self.remember(&record);

        let committed = record.committed().count();
        let refused = record.entries.len() - committed;
        for entry in record.entries.iter().filter(|e| !e.is_committed()) {
            warn!(
                agent_id = %entry.actor(),
                verdict = entry.verdict.tag(),
                reason = ?entry.verdict.reason(),
                "action refused"
            );
        }
        info!(committed, refused, digest = %record.state_digest, "turn committed");
        self.bus.publish(
            Topic::TURN_COMPLETED,
            EventPayload::TurnCompleted {
                turn,
                committed,
                refused,
                state_digest: record.state_digest,
            },
        );
        self.set_state(DirectorState::Idle);
        Ok(TurnOutcome::Committed)
    }

    fn entry(&self, world: &WorldState, ruling: &Ruling) -> ProposalRecord {
        let actor_name = self
            .registry
            .get(ruling.actor())
            .map(|agent| agent.name().to_owned())
            .or_else(|| world.entity(ruling.actor()).map(|e| e.name.clone()))
            .unwrap_or_else(|| ruling.actor().to_string());
        let target_name = ruling.action.target.as_ref().and_then(|target| match target {
            Target::Entity(id) => self
                .registry
                .get(id)
                .map(|agent| agent.name().to_owned())
                .or_else(|| world.entity(id).map(|e| e.name.clone())),
            Target::Location(id) => world.location(id).map(|l| l.name.clone()),
            Target::Resource(id) => world.resource(id).map(|r| r.name.clone()),
        });
        ProposalRecord {
            actor_name,
            action: ruling.action.clone(),
            origin: ruling.proposal.origin.clone(),
            verdict: ruling.verdict.clone(),
            target_name,
        }
    }

    fn remember(&mut self, record: &TurnRecord) {
        for entry in &record.entries {
            if let Some(agent) = self.registry.get_mut(entry.actor()) {
                agent.remember(Experience::from_record(record.turn, entry));
            }
        }
    }

    fn set_state(&self, state: DirectorState) {
        self.status.send_replace(DirectorStatus {
            turn_count: self.last_turn.map_or(0, TurnNumber::get),
            state,
            agent_count: self.registry.len(),
        });
    }

    fn refresh_status(&self) {
        self.set_state(self.get_status().state);
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
