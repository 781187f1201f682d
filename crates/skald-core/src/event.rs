//! Event bus topics, payloads and envelopes.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::action::{ActionKind, ProposalOrigin};
use crate::ids::{AgentId, TurnNumber};

/// A bus topic. Well-known topics are associated constants; any other string
/// is a valid custom topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Topic(Cow<'static, str>);

impl Topic {
    /// An agent joined the simulation.
    pub const AGENT_REGISTERED: Self = Self(Cow::Borrowed("agent.registered"));
    /// An agent left the simulation.
    pub const AGENT_DEREGISTERED: Self = Self(Cow::Borrowed("agent.deregistered"));
    /// Decision collection for a turn began.
    pub const TURN_STARTED: Self = Self(Cow::Borrowed("turn.started"));
    /// An agent produced its proposal.
    pub const AGENT_DECIDED: Self = Self(Cow::Borrowed("agent.decided"));
    /// A turn was committed to the campaign log.
    pub const TURN_COMPLETED: Self = Self(Cow::Borrowed("turn.completed"));
    /// A turn was cancelled before it was applied.
    pub const TURN_CANCELLED: Self = Self(Cow::Borrowed("turn.cancelled"));
    /// A turn-fatal error halted the simulation.
    pub const TURN_FAILED: Self = Self(Cow::Borrowed("turn.failed"));
    /// Every requested turn was completed.
    pub const SIMULATION_COMPLETED: Self = Self(Cow::Borrowed("simulation.completed"));

    /// Returns the topic name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Topic {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Payloads carried on the bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// See [`Topic::AGENT_REGISTERED`].
    AgentRegistered {
        /// The new agent.
        agent_id: AgentId,
        /// Its canonical name.
        name: String,
    },
    /// See [`Topic::AGENT_DEREGISTERED`].
    AgentDeregistered {
        /// The departed agent.
        agent_id: AgentId,
    },
    /// See [`Topic::TURN_STARTED`].
    TurnStarted {
        /// The turn being collected.
        turn: TurnNumber,
        /// Number of agents asked to decide.
        agent_count: usize,
        /// Per-agent deadline in milliseconds.
        agent_deadline_ms: u64,
        /// Whole-turn deadline in milliseconds.
        turn_deadline_ms: u64,
        /// Digest of the snapshot the agents decide against.
        snapshot_digest: String,
    },
    /// See [`Topic::AGENT_DECIDED`].
    AgentDecided {
        /// The turn.
        turn: TurnNumber,
        /// The deciding agent.
        agent_id: AgentId,
        /// What it proposed.
        kind: ActionKind,
        /// How the proposal was produced.
        origin: ProposalOrigin,
    },
    /// See [`Topic::TURN_COMPLETED`].
    TurnCompleted {
        /// The committed turn.
        turn: TurnNumber,
        /// Number of applied actions.
        committed: usize,
        /// Number of rejected or contention-losing actions.
        refused: usize,
        /// Digest of the resulting world.
        state_digest: String,
    },
    /// See [`Topic::TURN_CANCELLED`].
    TurnCancelled {
        /// The abandoned turn.
        turn: TurnNumber,
    },
    /// See [`Topic::TURN_FAILED`].
    TurnFailed {
        /// The turn that failed.
        turn: TurnNumber,
        /// The last turn safely in the log.
        last_committed: Option<TurnNumber>,
        /// The error message.
        reason: String,
    },
    /// See [`Topic::SIMULATION_COMPLETED`].
    SimulationCompleted {
        /// Turns completed by this run.
        turns_completed: u64,
        /// The last committed turn.
        last_turn: TurnNumber,
    },
    /// A payload for a custom topic.
    Custom {
        /// Arbitrary JSON.
        body: serde_json::Value,
    },
}

/// The envelope every subscriber receives.
#[derive(Debug, Clone, Serialize)]
pub struct BusEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Topic the event was published on.
    pub topic: Topic,
    /// Publication order on this bus, starting at 1.
    pub sequence_number: u64,
    /// When the event was published.
    pub occurred_at: DateTime<Utc>,
    /// The payload.
    pub payload: EventPayload,
}
