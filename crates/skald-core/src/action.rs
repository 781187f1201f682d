//! Actions and proposals.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, EntityId, LocationId, ResourceId};
use crate::reason::ReasonCode;

/// The kinds of action an agent may propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Walk to an adjacent location.
    Move,
    /// Strike a co-located entity.
    Attack,
    /// Look around.
    Observe,
    /// Search the current location for hidden facts.
    Search,
    /// Take hold of a resource.
    Claim,
    /// Address a co-located entity.
    Speak,
    /// Recover health.
    Rest,
    /// Do nothing this turn.
    NoOp,
}

impl ActionKind {
    /// Every action kind, in canonical order.
    pub const ALL: [Self; 8] = [
        Self::Move,
        Self::Attack,
        Self::Observe,
        Self::Search,
        Self::Claim,
        Self::Speak,
        Self::Rest,
        Self::NoOp,
    ];

    /// Returns the snake-case name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Attack => "attack",
            Self::Observe => "observe",
            Self::Search => "search",
            Self::Claim => "claim",
            Self::Speak => "speak",
            Self::Rest => "rest",
            Self::NoOp => "no_op",
        }
    }

    /// Returns `true` if the kind requires a target.
    #[must_use]
    pub fn needs_target(self) -> bool {
        matches!(self, Self::Move | Self::Attack | Self::Claim | Self::Speak)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        if normalized == "move_to" {
            return Ok(Self::Move);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown action kind `{s}`"))
    }
}

/// What an action is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
    /// Another entity.
    Entity(EntityId),
    /// A location.
    Location(LocationId),
    /// A resource.
    Resource(ResourceId),
}

impl Target {
    /// Returns the raw id of the target.
    #[must_use]
    pub fn id_str(&self) -> &str {
        match self {
            Self::Entity(id) => id.as_str(),
            Self::Location(id) => id.as_str(),
            Self::Resource(id) => id.as_str(),
        }
    }
}

/// A concrete action proposed by an agent for the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The acting agent.
    pub actor: AgentId,
    /// What the agent wants to do.
    pub kind: ActionKind,
    /// What the action is aimed at.
    pub target: Option<Target>,
    /// Declared priority; higher wins contested resources.
    pub priority: i32,
    /// Free-text reasoning, if the reasoning service supplied any.
    pub rationale: Option<String>,
}

impl Action {
    /// Creates an untargeted action with no rationale.
    #[must_use]
    pub fn new(actor: AgentId, kind: ActionKind, priority: i32) -> Self {
        Self {
            actor,
            kind,
            target: None,
            priority,
            rationale: None,
        }
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Creates a no-op for `actor`.
    #[must_use]
    pub fn no_op(actor: AgentId) -> Self {
        Self::new(actor, ActionKind::NoOp, 0)
    }

    /// Returns the label used to offer this action to a reasoning service,
    /// e.g. `move:vault` or `rest`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.target {
            Some(target) => format!("{}:{}", self.kind, target.id_str()),
            None => self.kind.as_str().to_owned(),
        }
    }
}

/// How a proposal came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum ProposalOrigin {
    /// The reasoning service chose it.
    Reasoned,
    /// The decision engine fell back to its highest-weighted candidate.
    Fallback {
        /// Why the reasoning service was not used.
        reason: ReasonCode,
    },
    /// The agent missed its deadline; the action is a no-op.
    TimedOut,
    /// The decision failed outright; the action is a no-op.
    Failed {
        /// What went wrong.
        reason: ReasonCode,
    },
}

impl ProposalOrigin {
    /// Returns the reason code attached to a degraded origin.
    #[must_use]
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Self::Reasoned => None,
            Self::Fallback { reason } | Self::Failed { reason } => Some(*reason),
            Self::TimedOut => Some(ReasonCode::Timeout),
        }
    }
}

/// An action together with the way it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// The proposed action.
    pub action: Action,
    /// How it was produced.
    pub origin: ProposalOrigin,
}

impl Proposal {
    /// A proposal chosen by the reasoning service.
    #[must_use]
    pub fn reasoned(action: Action) -> Self {
        Self {
            action,
            origin: ProposalOrigin::Reasoned,
        }
    }

    /// A proposal produced by the deterministic fallback.
    #[must_use]
    pub fn fallback(action: Action, reason: ReasonCode) -> Self {
        Self {
            action,
            origin: ProposalOrigin::Fallback { reason },
        }
    }

    /// The no-op recorded for an agent that missed its deadline.
    #[must_use]
    pub fn timed_out(actor: AgentId) -> Self {
        Self {
            action: Action::no_op(actor),
            origin: ProposalOrigin::TimedOut,
        }
    }

    /// The no-op recorded for an agent whose decision failed.
    #[must_use]
    pub fn failed(actor: AgentId, reason: ReasonCode) -> Self {
        Self {
            action: Action::no_op(actor),
            origin: ProposalOrigin::Failed { reason },
        }
    }

    /// The acting agent.
    #[must_use]
    pub fn actor(&self) -> &AgentId {
        &self.action.actor
    }
}
