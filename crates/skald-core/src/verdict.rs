//! Adjudication verdicts.

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::ids::AgentId;
use crate::reason::ReasonCode;
use crate::world::ResourceKey;

/// The outcome of adjudicating one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The action stands as proposed.
    Legal,
    /// The action was rewritten into a safe fallback.
    Adjusted {
        /// The kind that was originally proposed.
        original: ActionKind,
        /// Why it was rewritten.
        reason: ReasonCode,
    },
    /// The action was refused.
    Rejected {
        /// Why.
        reason: ReasonCode,
    },
    /// The action was legal but lost the tie-break for an exclusive resource.
    FailedContention {
        /// The contested resource.
        resource: ResourceKey,
        /// The agent that won it.
        winner: AgentId,
    },
}

impl Verdict {
    /// Returns `true` if the action will be applied to the world.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Legal | Self::Adjusted { .. })
    }

    /// Returns `true` if the action was refused by a rule.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns a short tag (`legal`, `adjusted`, `rejected`,
    /// `failed_contention`).
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Legal => "legal",
            Self::Adjusted { .. } => "adjusted",
            Self::Rejected { .. } => "rejected",
            Self::FailedContention { .. } => "failed_contention",
        }
    }

    /// Returns the reason code attached to a non-legal verdict.
    #[must_use]
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Self::Legal => None,
            Self::Adjusted { reason, .. } | Self::Rejected { reason } => Some(*reason),
            Self::FailedContention { .. } => Some(ReasonCode::Contention),
        }
    }
}
