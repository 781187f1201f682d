//! Domain error types.

use thiserror::Error;

use crate::ids::{AgentId, EntityId, TurnNumber};

/// Top-level domain error type.
///
/// Variants fall into three groups: initialization errors (the agent or the
/// simulation cannot be set up), turn-fatal errors (the Director halts in
/// `Failed`) and plain validation errors on control-surface calls. Decision,
/// per-action validation and transcription problems are not errors at all;
/// they are recorded as reason codes on proposals, verdicts and segments.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A character profile document could not be parsed or failed validation.
    #[error("malformed character profile `{profile}`: {reason}")]
    MalformedProfile {
        /// The profile identifier or document name.
        profile: String,
        /// What was wrong with it.
        reason: String,
    },

    /// An agent with the same id is already registered.
    #[error("agent already registered: {0}")]
    DuplicateAgent(AgentId),

    /// No agent with the given id is registered.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The world has no entity with the given id.
    #[error("entity not present in world state: {0}")]
    UnknownEntity(EntityId),

    /// A control-surface call was invalid in the current state.
    #[error("validation error: {0}")]
    Validation(String),

    /// The adjudication engine could not classify the proposal set.
    #[error("adjudication failed: {0}")]
    Adjudication(String),

    /// The world state violated one of its structural invariants.
    #[error("world state integrity violation: {0}")]
    Integrity(String),

    /// A turn record was appended out of sequence.
    #[error("turn out of order: expected turn {expected}, got {actual}")]
    TurnOutOfOrder {
        /// The turn number the log expected next.
        expected: TurnNumber,
        /// The turn number that was offered.
        actual: TurnNumber,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for errors that prevent an agent (or the simulation)
    /// from being set up.
    #[must_use]
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            Self::MalformedProfile { .. } | Self::DuplicateAgent(_) | Self::UnknownEntity(_)
        )
    }

    /// Returns `true` for errors that halt the simulation mid-turn.
    #[must_use]
    pub fn is_turn_fatal(&self) -> bool {
        matches!(
            self,
            Self::Adjudication(_)
                | Self::Integrity(_)
                | Self::TurnOutOfOrder { .. }
                | Self::Infrastructure(_)
        )
    }
}
