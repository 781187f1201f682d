//! Director lifecycle states.

use std::fmt;

/// Where the Director is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DirectorState {
    /// Ready to run; no turn in progress.
    #[default]
    Idle,
    /// Waiting for agents' proposals.
    CollectingDecisions,
    /// Adjudicating proposals.
    Validating,
    /// Breaking ties over exclusive resources.
    Resolving,
    /// Applying winning actions to a working copy of the world.
    Applying,
    /// Appending the turn record.
    Logging,
    /// The last run finished every requested turn.
    Completed,
    /// A turn-fatal error halted the last run.
    Failed,
}

impl DirectorState {
    /// Returns `true` while a turn is being processed.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(
            self,
            Self::CollectingDecisions
                | Self::Validating
                | Self::Resolving
                | Self::Applying
                | Self::Logging
        )
    }

    /// Returns the state name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CollectingDecisions => "collecting_decisions",
            Self::Validating => "validating",
            Self::Resolving => "resolving",
            Self::Applying => "applying",
            Self::Logging => "logging",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DirectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time view of the Director.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectorStatus {
    /// Number of committed turns.
    pub turn_count: u64,
    /// Current lifecycle state.
    pub state: DirectorState,
    /// Number of registered agents.
    pub agent_count: usize,
}
