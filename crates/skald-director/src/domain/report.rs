//! Results of a run.

use skald_core::ids::TurnNumber;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every requested turn was committed.
    Completed,
    /// A cancel signal stopped the run before a turn reached Apply.
    Cancelled,
}

/// Summary of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Turns asked for.
    pub requested: u64,
    /// Turns committed by this run.
    pub completed: u64,
    /// The last committed turn overall, if any.
    pub last_turn: Option<TurnNumber>,
}
