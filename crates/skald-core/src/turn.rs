//! Turn records — the immutable, logged outcome of one turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{Action, ProposalOrigin};
use crate::ids::{AgentId, TurnNumber};
use crate::verdict::Verdict;
use crate::world::WorldDelta;

/// One adjudicated proposal as it was logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    /// Canonical name of the acting character at logging time.
    pub actor_name: String,
    /// The action as judged; for adjusted verdicts, the rewritten action.
    pub action: Action,
    /// How the proposal was produced.
    pub origin: ProposalOrigin,
    /// The adjudication outcome.
    pub verdict: Verdict,
    /// Display name of the target at logging time, if any.
    pub target_name: Option<String>,
}

impl ProposalRecord {
    /// The acting agent.
    #[must_use]
    pub fn actor(&self) -> &AgentId {
        &self.action.actor
    }

    /// Returns `true` if the action was applied to the world.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.verdict.is_committed()
    }
}

/// The logged outcome of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// The turn number.
    pub turn: TurnNumber,
    /// When decision collection began.
    pub started_at: DateTime<Utc>,
    /// When the record was sealed.
    pub committed_at: DateTime<Utc>,
    /// Every proposal with its verdict, in registration order.
    pub entries: Vec<ProposalRecord>,
    /// Changes applied to the world, in application order.
    pub deltas: Vec<WorldDelta>,
    /// Digest of the world after the deltas were applied.
    pub state_digest: String,
}

impl TurnRecord {
    /// Returns the entry for `actor`, if the actor took part in this turn.
    #[must_use]
    pub fn entry_for(&self, actor: &AgentId) -> Option<&ProposalRecord> {
        self.entries.iter().find(|entry| entry.actor() == actor)
    }

    /// Returns `true` if `actor` has an entry in this turn.
    #[must_use]
    pub fn involves(&self, actor: &AgentId) -> bool {
        self.entry_for(actor).is_some()
    }

    /// Iterates over the entries whose actions were applied.
    pub fn committed(&self) -> impl Iterator<Item = &ProposalRecord> {
        self.entries.iter().filter(|entry| entry.is_committed())
    }
}

/// An inclusive range of turns; an open end means "through the latest".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnRange {
    /// First turn included.
    pub first: TurnNumber,
    /// Last turn included, or `None` for no upper bound.
    pub last: Option<TurnNumber>,
}

impl TurnRange {
    /// Every turn.
    #[must_use]
    pub fn all() -> Self {
        Self {
            first: TurnNumber::FIRST,
            last: None,
        }
    }

    /// Turns `first..=last`.
    #[must_use]
    pub fn between(first: TurnNumber, last: TurnNumber) -> Self {
        Self {
            first,
            last: Some(last),
        }
    }

    /// Turns from `first` onwards.
    #[must_use]
    pub fn from(first: TurnNumber) -> Self {
        Self { first, last: None }
    }

    /// Returns `true` if `turn` lies within the range.
    #[must_use]
    pub fn contains(&self, turn: TurnNumber) -> bool {
        turn >= self.first && self.last.is_none_or(|last| turn <= last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_contains() {
        let range = TurnRange::between(TurnNumber::new(2), TurnNumber::new(4));

        assert!(!range.contains(TurnNumber::new(1)));
        assert!(range.contains(TurnNumber::new(2)));
        assert!(range.contains(TurnNumber::new(4)));
        assert!(!range.contains(TurnNumber::new(5)));
        assert!(TurnRange::from(TurnNumber::new(3)).contains(TurnNumber::new(300)));
        assert!(TurnRange::all().contains(TurnNumber::FIRST));
    }
}
