//! Bounded decision history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use skald_core::action::{ActionKind, Target};
use skald_core::ids::TurnNumber;
use skald_core::turn::ProposalRecord;
use skald_core::verdict::Verdict;

/// What an agent remembers about one of its turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    /// The turn.
    pub turn: TurnNumber,
    /// The kind of action that was judged.
    pub kind: ActionKind,
    /// Its target, if any.
    pub target: Option<Target>,
    /// How the action was judged.
    pub verdict: Verdict,
}

impl Experience {
    /// Builds the experience an agent keeps from its logged entry.
    #[must_use]
    pub fn from_record(turn: TurnNumber, entry: &ProposalRecord) -> Self {
        Self {
            turn,
            kind: entry.action.kind,
            target: entry.action.target.clone(),
            verdict: entry.verdict.clone(),
        }
    }

    /// Whether the action was applied to the world.
    #[must_use]
    pub fn was_committed(&self) -> bool {
        self.verdict.is_committed()
    }
}

/// A sliding window over an agent's most recent experiences.
///
/// Never holds more than `capacity` entries; recording into a full history
/// evicts the oldest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionHistory {
    capacity: usize,
    entries: VecDeque<Experience>,
}

impl DecisionHistory {
    /// Creates an empty history. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Records an experience, evicting the oldest one if full.
    pub fn record(&mut self, experience: Experience) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(experience);
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.entries.iter()
    }

    /// The most recent experience.
    #[must_use]
    pub fn last(&self) -> Option<&Experience> {
        self.entries.back()
    }

    /// Copies the entries, oldest first, for handing to a decision task.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Experience> {
        self.entries.iter().cloned().collect()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
