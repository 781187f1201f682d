//! Rulings: the per-proposal result of adjudication.

use std::collections::{BTreeMap, BTreeSet};

use skald_core::action::{Action, ActionKind, Proposal};
use skald_core::ids::AgentId;
use skald_core::verdict::Verdict;

use super::contention::Contention;

/// The action kinds each agent may propose. Agents missing from the map may
/// only do nothing.
pub type Capabilities = BTreeMap<AgentId, BTreeSet<ActionKind>>;

/// The verdict on one proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruling {
    /// The proposal as submitted.
    pub proposal: Proposal,
    /// The action that stands: the proposed one, or its rewrite for
    /// adjusted verdicts.
    pub action: Action,
    /// The verdict.
    pub verdict: Verdict,
}

impl Ruling {
    /// The acting agent.
    #[must_use]
    pub fn actor(&self) -> &AgentId {
        self.proposal.actor()
    }
}

/// The result of adjudicating a whole proposal set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Adjudication {
    /// One ruling per proposal, in input order.
    pub rulings: Vec<Ruling>,
    /// Exclusive resources claimed by more than one surviving action,
    /// ordered by resource key.
    pub contentions: Vec<Contention>,
}

impl Adjudication {
    /// The ruling for `actor`.
    #[must_use]
    pub fn ruling_for(&self, actor: &AgentId) -> Option<&Ruling> {
        self.rulings.iter().find(|r| r.actor() == actor)
    }
}
