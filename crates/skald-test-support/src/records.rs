//! Turn record fixtures.

use skald_core::action::{Action, ProposalOrigin};
use skald_core::ids::{AgentId, TurnNumber};
use skald_core::turn::{ProposalRecord, TurnRecord};
use skald_core::verdict::Verdict;

use crate::clock::fixed_instant;

/// A turn record in which each of `actors` waited (`no_op`, legal).
#[must_use]
pub fn idle_turn(turn: u64, actors: &[&str]) -> TurnRecord {
    TurnRecord {
        turn: TurnNumber::new(turn),
        started_at: fixed_instant(),
        committed_at: fixed_instant(),
        entries: actors
            .iter()
            .map(|actor| ProposalRecord {
                actor_name: (*actor).to_owned(),
                action: Action::no_op(AgentId::new(*actor)),
                origin: ProposalOrigin::Reasoned,
                verdict: Verdict::Legal,
                target_name: None,
            })
            .collect(),
        deltas: Vec::new(),
        state_digest: format!("digest-{turn}"),
    }
}
