//! Concurrent decision collection.
//!
//! Every agent decides in its own task on a pool bounded by a semaphore.
//! An agent's deadline starts when it gets a worker and never extends past
//! the turn deadline. The join at the end is the only synchronization point.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use skald_core::action::Proposal;
use skald_core::ids::AgentId;
use skald_core::reason::ReasonCode;
use skald_persona::{DecisionRequest, Persona};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{instrument, warn};

/// Limits applied to one collection round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionLimits {
    /// Per-agent deadline.
    pub agent_deadline: Duration,
    /// Deadline for the whole round.
    pub turn_deadline: Duration,
    /// Worker pool size.
    pub max_workers: usize,
}

/// One agent's decision to run.
pub struct Assignment {
    /// The deciding agent.
    pub agent_id: AgentId,
    /// Who decides.
    pub persona: Arc<dyn Persona>,
    /// What they decide on.
    pub request: DecisionRequest,
}

/// Result of a collection round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    /// One proposal per assignment, in assignment order.
    Proposals(Vec<Proposal>),
    /// The cancel signal fired; outstanding decisions were aborted.
    Cancelled,
}

enum Finished {
    Decided(Proposal),
    MissedDeadline,
}

/// Runs every assignment and gathers the proposals.
///
/// Agents that miss their deadline get a `timed_out` no-op; agents whose
/// decision panics get a `failed` no-op with reason `decision_failed`.
#[instrument(skip_all, fields(agents = assignments.len()))]
pub async fn collect(
    assignments: Vec<Assignment>,
    limits: CollectionLimits,
    cancel: &mut watch::Receiver<bool>,
) -> Collected {
    if *cancel.borrow() {
        return Collected::Cancelled;
    }

    let turn_deadline = Instant::now() + limits.turn_deadline;
    let workers = Arc::new(Semaphore::new(limits.max_workers.max(1)));
    let agent_ids: Vec<AgentId> = assignments.iter().map(|a| a.agent_id.clone()).collect();
    let mut results: Vec<Option<Proposal>> = vec![None; assignments.len()];
    let mut task_slots = HashMap::with_capacity(assignments.len());
    let mut tasks = JoinSet::new();

    for (slot, assignment) in assignments.into_iter().enumerate() {
        let workers = Arc::clone(&workers);
        let agent_deadline = limits.agent_deadline;
        let handle = tasks.spawn(async move {
            let Ok(Ok(_permit)) = timeout_at(turn_deadline, workers.acquire_owned()).await else {
                return (slot, Finished::MissedDeadline);
            };
            let deadline = (Instant::now() + agent_deadline).min(turn_deadline);
            let Assignment {
                persona, request, ..
            } = assignment;
            match timeout_at(deadline, persona.decide(&request)).await {
                Ok(proposal) => (slot, Finished::Decided(proposal)),
                Err(_) => (slot, Finished::MissedDeadline),
            }
        });
        task_slots.insert(handle.id(), slot);
    }

    let mut cancel_open = true;
    loop {
        tokio::select! {
            biased;
            changed = cancel.changed(), if cancel_open => {
                if changed.is_err() {
                    cancel_open = false;
                } else if *cancel.borrow_and_update() {
                    tasks.abort_all();
                    return Collected::Cancelled;
                }
            }
            joined = tasks.join_next_with_id() => match joined {
                None => break,
                Some(Ok((_, (slot, Finished::Decided(proposal))))) => results[slot] = Some(proposal),
                Some(Ok((_, (slot, Finished::MissedDeadline)))) => {
                    warn!(agent_id = %agent_ids[slot], "agent missed its decision deadline");
                    results[slot] = Some(Proposal::timed_out(agent_ids[slot].clone()));
                }
                Some(Err(error)) => {
                    if let Some(&slot) = task_slots.get(&error.id()) {
                        warn!(agent_id = %agent_ids[slot], %error, "agent decision task failed");
                        results[slot] = Some(Proposal::failed(
                            agent_ids[slot].clone(),
                            ReasonCode::DecisionFailed,
                        ));
                    }
                }
            },
            () = sleep_until(turn_deadline) => {
                tasks.abort_all();
                break;
            }
        }
    }

    let proposals = results
        .into_iter()
        .zip(agent_ids)
        .map(|(result, agent_id)| {
            result.unwrap_or_else(|| {
                warn!(%agent_id, "agent still deciding at the turn deadline");
                Proposal::timed_out(agent_id)
            })
        })
        .collect();
    Collected::Proposals(proposals)
}
