//! Skald Campaign Store — implementations of the campaign log interface.
//!
//! The Director only ever talks to `CampaignLogRepository`; which of these
//! backs it is a deployment choice.

pub mod jsonl;
pub mod memory;
pub mod pg;
pub mod schema;

pub use jsonl::JsonlCampaignLog;
pub use memory::InMemoryCampaignLog;
pub use pg::PgCampaignLog;

use skald_core::ids::AgentId;
use skald_core::turn::{TurnRange, TurnRecord};

/// Clones the records within `range`, optionally keeping only those `actor`
/// took part in.
pub(crate) fn select(
    records: &[TurnRecord],
    range: TurnRange,
    actor: Option<&AgentId>,
) -> Vec<TurnRecord> {
    records
        .iter()
        .filter(|r| range.contains(r.turn))
        .filter(|r| actor.is_none_or(|a| r.involves(a)))
        .cloned()
        .collect()
}
