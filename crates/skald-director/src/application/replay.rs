//! Rebuilding a world from its campaign log.

use skald_core::error::DomainError;
use skald_core::repository::ensure_next;
use skald_core::turn::TurnRecord;
use skald_core::world::WorldState;
use tracing::debug;

/// Re-applies the deltas of `records` to a copy of `initial`.
///
/// Records must start at turn 1 and be consecutive. After each turn the
/// world must pass its integrity check and hash to the recorded digest.
///
/// # Errors
///
/// Returns `DomainError::TurnOutOfOrder` for a gap or repeat, and
/// `DomainError::Integrity` if a delta does not apply or a digest differs.
pub fn replay(initial: &WorldState, records: &[TurnRecord]) -> Result<WorldState, DomainError> {
    let mut world = initial.clone();
    let mut last = None;

    for record in records {
        ensure_next(last, record)?;
        for delta in &record.deltas {
            world.apply_delta(delta).map_err(|e| {
                DomainError::Integrity(format!("turn {} does not replay: {e}", record.turn))
            })?;
        }
        world.check_integrity()?;

        let digest = world.digest();
        if digest != record.state_digest {
            return Err(DomainError::Integrity(format!(
                "turn {} replays to digest {digest}, log says {}",
                record.turn, record.state_digest
            )));
        }
        last = Some(record.turn);
    }

    debug!(turns = records.len(), "replayed campaign log");
    Ok(world)
}
