//! Campaign log persistence abstraction.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::ids::{AgentId, TurnNumber};
use crate::turn::{TurnRange, TurnRecord};

/// Append-only storage for turn records, ordered by turn number.
///
/// The storage technology is an implementation choice; every implementation
/// must refuse any append that is not exactly the next turn.
#[async_trait]
pub trait CampaignLogRepository: Send + Sync {
    /// Appends a sealed turn record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TurnOutOfOrder` unless `record.turn` is exactly
    /// one past the last stored turn (or the first turn for an empty log),
    /// and `DomainError::Infrastructure` if storage fails.
    async fn append(&self, record: &TurnRecord) -> Result<(), DomainError>;

    /// Loads the records within `range`, ordered by turn number.
    async fn load_range(&self, range: TurnRange) -> Result<Vec<TurnRecord>, DomainError>;

    /// Loads the records within `range` in which `actor` took part.
    async fn load_by_actor(
        &self,
        actor: &AgentId,
        range: TurnRange,
    ) -> Result<Vec<TurnRecord>, DomainError>;

    /// Returns the last committed turn, or `None` for an empty log.
    async fn last_turn(&self) -> Result<Option<TurnNumber>, DomainError>;
}

/// Returns the turn an append must carry after `last`.
#[must_use]
pub fn expected_next(last: Option<TurnNumber>) -> TurnNumber {
    last.map_or(TurnNumber::FIRST, TurnNumber::next)
}

/// Checks that `record` is the next turn after `last`.
///
/// # Errors
///
/// Returns `DomainError::TurnOutOfOrder` if it is not.
pub fn ensure_next(last: Option<TurnNumber>, record: &TurnRecord) -> Result<(), DomainError> {
    let expected = expected_next(last);
    if record.turn == expected {
        Ok(())
    } else {
        Err(DomainError::TurnOutOfOrder {
            expected,
            actual: record.turn,
        })
    }
}
