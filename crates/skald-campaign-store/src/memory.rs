//! In-memory campaign log.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use skald_core::error::DomainError;
use skald_core::ids::{AgentId, TurnNumber};
use skald_core::repository::{CampaignLogRepository, ensure_next};
use skald_core::turn::{TurnRange, TurnRecord};

use crate::select;

/// A campaign log held in memory. Lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryCampaignLog {
    records: RwLock<Vec<TurnRecord>>,
}

impl InMemoryCampaignLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed turns.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CampaignLogRepository for InMemoryCampaignLog {
    async fn append(&self, record: &TurnRecord) -> Result<(), DomainError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        ensure_next(records.last().map(|r| r.turn), record)?;
        records.push(record.clone());
        Ok(())
    }

    async fn load_range(&self, range: TurnRange) -> Result<Vec<TurnRecord>, DomainError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(select(&records, range, None))
    }

    async fn load_by_actor(
        &self,
        actor: &AgentId,
        range: TurnRange,
    ) -> Result<Vec<TurnRecord>, DomainError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(select(&records, range, Some(actor)))
    }

    async fn last_turn(&self) -> Result<Option<TurnNumber>, DomainError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.last().map(|r| r.turn))
    }
}
