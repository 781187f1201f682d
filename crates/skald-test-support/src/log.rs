//! Test campaign log — a `CampaignLogRepository` that starts failing on demand.

use std::sync::Mutex;

use async_trait::async_trait;
use skald_core::error::DomainError;
use skald_core::ids::{AgentId, TurnNumber};
use skald_core::repository::{CampaignLogRepository, ensure_next};
use skald_core::turn::{TurnRange, TurnRecord};

/// A campaign log that accepts `successful_appends` records and then fails
/// every further append with an infrastructure error. Reads always succeed.
#[derive(Debug)]
pub struct FlakyCampaignLog {
    successful_appends: usize,
    records: Mutex<Vec<TurnRecord>>,
}

impl FlakyCampaignLog {
    /// A log that fails after `successful_appends` appends.
    #[must_use]
    pub fn failing_after(successful_appends: usize) -> Self {
        Self {
            successful_appends,
            records: Mutex::new(Vec::new()),
        }
    }

    /// A log whose every append fails.
    #[must_use]
    pub fn always_failing() -> Self {
        Self::failing_after(0)
    }

    /// Returns the records that were accepted.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn records(&self) -> Vec<TurnRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl CampaignLogRepository for FlakyCampaignLog {
    async fn append(&self, record: &TurnRecord) -> Result<(), DomainError> {
        let mut records = self.records.lock().unwrap();
        if records.len() >= self.successful_appends {
            return Err(DomainError::Infrastructure("disk full".into()));
        }
        ensure_next(records.last().map(|r| r.turn), record)?;
        records.push(record.clone());
        Ok(())
    }

    async fn load_range(&self, range: TurnRange) -> Result<Vec<TurnRecord>, DomainError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| range.contains(r.turn))
            .cloned()
            .collect())
    }

    async fn load_by_actor(
        &self,
        actor: &AgentId,
        range: TurnRange,
    ) -> Result<Vec<TurnRecord>, DomainError> {
        Ok(self
            .load_range(range)
            .await?
            .into_iter()
            .filter(|r| r.involves(actor))
            .collect())
    }

    async fn last_turn(&self) -> Result<Option<TurnNumber>, DomainError> {
        Ok(self.records.lock().unwrap().last().map(|r| r.turn))
    }
}
