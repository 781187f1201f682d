//! `PostgreSQL` implementation of the campaign log.

use async_trait::async_trait;
use skald_core::error::DomainError;
use skald_core::ids::{AgentId, TurnNumber};
use skald_core::repository::{CampaignLogRepository, ensure_next};
use skald_core::turn::{TurnRange, TurnRecord};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use crate::schema::CREATE_CAMPAIGN_TURNS_TABLE;

/// PostgreSQL-backed campaign log. Several campaigns may share one table;
/// each instance reads and writes only its own `campaign_id`.
#[derive(Debug, Clone)]
pub struct PgCampaignLog {
    pool: PgPool,
    campaign_id: Uuid,
}

fn db_error(error: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database: {error}"))
}

fn to_db_turn(turn: TurnNumber) -> Result<i64, DomainError> {
    i64::try_from(turn.get())
        .map_err(|_| DomainError::Infrastructure(format!("turn {turn} exceeds BIGINT")))
}

fn from_db_turn(turn: i64) -> Result<TurnNumber, DomainError> {
    u64::try_from(turn)
        .map(TurnNumber::new)
        .map_err(|_| DomainError::Infrastructure(format!("negative turn number {turn} in log")))
}

impl PgCampaignLog {
    /// Creates a log for `campaign_id` over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool, campaign_id: Uuid) -> Self {
        Self { pool, campaign_id }
    }

    /// Connects to `database_url` and creates a log for `campaign_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the connection fails.
    pub async fn connect(database_url: &str, campaign_id: Uuid) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| db_error(&e))?;
        Ok(Self::new(pool, campaign_id))
    }

    /// The campaign this log belongs to.
    #[must_use]
    pub fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }

    /// Creates the campaign turns table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the statement fails.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::raw_sql(CREATE_CAMPAIGN_TURNS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;
        Ok(())
    }

    async fn fetch(
        &self,
        actor: Option<&AgentId>,
        range: TurnRange,
    ) -> Result<Vec<TurnRecord>, DomainError> {
        let last = range.last.map(to_db_turn).transpose()?;
        let rows: Vec<Json<TurnRecord>> = sqlx::query_scalar(
            r"SELECT record FROM campaign_turns
              WHERE campaign_id = $1
                AND turn_number >= $2
                AND ($3::BIGINT IS NULL OR turn_number <= $3)
                AND ($4::TEXT IS NULL OR $4 = ANY(actors))
              ORDER BY turn_number",
        )
        .bind(self.campaign_id)
        .bind(to_db_turn(range.first)?)
        .bind(last)
        .bind(actor.map(AgentId::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;

        Ok(rows.into_iter().map(|Json(record)| record).collect())
    }
}

#[async_trait]
impl CampaignLogRepository for PgCampaignLog {
    async fn append(&self, record: &TurnRecord) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error(&e))?;

        let last: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(turn_number) FROM campaign_turns WHERE campaign_id = $1",
        )
        .bind(self.campaign_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error(&e))?;
        ensure_next(last.map(from_db_turn).transpose()?, record)?;

        let actors: Vec<String> = record
            .entries
            .iter()
            .map(|entry| entry.actor().to_string())
            .collect();

        let inserted = sqlx::query(
            r"INSERT INTO campaign_turns
                (campaign_id, turn_number, actors, record, state_digest, committed_at)
              VALUES ($1, $2, $3, $4, $5, $6)
              ON CONFLICT (campaign_id, turn_number) DO NOTHING",
        )
        .bind(self.campaign_id)
        .bind(to_db_turn(record.turn)?)
        .bind(&actors)
        .bind(Json(record))
        .bind(&record.state_digest)
        .bind(record.committed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error(&e))?;

        // A concurrent writer committed the same turn first.
        if inserted.rows_affected() == 0 {
            return Err(DomainError::TurnOutOfOrder {
                expected: record.turn.next(),
                actual: record.turn,
            });
        }

        tx.commit().await.map_err(|e| db_error(&e))?;
        debug!(campaign_id = %self.campaign_id, turn = %record.turn, "appended turn record");
        Ok(())
    }

    async fn load_range(&self, range: TurnRange) -> Result<Vec<TurnRecord>, DomainError> {
        self.fetch(None, range).await
    }

    async fn load_by_actor(
        &self,
        actor: &AgentId,
        range: TurnRange,
    ) -> Result<Vec<TurnRecord>, DomainError> {
        self.fetch(Some(actor), range).await
    }

    async fn last_turn(&self) -> Result<Option<TurnNumber>, DomainError> {
        let last: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(turn_number) FROM campaign_turns WHERE campaign_id = $1",
        )
        .bind(self.campaign_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;
        last.map(from_db_turn).transpose()
    }
}
