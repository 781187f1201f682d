//! Campaign log stored as one JSON document per line.
//!
//! The file is the source of truth; records are also cached in memory so
//! range queries do not re-read it. A line is only cached after it has been
//! written and flushed; a failed write is truncated away so the file never
//! ends in a partial line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use skald_core::error::DomainError;
use skald_core::ids::{AgentId, TurnNumber};
use skald_core::repository::{CampaignLogRepository, ensure_next};
use skald_core::turn::{TurnRange, TurnRecord};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::select;

/// A file-backed campaign log in JSON-lines format.
#[derive(Debug)]
pub struct JsonlCampaignLog {
    path: PathBuf,
    records: RwLock<Vec<TurnRecord>>,
}

impl JsonlCampaignLog {
    /// Opens the log at `path`, creating it if it does not exist, and loads
    /// every record already in it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the file cannot be read or a
    /// line is not a turn record, and `DomainError::TurnOutOfOrder` if the
    /// stored turns are not consecutive from turn 1.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref().to_path_buf();
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(io_error(&path, &e)),
        };

        let mut records: Vec<TurnRecord> = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: TurnRecord = serde_json::from_str(line).map_err(|e| {
                DomainError::Infrastructure(format!(
                    "{}:{}: not a turn record: {e}",
                    path.display(),
                    index + 1
                ))
            })?;
            ensure_next(records.last().map(|r| r.turn), &record)?;
            records.push(record);
        }

        info!(
            path = %path.display(),
            turns = records.len(),
            "opened campaign log"
        );
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// The file backing this log.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(path: &Path, error: &std::io::Error) -> DomainError {
    DomainError::Infrastructure(format!("{}: {error}", path.display()))
}

async fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.sync_data().await
}

/// Cuts `file` back to `length` bytes if `written` failed, then returns
/// `written` unchanged.
async fn truncate_on_error(
    file: &File,
    length: u64,
    written: std::io::Result<()>,
) -> std::io::Result<()> {
    if written.is_err() {
        match file.set_len(length).await {
            Ok(()) => debug!(length, "truncated partial campaign log line"),
            Err(error) => warn!(%error, length, "could not truncate partial campaign log line"),
        }
    }
    written
}

#[async_trait]
impl CampaignLogRepository for JsonlCampaignLog {
    async fn append(&self, record: &TurnRecord) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        ensure_next(records.last().map(|r| r.turn), record)?;

        let mut line = serde_json::to_string(record)
            .map_err(|e| DomainError::Infrastructure(format!("serialize turn record: {e}")))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| io_error(&self.path, &e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| io_error(&self.path, &e))?
            .len();
        let written = write_line(&mut file, &line).await;
        truncate_on_error(&file, length, written)
            .await
            .map_err(|e| io_error(&self.path, &e))?;

        debug!(turn = %record.turn, path = %self.path.display(), "appended turn record");
        records.push(record.clone());
        Ok(())
    }

    async fn load_range(&self, range: TurnRange) -> Result<Vec<TurnRecord>, DomainError> {
        Ok(select(&self.records.read().await, range, None))
    }

    async fn load_by_actor(
        &self,
        actor: &AgentId,
        range: TurnRange,
    ) -> Result<Vec<TurnRecord>, DomainError> {
        Ok(select(&self.records.read().await, range, Some(actor)))
    }

    async fn last_turn(&self) -> Result<Option<TurnNumber>, DomainError> {
        Ok(self.records.read().await.last().map(|r| r.turn))
    }
}
