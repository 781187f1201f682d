//! Run errors.

use skald_core::error::DomainError;
use skald_core::ids::TurnNumber;
use thiserror::Error;

/// Why `Director::start` did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    /// The run was refused before any turn began.
    #[error("cannot start simulation: {0}")]
    NotStarted(#[source] DomainError),

    /// A turn-fatal error halted the run. Turns committed before it remain
    /// in the campaign log.
    #[error("simulation failed after completing {completed} of {requested} turns: {source}")]
    Failed {
        /// Turns committed by this run before the failure.
        completed: u64,
        /// Turns asked for.
        requested: u64,
        /// The last turn safely in the log.
        last_committed: Option<TurnNumber>,
        /// The underlying error.
        #[source]
        source: DomainError,
    },
}

impl RunError {
    /// The underlying domain error.
    #[must_use]
    pub fn domain_error(&self) -> &DomainError {
        match self {
            Self::NotStarted(source) | Self::Failed { source, .. } => source,
        }
    }
}
