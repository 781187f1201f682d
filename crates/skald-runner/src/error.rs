//! Skald runner — error types.

use skald_core::error::DomainError;
use skald_director::RunError;
use thiserror::Error;

/// Startup and runtime errors for the runner.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The scenario document could not be read or parsed.
    #[error("scenario error: {0}")]
    Scenario(String),

    /// Setting up the campaign failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The simulation refused to start or halted.
    #[error(transparent)]
    Run(#[from] RunError),
}

impl AppError {
    /// Exit code for the process.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Scenario(_) => 2,
            Self::Domain(_) | Self::Run(RunError::NotStarted(_)) => 3,
            Self::Run(RunError::Failed { .. }) => 4,
        }
    }
}
