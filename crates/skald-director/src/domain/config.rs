//! Director configuration.

use std::time::Duration;

use skald_core::env::{self, Lookup, ProcessEnv};
use skald_core::error::DomainError;

/// Deadlines and limits for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectorConfig {
    /// How long one agent may take to decide, measured from when its
    /// decision starts running.
    pub agent_deadline: Duration,
    /// How long decision collection may take in total.
    pub turn_deadline: Duration,
    /// Maximum number of decisions running at once.
    pub max_workers: usize,
    /// History size for agents whose profile does not set one.
    pub history_capacity: usize,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            agent_deadline: Duration::from_secs(2),
            turn_deadline: Duration::from_secs(10),
            max_workers: 4,
            history_capacity: 16,
        }
    }
}

impl DirectorConfig {
    /// Reads `SKALD_AGENT_DEADLINE_MS`, `SKALD_TURN_DEADLINE_MS`,
    /// `SKALD_MAX_WORKERS` and `SKALD_HISTORY_CAPACITY` from the process
    /// environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a value does not parse or the
    /// result is invalid.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(&ProcessEnv)
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`DirectorConfig::from_env`].
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, DomainError> {
        let defaults = Self::default();
        let config = Self {
            agent_deadline: env::millis(lookup, "SKALD_AGENT_DEADLINE_MS", defaults.agent_deadline)?,
            turn_deadline: env::millis(lookup, "SKALD_TURN_DEADLINE_MS", defaults.turn_deadline)?,
            max_workers: env::parsed(lookup, "SKALD_MAX_WORKERS", defaults.max_workers)?,
            history_capacity: env::parsed(
                lookup,
                "SKALD_HISTORY_CAPACITY",
                defaults.history_capacity,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first bad setting.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.agent_deadline.is_zero() {
            return Err(DomainError::Validation("agent deadline must be positive".into()));
        }
        if self.turn_deadline.is_zero() {
            return Err(DomainError::Validation("turn deadline must be positive".into()));
        }
        if self.max_workers == 0 {
            return Err(DomainError::Validation("max workers must be at least 1".into()));
        }
        if self.history_capacity == 0 {
            return Err(DomainError::Validation("history capacity must be at least 1".into()));
        }
        Ok(())
    }
}
