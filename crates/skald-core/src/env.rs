//! Environment-variable configuration helpers.
//!
//! Every config type reads through a lookup function so tests can supply
//! values without touching the process environment.

use std::str::FromStr;
use std::time::Duration;

use crate::error::DomainError;

/// Reads configuration values by key.
pub trait Lookup {
    /// Returns the raw value for `key`, if set.
    fn get(&self, key: &str) -> Option<String>;
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Lookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Parses `key` with `FromStr`, or returns `default` when unset.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the value is set but does not parse.
pub fn parsed<T>(lookup: &impl Lookup, key: &str, default: T) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| DomainError::Validation(format!("{key}={raw}: {e}"))),
    }
}

/// Reads a duration given in whole milliseconds.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the value is not a number of
/// milliseconds.
pub fn millis(lookup: &impl Lookup, key: &str, default: Duration) -> Result<Duration, DomainError> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parsed(lookup, key, default_ms).map(Duration::from_millis)
}
