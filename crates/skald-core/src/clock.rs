//! Wall-clock abstraction.
//!
//! Turn records and bus envelopes are timestamped through this trait so
//! tests and replays can pin time. Deadlines are not measured with it; they
//! use the async runtime's monotonic clock.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Abstraction over wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// A clock shared between the Director, the bus and the Chronicler.
pub type SharedClock = Arc<dyn Clock>;

/// Production clock backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Returns the system clock as a [`SharedClock`].
    #[must_use]
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
