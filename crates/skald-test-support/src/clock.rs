//! Test clock — deterministic `Clock` implementation for tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use skald_core::clock::{Clock, SharedClock};

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The timestamp every test fixture uses.
pub(crate) fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The fixed test timestamp as a shared clock.
#[must_use]
pub fn fixed_clock() -> SharedClock {
    Arc::new(FixedClock(fixed_instant()))
}
