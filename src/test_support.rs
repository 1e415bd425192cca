//! Shared helpers for unit tests.

use chrono::{DateTime, Local, Utc};
use mockable::Clock;

/// Clock pinned to one instant, for deterministic expiry tests.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedClock(pub(crate) DateTime<Utc>);

impl FixedClock {
    /// Clock pinned at an arbitrary but stable instant.
    pub(crate) fn base() -> Self {
        Self(
            DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
        )
    }

    /// Returns a clock advanced by `minutes`.
    pub(crate) fn advanced_by_minutes(self, minutes: i64) -> Self {
        Self(self.0 + chrono::Duration::minutes(minutes))
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
