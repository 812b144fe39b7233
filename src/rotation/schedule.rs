//! Rotation schedule record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Externally persisted schedule, camelCase on the wire.
///
/// `next_rotation` advances only when a rotation actually succeeds; a
/// failed attempt leaves the schedule where it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationSchedule {
    pub secret_name: String,
    pub interval_days: i64,
    pub last_rotation: DateTime<Utc>,
    pub next_rotation: DateTime<Utc>,
    pub enabled: bool,
}

impl RotationSchedule {
    /// Schedule anchored at the current time.
    pub fn new(secret_name: impl Into<String>, interval_days: i64) -> Self {
        Self::starting_at(secret_name, interval_days, Utc::now())
    }

    /// Schedule anchored at an explicit time.
    pub fn starting_at(
        secret_name: impl Into<String>,
        interval_days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            secret_name: secret_name.into(),
            interval_days,
            last_rotation: now,
            next_rotation: now + Duration::days(interval_days),
            enabled: true,
        }
    }

    /// Record a successful rotation at `now` and move the next due date
    /// one interval forward.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.last_rotation = now;
        self.next_rotation = now + Duration::days(self.interval_days);
    }

    /// Whether a rotation is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && now >= self.next_rotation
    }
}
