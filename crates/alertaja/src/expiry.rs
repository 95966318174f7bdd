//! Keep/drop rules for every persisted collection.
//!
//! Each collection has exactly one policy function taking a record and the
//! current time. Readers and sweeps call these instead of comparing
//! timestamps themselves.

use chrono::{DateTime, Duration, Utc};

use crate::alerts::Alert;
use crate::config::ExpiryConfig;
use crate::courier::{CourierStatus, DirectoryEntry};

/// Outcome of applying a policy to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// The record is still live.
    Keep,
    /// The record must be removed.
    Drop,
}

impl Retention {
    /// Whether the record stays.
    #[must_use]
    pub fn is_keep(self) -> bool {
        self == Self::Keep
    }
}

/// Maximum age of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime(Duration);

impl Lifetime {
    /// A lifetime of `minutes`.
    #[must_use]
    pub fn minutes(minutes: u32) -> Self {
        Self(Duration::minutes(i64::from(minutes)))
    }

    /// The lifetime as a duration.
    #[must_use]
    pub fn as_duration(self) -> Duration {
        self.0
    }

    /// A record stamped at `stamp` is fresh while its age is below the lifetime.
    #[must_use]
    pub fn is_fresh(self, stamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(stamp) < self.0
    }
}

/// Alerts expire by age and by accumulated dispute votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    /// Lifetime counted from the last report or confirmation.
    pub lifetime: Lifetime,
    /// Votes at which an alert is removed.
    pub dispute_threshold: u32,
}

impl AlertPolicy {
    /// Decide whether `alert` stays on the board at `now`.
    #[must_use]
    pub fn retention(&self, alert: &Alert, now: DateTime<Utc>) -> Retention {
        if self.is_disputed(alert) || !self.lifetime.is_fresh(alert.created_at, now) {
            Retention::Drop
        } else {
            Retention::Keep
        }
    }

    /// Whether `alert` has reached the dispute threshold.
    #[must_use]
    pub fn is_disputed(&self, alert: &Alert) -> bool {
        alert.votes >= self.dispute_threshold
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::from(&ExpiryConfig::default())
    }
}

impl From<&ExpiryConfig> for AlertPolicy {
    fn from(config: &ExpiryConfig) -> Self {
        Self {
            lifetime: Lifetime::minutes(config.alert_lifetime_minutes),
            dispute_threshold: config.dispute_threshold,
        }
    }
}

/// Courier records expire by age only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourierPolicy {
    /// Lifetime counted from the last availability toggle.
    pub lifetime: Lifetime,
}

impl CourierPolicy {
    /// Decide whether a courier's own status record is still valid.
    #[must_use]
    pub fn status_retention(&self, status: &CourierStatus, now: DateTime<Utc>) -> Retention {
        self.by_age(status.last_updated, now)
    }

    /// Decide whether a directory entry is still listed.
    #[must_use]
    pub fn entry_retention(&self, entry: &DirectoryEntry, now: DateTime<Utc>) -> Retention {
        self.by_age(entry.last_updated, now)
    }

    fn by_age(&self, stamp: DateTime<Utc>, now: DateTime<Utc>) -> Retention {
        if self.lifetime.is_fresh(stamp, now) {
            Retention::Keep
        } else {
            Retention::Drop
        }
    }
}

impl Default for CourierPolicy {
    fn default() -> Self {
        Self::from(&ExpiryConfig::default())
    }
}

impl From<&ExpiryConfig> for CourierPolicy {
    fn from(config: &ExpiryConfig) -> Self {
        Self {
            lifetime: Lifetime::minutes(config.courier_lifetime_minutes),
        }
    }
}
