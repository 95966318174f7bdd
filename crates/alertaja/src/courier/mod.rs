//! Courier availability.
//!
//! A courier announces availability for a neighborhood; the announcement is
//! kept both as the courier's own status record and as an entry in the shared
//! directory that customers browse.

mod directory;
mod publisher;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use directory::CourierDirectory;
pub use publisher::AvailabilityPublisher;

/// A courier's own availability record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierStatus {
    /// Whether the courier takes rides.
    pub is_available: bool,
    /// Neighborhood served.
    pub region: String,
    /// Time of the last toggle.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

/// A courier as listed in the shared directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// Display name.
    pub username: String,
    /// Contact phone, as the courier typed it.
    pub phone: String,
    /// Neighborhood served.
    pub region: String,
    /// Time the courier went online.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

/// What a courier sees about themself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OwnStatus {
    /// Whether the courier is listed.
    pub is_available: bool,
    /// Region served while available.
    pub region: Option<String>,
}

impl OwnStatus {
    /// Offline with no region.
    #[must_use]
    pub fn offline() -> Self {
        Self::default()
    }
}

impl From<CourierStatus> for OwnStatus {
    fn from(status: CourierStatus) -> Self {
        Self {
            is_available: status.is_available,
            region: Some(status.region).filter(|r| !r.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reads_browser_format() {
        let json = r#"{"isAvailable":true,"region":"Caí","lastUpdated":1700000000000}"#;
        let status: CourierStatus = serde_json::from_str(json).unwrap();

        assert!(status.is_available);
        assert_eq!(status.region, "Caí");
        assert_eq!(status.last_updated.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_entry_writes_browser_format() {
        let entry = DirectoryEntry {
            username: "rui".to_string(),
            phone: "(11) 99999-0000".to_string(),
            region: "Centro".to_string(),
            last_updated: DateTime::from_timestamp_millis(42).unwrap(),
        };
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["lastUpdated"], 42);
        assert_eq!(value["phone"], "(11) 99999-0000");
    }

    #[test]
    fn test_own_status_from_record() {
        let own = OwnStatus::from(CourierStatus {
            is_available: true,
            region: "Bonfim".to_string(),
            last_updated: Utc::now(),
        });
        assert!(own.is_available);
        assert_eq!(own.region.as_deref(), Some("Bonfim"));

        let blank = OwnStatus::from(CourierStatus {
            is_available: false,
            region: String::new(),
            last_updated: Utc::now(),
        });
        assert_eq!(blank, OwnStatus::offline());
    }
}
