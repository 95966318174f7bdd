//! Incident alerts.
//!
//! An alert is a user-submitted report pinned to a coordinate. It lives for a
//! fixed time after its last confirmation and disappears early once enough
//! viewers dispute it.

mod board;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

pub use board::{AlertBoard, DisputeOutcome, NewAlert, Report};

/// Kind of incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Traffic accident.
    Accident,
    /// Police check point.
    Blitz,
    /// Heavy traffic.
    Traffic,
    /// Closed road.
    ClosedRoad,
    /// Any other hazard.
    Danger,
}

impl AlertType {
    /// Every alert type, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Accident,
        Self::Blitz,
        Self::Traffic,
        Self::ClosedRoad,
        Self::Danger,
    ];

    /// Label shown to users.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Accident => "Acidente",
            Self::Blitz => "Blitz Policial",
            Self::Traffic => "Trânsito Intenso",
            Self::ClosedRoad => "Rua Fechada",
            Self::Danger => "Cuidado / Perigo",
        }
    }

    /// Marker color as a CSS hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Accident => "#dc2626",
            Self::Blitz => "#2563eb",
            Self::Traffic => "#ca8a04",
            Self::ClosedRoad => "#9333ea",
            Self::Danger => "#ea580c",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accident => write!(f, "accident"),
            Self::Blitz => write!(f, "blitz"),
            Self::Traffic => write!(f, "traffic"),
            Self::ClosedRoad => write!(f, "closed_road"),
            Self::Danger => write!(f, "danger"),
        }
    }
}

/// A reported incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Time-based identifier.
    pub id: String,

    /// Kind of incident.
    #[serde(rename = "type")]
    pub alert_type: AlertType,

    /// Free-text details, possibly empty.
    #[serde(default)]
    pub description: String,

    /// Street label of the location.
    pub street: String,

    /// Latitude of the incident.
    pub lat: f64,

    /// Longitude of the incident.
    pub lng: f64,

    /// Report time, reset on every confirmation.
    #[serde(rename = "createdAt", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// Dispute votes received so far.
    #[serde(default)]
    pub votes: u32,

    /// Name of the reporting user.
    pub user: String,
}

impl Alert {
    /// Create an alert with no votes.
    #[must_use]
    pub fn new(
        id: String,
        alert_type: AlertType,
        description: String,
        street: String,
        location: Coordinates,
        created_at: DateTime<Utc>,
        user: String,
    ) -> Self {
        Self {
            id,
            alert_type,
            description,
            street,
            lat: location.lat,
            lng: location.lng,
            created_at,
            votes: 0,
            user,
        }
    }

    /// Where the incident is.
    #[must_use]
    pub fn location(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_type_display_matches_serde() {
        for t in AlertType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{t}\""));
        }
    }

    #[test]
    fn test_alert_type_labels_and_colors() {
        assert_eq!(AlertType::Blitz.label(), "Blitz Policial");
        assert_eq!(AlertType::ClosedRoad.color(), "#9333ea");
    }

    #[test]
    fn test_alert_reads_browser_format() {
        let json = r#"{
            "id": "1700000000000",
            "type": "closed_road",
            "description": "",
            "street": "Rua A, Centro",
            "lat": -23.3,
            "lng": -47.1,
            "createdAt": 1700000000000,
            "votes": 1,
            "user": "ana"
        }"#;
        let alert: Alert = serde_json::from_str(json).unwrap();

        assert_eq!(alert.alert_type, AlertType::ClosedRoad);
        assert_eq!(alert.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(alert.votes, 1);
        assert_eq!(alert.location(), Coordinates::new(-23.3, -47.1));
    }

    #[test]
    fn test_alert_writes_browser_format() {
        let alert = Alert::new(
            "42".to_string(),
            AlertType::Danger,
            "buraco".to_string(),
            "Rua B".to_string(),
            Coordinates::new(1.0, 2.0),
            DateTime::from_timestamp_millis(1_000).unwrap(),
            "rui".to_string(),
        );
        let value = serde_json::to_value(&alert).unwrap();

        assert_eq!(value["type"], "danger");
        assert_eq!(value["createdAt"], 1_000);
        assert_eq!(value["votes"], 0);
    }
}
