//! The alert board: report, confirm, dispute and sweep.

use chrono::{DateTime, Utc};
use reqwest::Url;
use tracing::{debug, info};

use super::{Alert, AlertType};
use crate::error::{Error, Result, ValidationError};
use crate::expiry::AlertPolicy;
use crate::geo::{Coordinates, MAP_LOCATION_LABEL};
use crate::messaging::Messenger;
use crate::session::Session;
use crate::storage::Storage;

/// Input for a new report.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    /// Kind of incident.
    pub alert_type: AlertType,
    /// Resolved location; reporting is refused without one.
    pub location: Option<Coordinates>,
    /// Street label for the location.
    pub street: String,
    /// Optional details.
    pub description: String,
    /// Reporting username.
    pub user: String,
}

/// A stored alert and the link that shares it.
#[derive(Debug, Clone)]
pub struct Report {
    /// The alert as stored.
    pub alert: Alert,
    /// Prefilled chat-app link announcing it.
    pub share_link: Url,
}

/// Result of a dispute vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisputeOutcome {
    /// The vote was recorded and the alert stays.
    Counted {
        /// Votes after this one.
        votes: u32,
    },
    /// The vote reached the threshold and the alert is gone.
    Removed,
}

/// Alert operations over the shared alert collection.
#[derive(Debug)]
pub struct AlertBoard<'a> {
    storage: &'a Storage,
    policy: AlertPolicy,
    messenger: &'a Messenger,
}

impl<'a> AlertBoard<'a> {
    /// Create a board over `storage`.
    #[must_use]
    pub fn new(storage: &'a Storage, policy: AlertPolicy, messenger: &'a Messenger) -> Self {
        Self {
            storage,
            policy,
            messenger,
        }
    }

    /// Live alerts at `now`, newest first. Expired alerts are swept first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let (alerts, _) = self.load_live(now)?;
        Ok(alerts)
    }

    /// Remove alerts that expired by `now`.
    ///
    /// Returns the number of alerts removed. Storage is only written when
    /// something was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let (_, removed) = self.load_live(now)?;
        Ok(removed)
    }

    /// Store a new alert at the top of the board.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::LocationRequired`] without a location, or an
    /// error if the database operation fails.
    pub fn report(&self, input: NewAlert, now: DateTime<Utc>) -> Result<Report> {
        let location = input
            .location
            .filter(Coordinates::is_valid)
            .ok_or(ValidationError::LocationRequired)?;

        let (mut alerts, _) = self.load_live(now)?;

        let street = if input.street.trim().is_empty() {
            MAP_LOCATION_LABEL.to_string()
        } else {
            input.street
        };
        let alert = Alert::new(
            next_id(&alerts, now),
            input.alert_type,
            input.description.trim().to_string(),
            street,
            location,
            now,
            input.user,
        );

        alerts.insert(0, alert.clone());
        self.storage.save_alerts(&alerts)?;
        info!(
            "Reported {} at {} as {}",
            alert.alert_type, alert.street, alert.id
        );

        let share_link = self.messenger.alert_broadcast(&alert);
        Ok(Report { alert, share_link })
    }

    /// Mark an alert as still present, restarting its lifetime.
    ///
    /// Any logged-in `voter` may confirm any alert.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlertNotFound`] if no live alert has `id`, or an error
    /// if the database operation fails.
    pub fn confirm(&self, voter: &Session, id: &str, now: DateTime<Utc>) -> Result<Alert> {
        let (mut alerts, _) = self.load_live(now)?;
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::alert_not_found(id))?;

        alert.created_at = now;
        let confirmed = alert.clone();
        self.storage.save_alerts(&alerts)?;
        info!("Confirmed alert {} by {}", id, voter.username);
        Ok(confirmed)
    }

    /// Vote that an alert is no longer there.
    ///
    /// The alert is removed in the same write once it reaches the dispute
    /// threshold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlertNotFound`] if no live alert has `id`, or an error
    /// if the database operation fails.
    pub fn dispute(
        &self,
        voter: &Session,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<DisputeOutcome> {
        let (mut alerts, _) = self.load_live(now)?;
        let index = alerts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| Error::alert_not_found(id))?;

        alerts[index].votes += 1;
        let outcome = if self.policy.is_disputed(&alerts[index]) {
            alerts.remove(index);
            info!("Removed disputed alert {} after vote by {}", id, voter.username);
            DisputeOutcome::Removed
        } else {
            debug!(
                "Dispute vote on {} by {} ({} votes)",
                id, voter.username, alerts[index].votes
            );
            DisputeOutcome::Counted {
                votes: alerts[index].votes,
            }
        };

        self.storage.save_alerts(&alerts)?;
        Ok(outcome)
    }

    /// Load the collection, drop what the policy rejects and write back if
    /// anything changed.
    fn load_live(&self, now: DateTime<Utc>) -> Result<(Vec<Alert>, usize)> {
        let stored = self.storage.load_alerts()?;
        let before = stored.len();
        let live: Vec<Alert> = stored
            .into_iter()
            .filter(|a| self.policy.retention(a, now).is_keep())
            .collect();

        let removed = before - live.len();
        if removed > 0 {
            self.storage.save_alerts(&live)?;
            info!("Swept {} expired alerts", removed);
        }
        Ok((live, removed))
    }
}

/// Millisecond timestamp id, bumped past any id already in use.
fn next_id(existing: &[Alert], now: DateTime<Utc>) -> String {
    let mut candidate = now.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !existing.iter().any(|a| a.id == id) {
            return id;
        }
        candidate += 1;
    }
}
