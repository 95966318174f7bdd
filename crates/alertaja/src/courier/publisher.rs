//! A courier's own availability toggle.

use chrono::{DateTime, Utc};
use tracing::info;

use super::{CourierDirectory, DirectoryEntry, OwnStatus};
use crate::config::TownConfig;
use crate::error::{Result, ValidationError};
use crate::expiry::CourierPolicy;
use crate::session::Session;
use crate::storage::Storage;

/// Publishes the logged-in courier's availability.
#[derive(Debug)]
pub struct AvailabilityPublisher<'a> {
    storage: &'a Storage,
    policy: CourierPolicy,
    town: &'a TownConfig,
}

impl<'a> AvailabilityPublisher<'a> {
    /// Create a publisher over `storage`.
    #[must_use]
    pub fn new(storage: &'a Storage, policy: CourierPolicy, town: &'a TownConfig) -> Self {
        Self {
            storage,
            policy,
            town,
        }
    }

    /// Current availability of the courier with `phone`.
    ///
    /// An expired record is deleted and reported as offline.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_own_status(&self, phone: &str, now: DateTime<Utc>) -> Result<OwnStatus> {
        let Some(status) = self.storage.load_courier_status(phone)? else {
            return Ok(OwnStatus::offline());
        };

        if self.policy.status_retention(&status, now).is_keep() {
            Ok(status.into())
        } else {
            self.storage.remove_courier_status(phone)?;
            info!("Expired availability of {}", phone);
            Ok(OwnStatus::offline())
        }
    }

    /// Flip the courier's availability.
    ///
    /// Going online needs `region`; going offline ignores it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RegionRequired`] when going online without a
    /// region, or an error if the database operation fails.
    pub fn toggle_availability(
        &self,
        session: &Session,
        region: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OwnStatus> {
        if self.load_own_status(&session.phone, now)?.is_available {
            self.go_offline(session)
        } else {
            self.go_online(session, region.unwrap_or_default(), now)
        }
    }

    /// List the courier in `region`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RegionRequired`] for a blank region, or an
    /// error if the database operation fails.
    pub fn go_online(
        &self,
        session: &Session,
        region: &str,
        now: DateTime<Utc>,
    ) -> Result<OwnStatus> {
        let region = region.trim();
        if region.is_empty() {
            return Err(ValidationError::RegionRequired.into());
        }
        let region = self
            .town
            .canonical_region(region)
            .unwrap_or(region)
            .to_string();

        let entry = DirectoryEntry {
            username: session.username.clone(),
            phone: session.phone.clone(),
            region,
            last_updated: now,
        };
        let status = self.directory().upsert(entry)?;

        info!("{} is available in {}", session.username, status.region);
        Ok(status.into())
    }

    /// Remove the courier from the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn go_offline(&self, session: &Session) -> Result<OwnStatus> {
        self.directory().remove(&session.phone)?;

        info!("{} is offline", session.username);
        Ok(OwnStatus::offline())
    }

    fn directory(&self) -> CourierDirectory<'a> {
        CourierDirectory::new(self.storage, self.policy)
    }
}
