//! Typed access to the board's persisted records.
//!
//! Keys and JSON shapes match what the browser build keeps in local storage,
//! so an exported store can be loaded as-is.

use tracing::{debug, warn};

use super::{KvWrite, Storage};
use crate::alerts::Alert;
use crate::courier::{CourierStatus, DirectoryEntry};
use crate::error::Result;
use crate::session::Session;

/// Key of the remembered session.
pub const SESSION_KEY: &str = "alertaJaUser";

/// Key of the shared alert collection.
pub const ALERTS_KEY: &str = "alertaJaAlerts";

/// Key of the shared courier directory.
pub const DIRECTORY_KEY: &str = "alertaJaMotoboys";

/// Prefix of per-courier availability keys; the phone follows it.
const COURIER_STATUS_PREFIX: &str = "motoboyStatus_";

/// Availability key for the courier with `phone`.
#[must_use]
fn courier_status_key(phone: &str) -> String {
    format!("{COURIER_STATUS_PREFIX}{phone}")
}

impl Storage {
    /// Load the remembered session.
    ///
    /// A session record that cannot be read is deleted and reported absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_session(&self) -> Result<Option<Session>> {
        if self.get(SESSION_KEY)?.is_none() {
            return Ok(None);
        }
        let session = self.get_json::<Session>(SESSION_KEY)?;
        if session.is_none() {
            warn!("Removing unreadable session record");
            self.remove(SESSION_KEY)?;
        }
        Ok(session)
    }

    /// Remember `session` across runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.put_json(SESSION_KEY, session)
    }

    /// Forget the remembered session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_session(&self) -> Result<bool> {
        self.remove(SESSION_KEY)
    }

    /// Load every stored alert, expired or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_alerts(&self) -> Result<Vec<Alert>> {
        Ok(self.get_json(ALERTS_KEY)?.unwrap_or_default())
    }

    /// Replace the alert collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_alerts(&self, alerts: &[Alert]) -> Result<()> {
        debug!("Saving {} alerts", alerts.len());
        self.put_json(ALERTS_KEY, alerts)
    }

    /// Load the availability record of the courier with `phone`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_courier_status(&self, phone: &str) -> Result<Option<CourierStatus>> {
        self.get_json(&courier_status_key(phone))
    }

    /// Delete the availability record of the courier with `phone`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_courier_status(&self, phone: &str) -> Result<bool> {
        self.remove(&courier_status_key(phone))
    }

    /// Load the whole courier directory, expired entries included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_directory(&self) -> Result<Vec<DirectoryEntry>> {
        Ok(self.get_json(DIRECTORY_KEY)?.unwrap_or_default())
    }

    /// Replace the courier directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_directory(&self, entries: &[DirectoryEntry]) -> Result<()> {
        debug!("Saving {} directory entries", entries.len());
        self.put_json(DIRECTORY_KEY, entries)
    }

    /// Store a courier's availability and the matching directory together.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn publish_courier(
        &self,
        phone: &str,
        status: &CourierStatus,
        directory: &[DirectoryEntry],
    ) -> Result<()> {
        self.apply(&[
            KvWrite::put_json(courier_status_key(phone), status)?,
            KvWrite::put_json(DIRECTORY_KEY, directory)?,
        ])
    }

    /// Delete a courier's availability and store the directory without them.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn withdraw_courier(&self, phone: &str, directory: &[DirectoryEntry]) -> Result<()> {
        self.apply(&[
            KvWrite::remove(courier_status_key(phone)),
            KvWrite::put_json(DIRECTORY_KEY, directory)?,
        ])
    }
}
