//! The shared courier directory.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{CourierStatus, DirectoryEntry};
use crate::error::{Error, Result};
use crate::expiry::CourierPolicy;
use crate::phone;
use crate::storage::Storage;

/// Read and maintain the list of available couriers.
#[derive(Debug)]
pub struct CourierDirectory<'a> {
    storage: &'a Storage,
    policy: CourierPolicy,
}

impl<'a> CourierDirectory<'a> {
    /// Create a directory view over `storage`.
    #[must_use]
    pub fn new(storage: &'a Storage, policy: CourierPolicy) -> Self {
        Self { storage, policy }
    }

    /// Live couriers whose region or name contains `filter`, ignoring case.
    ///
    /// Expired entries are dropped and the trimmed list is written back.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self, filter: &str, now: DateTime<Utc>) -> Result<Vec<DirectoryEntry>> {
        let live = self.live(now)?;
        Ok(live
            .into_iter()
            .filter(|e| matches_filter(e, filter))
            .collect())
    }

    /// All live couriers.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn live(&self, now: DateTime<Utc>) -> Result<Vec<DirectoryEntry>> {
        let stored = self.storage.load_directory()?;
        let before = stored.len();
        let live: Vec<DirectoryEntry> = stored
            .into_iter()
            .filter(|e| self.policy.entry_retention(e, now).is_keep())
            .collect();

        if live.len() != before {
            self.storage.save_directory(&live)?;
            info!("Dropped {} expired couriers", before - live.len());
        }
        Ok(live)
    }

    /// The live entry for `phone`, compared by digits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CourierNotFound`] if no live courier has that phone,
    /// or an error if the database operation fails.
    pub fn find(&self, phone: &str, now: DateTime<Utc>) -> Result<DirectoryEntry> {
        let wanted = phone::digits(phone);
        self.live(now)?
            .into_iter()
            .find(|e| !wanted.is_empty() && phone::digits(&e.phone) == wanted)
            .ok_or_else(|| Error::CourierNotFound {
                phone: phone.to_string(),
            })
    }

    /// List `entry` as available, replacing any entry with the same phone.
    ///
    /// The courier's own status record is written in the same transaction
    /// and returned.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn upsert(&self, entry: DirectoryEntry) -> Result<CourierStatus> {
        let status = CourierStatus {
            is_available: true,
            region: entry.region.clone(),
            last_updated: entry.last_updated,
        };
        let phone = entry.phone.clone();
        let entries = with_entry(self.storage.load_directory()?, entry);
        self.storage.publish_courier(&phone, &status, &entries)?;
        Ok(status)
    }

    /// Drop every entry with `phone` and delete its status record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn remove(&self, phone: &str) -> Result<()> {
        let entries = without_phone(self.storage.load_directory()?, phone);
        self.storage.withdraw_courier(phone, &entries)
    }
}

/// `entries` with `entry` appended after removing its phone's old entries.
fn with_entry(entries: Vec<DirectoryEntry>, entry: DirectoryEntry) -> Vec<DirectoryEntry> {
    let mut entries = without_phone(entries, &entry.phone);
    debug!("Listing courier {} in {}", entry.username, entry.region);
    entries.push(entry);
    entries
}

/// `entries` without any entry for `phone`.
fn without_phone(entries: Vec<DirectoryEntry>, phone: &str) -> Vec<DirectoryEntry> {
    let wanted = phone::digits(phone);
    entries
        .into_iter()
        .filter(|e| {
            if wanted.is_empty() {
                e.phone != phone
            } else {
                phone::digits(&e.phone) != wanted
            }
        })
        .collect()
}

fn matches_filter(entry: &DirectoryEntry, filter: &str) -> bool {
    let filter = filter.trim().to_lowercase();
    filter.is_empty()
        || entry.region.to_lowercase().contains(&filter)
        || entry.username.to_lowercase().contains(&filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(username: &str, phone: &str, region: &str, at: DateTime<Utc>) -> DirectoryEntry {
        DirectoryEntry {
            username: username.to_string(),
            phone: phone.to_string(),
            region: region.to_string(),
            last_updated: at,
        }
    }

    fn storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_upsert_is_idempotent_by_phone() {
        let storage = storage();
        let directory = CourierDirectory::new(&storage, CourierPolicy::default());
        let now = Utc::now();

        directory
            .upsert(entry("rui", "11999990000", "Centro", now))
            .unwrap();
        directory
            .upsert(entry("rui", "11999990000", "Pinhal", now))
            .unwrap();

        let listed = directory.list("", now).unwrap();
        assert_eq!(listed.len(), 1);
        let status = storage.load_courier_status("11999990000").unwrap().unwrap();
        assert!(status.is_available);
        assert_eq!(status.region, "Pinhal");
        assert_eq!(listed[0].region, "Pinhal");
    }

    #[test]
    fn test_upsert_matches_masked_and_bare_phone() {
        let storage = storage();
        let directory = CourierDirectory::new(&storage, CourierPolicy::default());
        let now = Utc::now();

        directory
            .upsert(entry("rui", "(11) 99999-0000", "Centro", now))
            .unwrap();
        directory
            .upsert(entry("rui", "11999990000", "Centro", now))
            .unwrap();

        assert_eq!(directory.list("", now).unwrap().len(), 1);
    }

    #[test]
    fn test_listed_after_going_online() {
        let storage = storage();
        let directory = CourierDirectory::new(&storage, CourierPolicy::default());
        let now = Utc::now();

        directory
            .upsert(entry("rui", "11999990000", "Centro", now))
            .unwrap();

        let found = directory.list("", now + Duration::minutes(1)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].phone, "11999990000");
        assert_eq!(found[0].region, "Centro");
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let storage = storage();
        let directory = CourierDirectory::new(&storage, CourierPolicy::default());
        let now = Utc::now();

        directory
            .upsert(entry("rui", "1", "Centro", now))
            .unwrap();
        directory
            .upsert(entry("Cecília", "2", "Jacaré", now))
            .unwrap();

        let by_region = directory.list("cent", now).unwrap();
        assert_eq!(by_region.len(), 1);
        assert_eq!(by_region[0].region, "Centro");

        let by_name = directory.list("CEC", now).unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].username, "Cecília");

        assert!(directory.list("zzz", now).unwrap().is_empty());
        assert_eq!(directory.list("  ", now).unwrap().len(), 2);
    }

    #[test]
    fn test_expired_entries_are_dropped_and_persisted() {
        let storage = storage();
        let directory = CourierDirectory::new(&storage, CourierPolicy::default());
        let t0 = Utc::now();

        directory.upsert(entry("old", "1", "Caí", t0)).unwrap();
        directory
            .upsert(entry("new", "2", "Caí", t0 + Duration::hours(7)))
            .unwrap();

        let listed = directory.list("", t0 + Duration::hours(8)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username, "new");
        assert_eq!(storage.load_directory().unwrap().len(), 1);
    }

    #[test]
    fn test_find_by_digits() {
        let storage = storage();
        let directory = CourierDirectory::new(&storage, CourierPolicy::default());
        let now = Utc::now();

        directory
            .upsert(entry("rui", "(11) 99999-0000", "Centro", now))
            .unwrap();

        assert_eq!(
            directory.find("11999990000", now).unwrap().username,
            "rui"
        );
        assert!(matches!(
            directory.find("11888880000", now).unwrap_err(),
            Error::CourierNotFound { .. }
        ));
        assert!(directory.find("", now).is_err());
    }

    #[test]
    fn test_remove_drops_all_for_phone() {
        let storage = storage();
        storage
            .save_directory(&[
                entry("rui", "1", "Centro", Utc::now()),
                entry("rui", "1", "Caí", Utc::now()),
                entry("ana", "2", "Caí", Utc::now()),
            ])
            .unwrap();

        let directory = CourierDirectory::new(&storage, CourierPolicy::default());
        directory.upsert(entry("rui", "1", "Caí", Utc::now())).unwrap();
        assert!(storage.load_courier_status("1").unwrap().is_some());
        directory.remove("1").unwrap();

        let left = storage.load_directory().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].username, "ana");
        assert!(storage.load_courier_status("1").unwrap().is_none());
    }

    #[test]
    fn test_without_phone_with_non_digit_phone() {
        let now = Utc::now();
        let entries = vec![entry("a", "n/a", "X", now), entry("b", "x", "X", now)];
        let left = without_phone(entries, "n/a");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].username, "b");
    }
}
