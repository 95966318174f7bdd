//! The logged-in identity.
//!
//! Identity is a free-text name and a phone number. Nothing is verified;
//! the session only labels reports and directory entries.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result, ValidationError};
use crate::phone;
use crate::storage::Storage;

/// Shortest accepted username, after trimming.
pub const MIN_USERNAME_LEN: usize = 3;

/// A logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Display name.
    pub username: String,
    /// Phone in display mask form.
    pub phone: String,
}

impl Session {
    /// Validate login input and build a session from it.
    ///
    /// The phone is checked before the name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPhone`] for a phone that masks to
    /// fewer than 14 characters and [`ValidationError::UsernameTooShort`] for
    /// a name under three characters.
    pub fn validated(username: &str, phone_input: &str) -> std::result::Result<Self, ValidationError> {
        let masked = phone::mask(phone_input);
        if !phone::is_plausible(&masked) {
            return Err(ValidationError::InvalidPhone);
        }

        let username = username.trim();
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::UsernameTooShort);
        }

        Ok(Self {
            username: username.to_string(),
            phone: masked,
        })
    }
}

/// Holds the current session and its optional persisted copy.
#[derive(Debug)]
pub struct SessionHolder<'a> {
    storage: &'a Storage,
    current: Option<Session>,
}

impl<'a> SessionHolder<'a> {
    /// Restore the remembered session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn restore(storage: &'a Storage) -> Result<Self> {
        let current = storage.load_session()?;
        if let Some(session) = &current {
            debug!("Restored session for {}", session.username);
        }
        Ok(Self { storage, current })
    }

    /// Log in, remembering the session across runs when `remember` is set.
    ///
    /// Without `remember` any previously remembered session is forgotten.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, or an error if the database
    /// operation fails.
    pub fn login(&mut self, username: &str, phone: &str, remember: bool) -> Result<&Session> {
        let session = Session::validated(username, phone)?;
        if remember {
            self.storage.save_session(&session)?;
        } else {
            self.storage.clear_session()?;
        }
        info!("Logged in as {}", session.username);
        Ok(self.current.insert(session))
    }

    /// Use `username` and `phone` for this run only, leaving storage alone.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input.
    pub fn assume(&mut self, username: &str, phone: &str) -> Result<&Session> {
        let session = Session::validated(username, phone)?;
        debug!("Using transient identity {}", session.username);
        Ok(self.current.insert(session))
    }

    /// Log out and forget the remembered session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn logout(&mut self) -> Result<Option<Session>> {
        self.storage.clear_session()?;
        let previous = self.current.take();
        if let Some(session) = &previous {
            info!("Logged out {}", session.username);
        }
        Ok(previous)
    }

    /// The current session, if logged in.
    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The current session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] when nobody is logged in.
    pub fn require(&self) -> Result<&Session> {
        self.current.as_ref().ok_or(Error::NotLoggedIn)
    }
}
