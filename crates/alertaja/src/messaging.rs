//! Chat-app deep links.
//!
//! Messages are never sent from here; the board only builds the link that a
//! chat app opens with the text prefilled.

use reqwest::Url;

use crate::alerts::Alert;
use crate::config::Config;
use crate::courier::DirectoryEntry;
use crate::error::{Error, Result};
use crate::phone;

/// Builds prefilled chat-app links.
#[derive(Debug, Clone)]
pub struct Messenger {
    base: Url,
    country_code: String,
    town_name: String,
}

impl Messenger {
    /// Create a messenger for `town_name` using links rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(base_url: &str, country_code: &str, town_name: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| Error::ConfigValidation {
            message: format!("invalid messaging base_url {base_url}: {e}"),
        })?;
        Ok(Self {
            base,
            country_code: country_code.to_string(),
            town_name: town_name.to_string(),
        })
    }

    /// Create a messenger from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.messaging.base_url,
            &config.messaging.country_code,
            &config.town.name,
        )
    }

    /// Link that shares a new alert with any chat.
    #[must_use]
    pub fn alert_broadcast(&self, alert: &Alert) -> Url {
        with_text(self.base.clone(), &self.alert_text(alert))
    }

    /// Link that opens a chat with an available courier.
    ///
    /// # Errors
    ///
    /// Returns an error if the courier's phone cannot form a link path.
    pub fn courier_contact(&self, entry: &DirectoryEntry) -> Result<Url> {
        let number = phone::normalize_international(&entry.phone, &self.country_code);
        let url = self
            .base
            .join(&number)
            .map_err(|e| Error::internal(format!("cannot build contact link: {e}")))?;
        Ok(with_text(url, &self.contact_text(&entry.username)))
    }

    /// Broadcast text for a new alert.
    #[must_use]
    pub fn alert_text(&self, alert: &Alert) -> String {
        let details = if alert.description.trim().is_empty() {
            "Sem detalhes"
        } else {
            alert.description.trim()
        };
        format!(
            "*{}* 🚨\nNova ocorrência: *{}*\nLocal: {}\nObs: {}",
            self.town_name,
            alert.alert_type.label(),
            alert.street,
            details
        )
    }

    /// Greeting sent to a courier.
    #[must_use]
    pub fn contact_text(&self, courier_name: &str) -> String {
        format!(
            "Olá {courier_name}, vi sua disponibilidade no {}. Gostaria de solicitar uma corrida.",
            self.town_name
        )
    }
}

fn with_text(mut url: Url, text: &str) -> Url {
    url.query_pairs_mut().clear().append_pair("text", text);
    url
}
