//! Error types for alertaja.
//!
//! This module defines all error types used throughout the alertaja crate.
//! Form-level problems are reported through [`ValidationError`], whose
//! messages are shown to the user verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for alertaja operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Board Errors ===
    /// User input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The command needs a logged-in user.
    #[error("not logged in; run `alertaja login` or pass --name and --phone")]
    NotLoggedIn,

    /// No live alert has the given id.
    #[error("alert not found: {id}")]
    AlertNotFound {
        /// The requested alert id.
        id: String,
    },

    /// No live directory entry has the given phone.
    #[error("no available courier with phone {phone}")]
    CourierNotFound {
        /// The requested phone number.
        phone: String,
    },

    // === Network Errors ===
    /// Reverse geocoding failed.
    #[error("geocoding failed: {0}")]
    Geocoding(String),

    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The device position could not be determined.
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for alertaja operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

/// Input rejected before it reaches storage.
///
/// The display strings are the messages shown next to the offending field.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The phone number is too short once formatted.
    #[error("Por favor, digite um número de celular válido.")]
    InvalidPhone,

    /// The username has fewer than three characters.
    #[error("Por favor, digite seu nome de usuário.")]
    UsernameTooShort,

    /// Going online without choosing a region.
    #[error("Por favor, selecione uma região.")]
    RegionRequired,

    /// Reporting an alert without a resolved location.
    #[error("Selecione a localização da ocorrência no mapa.")]
    LocationRequired,
}

impl Error {
    /// Create a new geocoding error.
    #[must_use]
    pub fn geocoding(message: impl Into<String>) -> Self {
        Self::Geocoding(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a location unavailable error.
    #[must_use]
    pub fn location_unavailable(message: impl Into<String>) -> Self {
        Self::LocationUnavailable(message.into())
    }

    /// Create an alert not found error.
    #[must_use]
    pub fn alert_not_found(id: impl Into<String>) -> Self {
        Self::AlertNotFound { id: id.into() }
    }
}
