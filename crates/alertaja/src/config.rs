//! Configuration management for alertaja.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Coordinates;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "alertaja";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "board.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ALERTAJA_`, sections split by `__`)
/// 2. TOML config file at `~/.config/alertaja/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// The town the board covers.
    pub town: TownConfig,
    /// Record lifetimes and removal rules.
    pub expiry: ExpiryConfig,
    /// Reverse geocoding configuration.
    pub geocoding: GeocodingConfig,
    /// Device position configuration.
    pub device: DeviceConfig,
    /// Outbound chat-app links.
    pub messaging: MessagingConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/alertaja/board.db`
    pub database_path: Option<PathBuf>,
}

/// Town-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TownConfig {
    /// Display name used in shared messages.
    pub name: String,
    /// Latitude the map and pin start on.
    pub default_latitude: f64,
    /// Longitude the map and pin start on.
    pub default_longitude: f64,
    /// Neighborhoods couriers can announce themselves in.
    pub regions: Vec<String>,
}

/// Expiry-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryConfig {
    /// Minutes an alert stays on the board after its last confirmation.
    pub alert_lifetime_minutes: u32,
    /// Minutes a courier status or directory entry stays valid.
    pub courier_lifetime_minutes: u32,
    /// Dispute votes that remove an alert.
    pub dispute_threshold: u32,
    /// Seconds between sweeps in `alerts watch`.
    pub sweep_interval_secs: u64,
}

/// Reverse geocoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Resolve street labels over the network.
    pub enabled: bool,
    /// Nominatim-compatible reverse endpoint.
    pub endpoint: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User agent sent with every lookup.
    pub user_agent: String,
}

/// Device position configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Fixed position reported as the device location, if any.
    pub position: Option<Coordinates>,
    /// How long to wait for a position before falling back.
    pub locate_timeout_ms: u64,
}

/// Messaging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Base URL of the chat-app deep link.
    pub base_url: String,
    /// Country code prepended to local numbers.
    pub country_code: String,
}

impl Default for TownConfig {
    fn default() -> Self {
        Self {
            name: "AlertaJá Cabreúva".to_string(),
            default_latitude: -23.3069,
            default_longitude: -47.1325,
            regions: default_regions(),
        }
    }
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            alert_lifetime_minutes: 4 * 60,
            courier_lifetime_minutes: 8 * 60,
            dispute_threshold: 3,
            sweep_interval_secs: 60,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://nominatim.openstreetmap.org/reverse".to_string(),
            timeout_ms: 5_000,
            user_agent: concat!("alertaja/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            position: None,
            locate_timeout_ms: 5_000,
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wa.me/".to_string(),
            country_code: "55".to_string(),
        }
    }
}

/// Default neighborhoods of Cabreúva.
fn default_regions() -> Vec<String> {
    [
        "Jacaré",
        "Centro",
        "Pinhal",
        "Bonfim",
        "Vilarejo",
        "Bananal",
        "Caí",
        "Vale Verde",
        "Outra",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ALERTAJA_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::ConfigValidation { message });

        if self.expiry.alert_lifetime_minutes == 0 {
            return invalid("alert_lifetime_minutes must be greater than 0".to_string());
        }
        if self.expiry.courier_lifetime_minutes == 0 {
            return invalid("courier_lifetime_minutes must be greater than 0".to_string());
        }
        if self.expiry.dispute_threshold == 0 {
            return invalid("dispute_threshold must be greater than 0".to_string());
        }
        if self.expiry.sweep_interval_secs == 0 {
            return invalid("sweep_interval_secs must be greater than 0".to_string());
        }

        if !self.town.default_location().is_valid() {
            return invalid(format!(
                "default coordinate out of range: {}, {}",
                self.town.default_latitude, self.town.default_longitude
            ));
        }
        if let Some(position) = self.device.position {
            if !position.is_valid() {
                return invalid(format!("device position out of range: {position}"));
            }
        }

        if self.town.regions.iter().any(|r| r.trim().is_empty()) {
            return invalid("regions must not contain empty names".to_string());
        }

        if self.geocoding.enabled && reqwest::Url::parse(&self.geocoding.endpoint).is_err() {
            return invalid(format!(
                "invalid geocoding endpoint: {}",
                self.geocoding.endpoint
            ));
        }
        if reqwest::Url::parse(&self.messaging.base_url).is_err() {
            return invalid(format!(
                "invalid messaging base_url: {}",
                self.messaging.base_url
            ));
        }
        if self.messaging.country_code.is_empty()
            || !self.messaging.country_code.chars().all(|c| c.is_ascii_digit())
        {
            return invalid(format!(
                "country_code must be digits: {:?}",
                self.messaging.country_code
            ));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the sweep interval as a Duration.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.expiry.sweep_interval_secs)
    }

    /// Get the device locate timeout as a Duration.
    #[must_use]
    pub fn locate_timeout(&self) -> Duration {
        Duration::from_millis(self.device.locate_timeout_ms)
    }
}

impl GeocodingConfig {
    /// Request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl TownConfig {
    /// The coordinate maps and pins start on.
    #[must_use]
    pub fn default_location(&self) -> Coordinates {
        Coordinates::new(self.default_latitude, self.default_longitude)
    }

    /// Match a region against the configured neighborhoods, ignoring case.
    ///
    /// Returns the configured spelling when one matches.
    #[must_use]
    pub fn canonical_region(&self, region: &str) -> Option<&str> {
        let wanted = region.trim().to_lowercase();
        self.regions
            .iter()
            .find(|r| r.to_lowercase() == wanted)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.expiry.alert_lifetime_minutes, 240);
        assert_eq!(config.expiry.courier_lifetime_minutes, 480);
        assert_eq!(config.expiry.dispute_threshold, 3);
        assert_eq!(config.messaging.country_code, "55");
        assert!(config.geocoding.enabled);
    }

    #[test]
    fn test_default_town() {
        let town = TownConfig::default();
        assert!(town.name.contains("Cabreúva"));
        assert!(town.regions.contains(&"Centro".to_string()));
        assert_eq!(town.default_location(), Coordinates::new(-23.3069, -47.1325));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_alert_lifetime() {
        let mut config = Config::default();
        config.expiry.alert_lifetime_minutes = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("alert_lifetime_minutes"));
    }

    #[test]
    fn test_validate_zero_courier_lifetime() {
        let mut config = Config::default();
        config.expiry.courier_lifetime_minutes = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("courier_lifetime_minutes"));
    }

    #[test]
    fn test_validate_zero_dispute_threshold() {
        let mut config = Config::default();
        config.expiry.dispute_threshold = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("dispute_threshold"));
    }

    #[test]
    fn test_validate_zero_sweep_interval() {
        let mut config = Config::default();
        config.expiry.sweep_interval_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("sweep_interval_secs"));
    }

    #[test]
    fn test_validate_bad_default_coordinate() {
        let mut config = Config::default();
        config.town.default_latitude = 123.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default coordinate"));
    }

    #[test]
    fn test_validate_bad_device_position() {
        let mut config = Config::default();
        config.device.position = Some(Coordinates::new(0.0, 200.0));

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("device position"));
    }

    #[test]
    fn test_validate_empty_region_name() {
        let mut config = Config::default();
        config.town.regions.push("  ".to_string());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut config = Config::default();
        config.geocoding.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());

        config.geocoding.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_country_code() {
        let mut config = Config::default();
        config.messaging.country_code = "+55".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("country_code"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("board.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.geocoding.timeout(), Duration::from_millis(5_000));
        assert_eq!(config.locate_timeout(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_canonical_region() {
        let town = TownConfig::default();
        assert_eq!(town.canonical_region("centro"), Some("Centro"));
        assert_eq!(town.canonical_region(" VALE VERDE "), Some("Vale Verde"));
        assert_eq!(town.canonical_region("Itu"), None);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("alertaja"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "alertaja_config_test_{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[expiry]\ndispute_threshold = 5\n\n[town]\nname = \"AlertaJá Itu\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path.clone())).unwrap();
        assert_eq!(config.expiry.dispute_threshold, 5);
        assert_eq!(config.town.name, "AlertaJá Itu");
        assert_eq!(config.expiry.alert_lifetime_minutes, 240);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_candidate_file_loads_beside_broken_file() {
        let dir = std::env::temp_dir();
        let broken = dir.join(format!("alertaja_broken_{}.toml", std::process::id()));
        let candidate = dir.join(format!("alertaja_candidate_{}.toml", std::process::id()));
        std::fs::write(&broken, "[expiry]\ndispute_threshold = 0\n").unwrap();
        std::fs::write(&candidate, "[expiry]\ndispute_threshold = 4\n").unwrap();

        assert!(Config::load_from(Some(broken.clone())).is_err());
        let config = Config::load_from(Some(candidate.clone())).unwrap();
        assert_eq!(config.expiry.dispute_threshold, 4);

        let _ = std::fs::remove_file(&broken);
        let _ = std::fs::remove_file(&candidate);
    }

    #[test]
    fn test_expiry_config_deserialize() {
        let json = r#"{"alert_lifetime_minutes": 30}"#;
        let expiry: ExpiryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(expiry.alert_lifetime_minutes, 30);
        assert_eq!(expiry.courier_lifetime_minutes, 480);
    }

    #[test]
    fn test_device_config_position_deserialize() {
        let json = r#"{"position": {"lat": -23.3, "lng": -47.1}}"#;
        let device: DeviceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(device.position, Some(Coordinates::new(-23.3, -47.1)));
        assert_eq!(device.locate_timeout_ms, 5_000);
    }
}
