//! Coordinates, reverse geocoding and device position lookup.
//!
//! Street labels come from a Nominatim-compatible reverse endpoint. Every
//! failure degrades to a fixed human-readable label, and every positioning
//! failure degrades to the town's default coordinate.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GeocodingConfig;
use crate::error::{Error, Result};

/// Label used when a road name is missing from an address.
pub const UNKNOWN_STREET_LABEL: &str = "Rua desconhecida";

/// Label used when the lookup succeeded but returned no address.
pub const ADDRESS_NOT_FOUND_LABEL: &str = "Endereço não encontrado";

/// Label used when the lookup itself failed.
pub const GEOCODING_FAILED_LABEL: &str = "Erro ao obter endereço";

/// Label stored on an alert whose street label is empty.
pub const MAP_LOCATION_LABEL: &str = "Localização no mapa";

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Coordinates {
    /// Create a new coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that both components are finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// The parts of a structured address used for street labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Address {
    /// Road name.
    pub road: Option<String>,
    /// Pedestrian way name, used when there is no road.
    pub pedestrian: Option<String>,
    /// Suburb name.
    pub suburb: Option<String>,
    /// Neighbourhood name, used when there is no suburb.
    pub neighbourhood: Option<String>,
}

impl Address {
    /// Human-readable "street, suburb" label.
    #[must_use]
    pub fn street_label(&self) -> String {
        let street = non_empty(self.road.as_deref())
            .or_else(|| non_empty(self.pedestrian.as_deref()))
            .unwrap_or(UNKNOWN_STREET_LABEL);
        match non_empty(self.suburb.as_deref()).or_else(|| non_empty(self.neighbourhood.as_deref()))
        {
            Some(suburb) => format!("{street}, {suburb}"),
            None => street.to_string(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of a reverse lookup response. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
}

/// Resolves a coordinate to a structured address.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Look up the address at `at`.
    ///
    /// Returns `Ok(None)` when the service answered but has no address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or response decoding fails.
    async fn reverse(&self, at: Coordinates) -> Result<Option<Address>>;
}

/// Resolve the street label for `at`, never failing.
pub async fn resolve_street_label(geocoder: &dyn ReverseGeocoder, at: Coordinates) -> String {
    match geocoder.reverse(at).await {
        Ok(Some(address)) => address.street_label(),
        Ok(None) => {
            debug!("No address found at {}", at);
            ADDRESS_NOT_FOUND_LABEL.to_string()
        }
        Err(e) => {
            warn!("Reverse geocoding failed at {}: {}", at, e);
            GEOCODING_FAILED_LABEL.to_string()
        }
    }
}

/// Reverse geocoder backed by a Nominatim-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    /// Build a geocoder from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Decode a reverse lookup body.
    fn parse(body: &str) -> Result<Option<Address>> {
        let response: ReverseResponse = serde_json::from_str(body)?;
        Ok(response.address)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, at: Coordinates) -> Result<Option<Address>> {
        debug!("Reverse geocoding {}", at);
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("format", "json".to_string()),
                ("lat", at.lat.to_string()),
                ("lon", at.lng.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Self::parse(&body)
    }
}

/// Geocoder used when network lookups are turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGeocoder;

#[async_trait]
impl ReverseGeocoder for OfflineGeocoder {
    async fn reverse(&self, _at: Coordinates) -> Result<Option<Address>> {
        Err(Error::geocoding("geocoding disabled"))
    }
}

/// Source of the device's live position.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Ask for the current position.
    ///
    /// # Errors
    ///
    /// Returns an error when the position is denied or unavailable.
    async fn current_position(&self) -> Result<Coordinates>;
}

/// Locator reporting a fixed, pre-configured position (or none).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocator {
    position: Option<Coordinates>,
}

impl FixedLocator {
    /// Create a locator that reports `position`, or is unavailable for `None`.
    #[must_use]
    pub const fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Locator for FixedLocator {
    async fn current_position(&self) -> Result<Coordinates> {
        self.position
            .ok_or_else(|| Error::location_unavailable("no device position available"))
    }
}

/// Ask `locator` for a position, falling back to `fallback` on denial,
/// unavailability or when `timeout` elapses.
pub async fn locate_or(
    locator: &dyn Locator,
    timeout: Duration,
    fallback: Coordinates,
) -> Coordinates {
    match tokio::time::timeout(timeout, locator.current_position()).await {
        Ok(Ok(position)) if position.is_valid() => position,
        Ok(Ok(position)) => {
            warn!("Ignoring out-of-range device position {}", position);
            fallback
        }
        Ok(Err(e)) => {
            debug!("Device position unavailable: {}", e);
            fallback
        }
        Err(_) => {
            warn!("Device position timed out after {:?}", timeout);
            fallback
        }
    }
}
