//! Map presentation.
//!
//! Rendering belongs to whatever implements [`MarkerLayer`]. This module keeps
//! the layer's markers in step with the live alerts and drives the pin used to
//! place a new alert.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::alerts::Alert;
use crate::display::alert_age_label;
use crate::geo::{self, Coordinates, Locator, ReverseGeocoder};

/// Everything a layer needs to draw one alert marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    /// Alert the marker belongs to.
    pub alert_id: String,
    /// Marker position.
    pub position: Coordinates,
    /// Fill color as a CSS hex string.
    pub color: &'static str,
    /// Popup heading, the alert type label.
    pub title: String,
    /// Popup street line.
    pub street: String,
    /// Popup age line as of the sync.
    pub age: String,
}

impl MarkerSpec {
    /// Describe `alert` as seen at `now`.
    #[must_use]
    pub fn for_alert(alert: &Alert, now: DateTime<Utc>) -> Self {
        Self {
            alert_id: alert.id.clone(),
            position: alert.location(),
            color: alert.alert_type.color(),
            title: alert.alert_type.label().to_string(),
            street: alert.street.clone(),
            age: alert_age_label(alert.created_at, now),
        }
    }
}

/// A surface that can show and hide markers.
pub trait MarkerLayer {
    /// Identifies a marker on this layer.
    type Handle;

    /// Draw a marker and return its handle.
    fn add_marker(&mut self, spec: MarkerSpec) -> Self::Handle;

    /// Erase a previously added marker.
    fn remove_marker(&mut self, handle: Self::Handle);
}

/// Changes made by one [`MarkerSync::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Markers drawn for new alerts.
    pub added: usize,
    /// Markers erased for alerts that are gone.
    pub removed: usize,
}

/// Keeps exactly one marker per live alert.
///
/// Existing markers are never updated in place; a marker lives from the first
/// sync that sees its alert until the first sync that doesn't.
#[derive(Debug)]
pub struct MarkerSync<L: MarkerLayer> {
    layer: L,
    markers: HashMap<String, L::Handle>,
}

impl<L: MarkerLayer> MarkerSync<L> {
    /// Start with no markers on `layer`.
    pub fn new(layer: L) -> Self {
        Self {
            layer,
            markers: HashMap::new(),
        }
    }

    /// Bring the layer in line with `alerts`.
    pub fn sync(&mut self, alerts: &[Alert], now: DateTime<Utc>) -> SyncReport {
        let mut report = SyncReport::default();

        let gone: Vec<String> = self
            .markers
            .keys()
            .filter(|id| !alerts.iter().any(|a| &a.id == *id))
            .cloned()
            .collect();
        for id in gone {
            if let Some(handle) = self.markers.remove(&id) {
                self.layer.remove_marker(handle);
                report.removed += 1;
            }
        }

        for alert in alerts {
            if !self.markers.contains_key(&alert.id) {
                let handle = self.layer.add_marker(MarkerSpec::for_alert(alert, now));
                self.markers.insert(alert.id.clone(), handle);
                report.added += 1;
            }
        }

        debug!(
            "Marker sync: {} added, {} removed",
            report.added, report.removed
        );
        report
    }

    /// Number of markers on the layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the layer shows no markers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// The underlying layer.
    pub fn layer(&self) -> &L {
        &self.layer
    }
}

/// A layer that renders to a `GeoJSON` `FeatureCollection`.
#[derive(Debug, Default)]
pub struct GeoJsonLayer {
    next_handle: u64,
    features: BTreeMap<u64, MarkerSpec>,
}

impl GeoJsonLayer {
    /// Create an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the current markers.
    ///
    /// Positions follow `GeoJSON` axis order, longitude first.
    #[must_use]
    pub fn to_feature_collection(&self) -> Value {
        let features: Vec<Value> = self
            .features
            .values()
            .map(|spec| {
                json!({
                    "type": "Feature",
                    "id": spec.alert_id,
                    "geometry": {
                        "type": "Point",
                        "coordinates": [spec.position.lng, spec.position.lat],
                    },
                    "properties": {
                        "marker-color": spec.color,
                        "title": spec.title,
                        "street": spec.street,
                        "age": spec.age,
                    },
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }
}

impl MarkerLayer for GeoJsonLayer {
    type Handle = u64;

    fn add_marker(&mut self, spec: MarkerSpec) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.features.insert(handle, spec);
        handle
    }

    fn remove_marker(&mut self, handle: u64) {
        self.features.remove(&handle);
    }
}

/// Token for one pin placement.
///
/// A street label may only be applied with the token of the latest move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinMove {
    generation: u64,
    /// Where the pin was put.
    pub position: Coordinates,
}

/// The single draggable pin used to place a new alert.
#[derive(Debug, Clone)]
pub struct PinPicker {
    position: Coordinates,
    generation: u64,
    label: Option<String>,
}

impl PinPicker {
    /// Put the pin on `start` with no label yet.
    #[must_use]
    pub fn new(start: Coordinates) -> Self {
        Self {
            position: start,
            generation: 0,
            label: None,
        }
    }

    /// Where the pin is.
    #[must_use]
    pub fn position(&self) -> Coordinates {
        self.position
    }

    /// Street label of the current position, once resolved.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Move the pin, invalidating any lookup still in flight.
    pub fn move_to(&mut self, at: Coordinates) -> PinMove {
        self.generation += 1;
        self.position = at;
        self.label = None;
        PinMove {
            generation: self.generation,
            position: at,
        }
    }

    /// Apply a resolved label if `pin_move` is still the latest move.
    ///
    /// Returns `false` and leaves the label alone for a superseded move.
    pub fn apply_label(&mut self, pin_move: PinMove, label: String) -> bool {
        if pin_move.generation != self.generation {
            debug!("Discarding stale label for {}", pin_move.position);
            return false;
        }
        self.label = Some(label);
        true
    }

    /// Move the pin to the device position, or leave it where it is when the
    /// device can't tell in time.
    pub async fn locate(&mut self, locator: &dyn Locator, timeout: Duration) -> PinMove {
        let at = geo::locate_or(locator, timeout, self.position).await;
        self.move_to(at)
    }

    /// Move the pin and look up its street label.
    pub async fn move_and_resolve(
        &mut self,
        at: Coordinates,
        geocoder: &dyn ReverseGeocoder,
    ) -> Option<&str> {
        let pin_move = self.move_to(at);
        let label = geo::resolve_street_label(geocoder, pin_move.position).await;
        self.apply_label(pin_move, label);
        self.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertType;
    use crate::error::{Error, Result};
    use crate::geo::{Address, FixedLocator};
    use async_trait::async_trait;

    const DEFAULT: Coordinates = Coordinates::new(-23.3069, -47.1325);

    fn alert(id: &str, alert_type: AlertType) -> Alert {
        Alert::new(
            id.to_string(),
            alert_type,
            String::new(),
            "Rua A".to_string(),
            Coordinates::new(-23.3, -47.1),
            Utc::now(),
            "ana".to_string(),
        )
    }

    #[derive(Default)]
    struct RecordingLayer {
        added: Vec<String>,
        removed: Vec<String>,
    }

    impl MarkerLayer for RecordingLayer {
        type Handle = String;

        fn add_marker(&mut self, spec: MarkerSpec) -> String {
            self.added.push(spec.alert_id.clone());
            spec.alert_id
        }

        fn remove_marker(&mut self, handle: String) {
            self.removed.push(handle);
        }
    }

    struct NamedStreets;

    #[async_trait]
    impl ReverseGeocoder for NamedStreets {
        async fn reverse(&self, at: Coordinates) -> Result<Option<Address>> {
            Ok(Some(Address {
                road: Some(format!("Rua {:.1}", at.lat)),
                ..Address::default()
            }))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl ReverseGeocoder for Unreachable {
        async fn reverse(&self, _at: Coordinates) -> Result<Option<Address>> {
            Err(Error::geocoding("connection refused"))
        }
    }

    #[test]
    fn test_sync_adds_one_marker_per_alert() {
        let mut sync = MarkerSync::new(RecordingLayer::default());
        let alerts = vec![alert("1", AlertType::Traffic), alert("2", AlertType::Blitz)];

        let report = sync.sync(&alerts, Utc::now());
        assert_eq!(report, SyncReport { added: 2, removed: 0 });

        // Same alerts again: nothing new
        let report = sync.sync(&alerts, Utc::now());
        assert_eq!(report, SyncReport::default());
        assert_eq!(sync.layer().added, vec!["1", "2"]);
        assert_eq!(sync.len(), 2);
    }

    #[test]
    fn test_sync_removes_markers_of_gone_alerts() {
        let mut sync = MarkerSync::new(RecordingLayer::default());
        sync.sync(
            &[alert("1", AlertType::Traffic), alert("2", AlertType::Blitz)],
            Utc::now(),
        );

        let report = sync.sync(&[alert("2", AlertType::Blitz), alert("3", AlertType::Danger)], Utc::now());
        assert_eq!(report, SyncReport { added: 1, removed: 1 });
        assert_eq!(sync.layer().removed, vec!["1"]);

        sync.sync(&[], Utc::now());
        assert!(sync.is_empty());
    }

    #[test]
    fn test_marker_spec_uses_type_color_and_label() {
        let spec = MarkerSpec::for_alert(&alert("1", AlertType::Accident), Utc::now());
        assert_eq!(spec.color, "#dc2626");
        assert_eq!(spec.title, "Acidente");
        assert_eq!(spec.age, "Há 0 min");
    }

    #[test]
    fn test_geojson_layer_renders_features() {
        let mut sync = MarkerSync::new(GeoJsonLayer::new());
        sync.sync(&[alert("7", AlertType::ClosedRoad)], Utc::now());

        let fc = sync.layer().to_feature_collection();
        assert_eq!(fc["type"], "FeatureCollection");
        let feature = &fc["features"][0];
        assert_eq!(feature["id"], "7");
        assert_eq!(feature["geometry"]["coordinates"][0], -47.1);
        assert_eq!(feature["geometry"]["coordinates"][1], -23.3);
        assert_eq!(feature["properties"]["marker-color"], "#9333ea");

        sync.sync(&[], Utc::now());
        let fc = sync.layer().to_feature_collection();
        assert_eq!(fc["features"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_stale_label_is_discarded() {
        let mut picker = PinPicker::new(DEFAULT);
        let first = picker.move_to(Coordinates::new(-23.1, -47.1));
        let second = picker.move_to(Coordinates::new(-23.2, -47.2));

        assert!(picker.apply_label(second, "Rua Nova".to_string()));
        assert!(!picker.apply_label(first, "Rua Velha".to_string()));

        assert_eq!(picker.label(), Some("Rua Nova"));
        assert_eq!(picker.position(), Coordinates::new(-23.2, -47.2));
    }

    #[test]
    fn test_move_clears_label() {
        let mut picker = PinPicker::new(DEFAULT);
        let m = picker.move_to(DEFAULT);
        picker.apply_label(m, "Rua A".to_string());
        picker.move_to(Coordinates::new(0.0, 0.0));
        assert!(picker.label().is_none());
    }

    #[tokio::test]
    async fn test_locate_uses_device_position() {
        let mut picker = PinPicker::new(DEFAULT);
        let here = Coordinates::new(-23.25, -47.05);

        let m = picker
            .locate(&FixedLocator::new(Some(here)), Duration::from_secs(5))
            .await;
        assert_eq!(m.position, here);
        assert_eq!(picker.position(), here);
    }

    #[tokio::test]
    async fn test_locate_falls_back_to_start() {
        let mut picker = PinPicker::new(DEFAULT);
        picker
            .locate(&FixedLocator::new(None), Duration::from_secs(5))
            .await;
        assert_eq!(picker.position(), DEFAULT);
    }

    #[tokio::test]
    async fn test_move_and_resolve() {
        let mut picker = PinPicker::new(DEFAULT);
        let label = picker
            .move_and_resolve(Coordinates::new(-23.3, -47.1), &NamedStreets)
            .await;
        assert_eq!(label, Some("Rua -23.3"));

        let label = picker.move_and_resolve(DEFAULT, &Unreachable).await;
        assert_eq!(label, Some(geo::GEOCODING_FAILED_LABEL));
    }
}
