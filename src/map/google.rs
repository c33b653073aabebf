use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{
    ArrowDecoration, Error, MapOptions, MarkerId, MarkerLayer, POLYLINE_ARROW_COLOR,
    POLYLINE_COLOR, PinMarker, Polyline, PolylineId, PolylineLayer, PolylineOptions, Popup,
    StopMarker, Theme, VehicleLayer, VehicleMarker, Viewport, decode_shape, registry::Registry,
};
use crate::{
    oba::{Stop, Trip, TripStatus},
    shared::{
        build_url,
        geo::{BoundingBox, Coordinate},
    },
    vehicles::{svg_data_url, vehicle_color, vehicle_icon_svg},
};

const GOOGLE_MAPS_URL: &str = "https://maps.googleapis.com/maps";
const VEHICLE_Z_INDEX: i32 = 1000;
const VEHICLE_ICON_SIZE: u32 = 40;

/// Icon as handed to a Google `Marker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerIcon {
    pub url: String,
    pub scaled_size: (u32, u32),
    pub anchor: (u32, u32),
}

impl MarkerIcon {
    fn vehicle(svg: &str) -> Self {
        Self {
            url: svg_data_url(svg),
            scaled_size: (VEHICLE_ICON_SIZE, VEHICLE_ICON_SIZE),
            anchor: (VEHICLE_ICON_SIZE / 2, VEHICLE_ICON_SIZE / 2),
        }
    }
}

/// One entry of a Google map style array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapTypeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<&'static str>,
    pub color: &'static str,
}

const fn style(
    feature_type: Option<&'static str>,
    element_type: Option<&'static str>,
    color: &'static str,
) -> MapTypeStyle {
    MapTypeStyle {
        feature_type,
        element_type,
        color,
    }
}

pub fn night_mode_styles() -> Vec<MapTypeStyle> {
    vec![
        style(None, Some("geometry"), "#242f3e"),
        style(None, Some("labels.text.stroke"), "#242f3e"),
        style(None, Some("labels.text.fill"), "#746855"),
        style(Some("poi"), Some("labels.text.fill"), "#d59563"),
        style(Some("poi.park"), Some("geometry"), "#263c3f"),
        style(Some("road"), Some("geometry"), "#38414e"),
        style(Some("road"), Some("geometry.stroke"), "#212a37"),
        style(Some("road.highway"), Some("geometry"), "#746855"),
        style(Some("transit"), Some("geometry"), "#2f3948"),
        style(Some("water"), Some("geometry"), "#17263c"),
        style(Some("water"), Some("labels.text.fill"), "#515c6d"),
    ]
}

/// Stand-in for the SDK's `geometry` library, imported on first use.
#[derive(Debug)]
pub struct GeometryLibrary {
    precision: u32,
}

impl GeometryLibrary {
    async fn import() -> Self {
        info!("Importing geometry library");
        Self { precision: 5 }
    }

    fn decode_path(&self, shape: &str) -> Result<Vec<Coordinate>, Error> {
        debug!("Decoding path with precision {}", self.precision);
        decode_shape(shape)
    }
}

/// Render model of a Google Maps map.
#[derive(Debug)]
pub struct GoogleMapProvider {
    api_key: String,
    registry: Registry,
    icons: HashMap<MarkerId, MarkerIcon>,
    styles: Option<Vec<MapTypeStyle>>,
    geometry: OnceCell<GeometryLibrary>,
}

impl GoogleMapProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }
        Ok(Self {
            api_key,
            registry: Registry::default(),
            icons: HashMap::new(),
            styles: None,
            geometry: OnceCell::new(),
        })
    }

    /// Maps JavaScript API loader url for this key.
    pub fn script_url(&self) -> String {
        build_url(
            GOOGLE_MAPS_URL,
            "api/js",
            &[("key", self.api_key.as_str()), ("libraries", "geometry")],
        )
    }

    pub fn geometry_loaded(&self) -> bool {
        self.geometry.initialized()
    }

    pub fn styles(&self) -> Option<&[MapTypeStyle]> {
        self.styles.as_deref()
    }

    pub fn stop_marker(&self, stop_id: &str) -> Option<&StopMarker> {
        self.registry.stop_markers.get(stop_id)
    }

    pub fn stop_markers(&self) -> impl Iterator<Item = &StopMarker> {
        self.registry.stop_markers.values()
    }

    pub fn vehicle_marker(&self, marker: MarkerId) -> Option<&VehicleMarker> {
        self.registry.vehicles.get(&marker)
    }

    pub fn vehicle_markers(&self) -> impl Iterator<Item = &VehicleMarker> {
        self.registry.vehicles.values()
    }

    pub fn vehicle_icon(&self, marker: MarkerId) -> Option<&MarkerIcon> {
        self.icons.get(&marker)
    }

    pub fn polyline(&self, polyline: PolylineId) -> Option<&Polyline> {
        self.registry.polylines.get(&polyline)
    }

    pub fn user_location(&self) -> Option<&PinMarker> {
        self.registry.user_location.as_ref()
    }

    pub fn open_popup_marker(&self) -> Option<MarkerId> {
        self.registry.open_popup
    }

    /// Popups and icons still held by the map.
    pub fn overlay_count(&self) -> usize {
        self.registry.popups.len() + self.icons.len()
    }
}

impl MarkerLayer for GoogleMapProvider {
    fn add_stop_marker(&mut self, stop: &Stop, arrival_time: Option<i64>) -> Option<MarkerId> {
        self.registry.insert_stop(stop, arrival_time)
    }

    fn highlight_marker(&mut self, stop_id: &str) -> bool {
        self.registry.set_highlight(stop_id, true)
    }

    fn unhighlight_marker(&mut self, stop_id: &str) -> bool {
        self.registry.set_highlight(stop_id, false)
    }

    fn remove_stop_marker(&mut self, stop_id: &str) -> bool {
        self.registry.remove_stop(stop_id)
    }

    fn remove_stop_markers(&mut self) {
        self.registry.clear_stops();
    }

    fn add_pin_marker(&mut self, position: Coordinate, text: &str) -> Option<MarkerId> {
        self.registry.insert_pin(position, text)
    }

    fn remove_pin_marker(&mut self, marker: MarkerId) -> bool {
        self.registry.remove_pin(marker)
    }

    fn add_user_location_marker(&mut self, position: Coordinate) -> Option<MarkerId> {
        self.registry.set_user_location(position)
    }

    /// A single global info window: opening one closes the previous one.
    fn open_popup(&mut self, marker: MarkerId) -> Option<&Popup> {
        self.registry.close_popup();
        self.registry.open(marker)
    }

    fn cleanup_info_window(&mut self) {
        self.registry.close_popup();
    }
}

impl VehicleLayer for GoogleMapProvider {
    type VehicleMarker = MarkerId;

    fn add_vehicle_marker(&mut self, status: &TripStatus, trip: &Trip) -> Option<MarkerId> {
        let svg = vehicle_icon_svg(status.orientation, Some(vehicle_color(status)));
        let icon = MarkerIcon::vehicle(&svg);
        let id = self
            .registry
            .insert_vehicle(status, trip, svg, VEHICLE_Z_INDEX)?;
        self.icons.insert(id, icon);
        Some(id)
    }

    fn update_vehicle_marker(&mut self, marker: &MarkerId, status: &TripStatus, trip: &Trip) {
        if !self.registry.is_ready() {
            return;
        }
        let svg = vehicle_icon_svg(status.orientation, Some(vehicle_color(status)));
        let icon = MarkerIcon::vehicle(&svg);
        let popup = self.registry.vehicle_popup(status, trip);
        if self
            .registry
            .update_vehicle(*marker, status, trip, svg, popup)
        {
            self.icons.insert(*marker, icon);
        }
    }

    fn remove_vehicle_marker(&mut self, marker: MarkerId) {
        self.icons.remove(&marker);
        self.registry.remove_vehicle(marker);
    }

    fn clear_vehicle_markers(&mut self) {
        if !self.registry.is_ready() {
            return;
        }
        for id in self.registry.vehicles.keys() {
            self.icons.remove(id);
        }
        self.registry.clear_vehicles();
    }
}

impl PolylineLayer for GoogleMapProvider {
    async fn create_polyline(
        &mut self,
        shape: &str,
        options: PolylineOptions,
    ) -> Result<PolylineId, Error> {
        if !self.registry.is_ready() {
            return Err(Error::NotInitialised);
        }
        let geometry = self.geometry.get_or_init(GeometryLibrary::import).await;
        let path = geometry.decode_path(shape)?;

        let arrow = options.with_arrow.then(|| ArrowDecoration {
            color: POLYLINE_ARROW_COLOR.into(),
            scale: 2.0,
            offset: "100%".into(),
            repeat: "50px".into(),
        });
        let id = self.registry.polyline_id();
        self.registry.polylines.insert(
            id,
            Polyline {
                id,
                path,
                color: options.color.unwrap_or_else(|| POLYLINE_COLOR.into()),
                weight: 5.0,
                opacity: 1.0,
                geodesic: true,
                arrow,
            },
        );
        Ok(id)
    }

    fn remove_polyline(&mut self, polyline: PolylineId) -> bool {
        self.registry.polylines.remove(&polyline).is_some()
    }
}

impl Viewport for GoogleMapProvider {
    fn init_map(&mut self, options: MapOptions) {
        self.registry.view = Some(options.into());
    }

    fn set_center(&mut self, center: Coordinate) {
        if let Some(view) = self.registry.view.as_mut() {
            view.center = center;
        }
    }

    fn center(&self) -> Option<Coordinate> {
        self.registry.view.map(|view| view.center)
    }

    fn set_zoom(&mut self, zoom: u8) {
        if let Some(view) = self.registry.view.as_mut() {
            view.zoom = zoom;
        }
    }

    fn zoom(&self) -> Option<u8> {
        self.registry.view.map(|view| view.zoom)
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        self.registry.view.map(|view| view.bounding_box())
    }

    fn set_theme(&mut self, theme: Theme) {
        self.registry.theme = theme;
        self.styles = match theme {
            Theme::Dark => Some(night_mode_styles()),
            Theme::Light => None,
        };
    }

    fn theme(&self) -> Theme {
        self.registry.theme
    }
}
