use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::error;

use super::{
    ArrowDecoration, Error, MapOptions, MarkerId, MarkerLayer, POLYLINE_ARROW_COLOR,
    POLYLINE_COLOR, PinMarker, Polyline, PolylineId, PolylineLayer, PolylineOptions, Popup,
    StopMarker, Theme, VehicleLayer, VehicleMarker, Viewport, decode_shape, registry::Registry,
};
use crate::{
    oba::{Stop, Trip, TripStatus},
    shared::geo::{BoundingBox, Coordinate},
    vehicles::{svg_data_url, vehicle_color, vehicle_icon_svg},
};

const STYLE_BASE_URL: &str = "https://tiles.openfreemap.org/styles";
const VEHICLE_Z_INDEX_OFFSET: i32 = 1000;

/// Leaflet `divIcon` options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivIcon {
    pub html: String,
    pub icon_size: (u32, u32),
    pub icon_anchor: (u32, u32),
    pub class_name: String,
}

impl DivIcon {
    fn vehicle(svg: &str) -> Self {
        Self {
            html: format!(
                r#"<img src="{}" style="width:45px;height:45px;" />"#,
                svg_data_url(svg)
            ),
            icon_size: (40, 40),
            icon_anchor: (20, 20),
            class_name: String::new(),
        }
    }
}

/// Render model of a Leaflet map with a MapLibre vector base layer.
#[derive(Debug)]
pub struct OpenStreetMapProvider {
    registry: Registry,
    icons: HashMap<MarkerId, DivIcon>,
    style_name: &'static str,
}

impl Default for OpenStreetMapProvider {
    fn default() -> Self {
        Self {
            registry: Registry::default(),
            icons: HashMap::new(),
            style_name: "positron",
        }
    }
}

impl OpenStreetMapProvider {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn style_url(&self) -> String {
        format!("{STYLE_BASE_URL}/{}", self.style_name)
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

    pub fn vehicle_icon(&self, marker: MarkerId) -> Option<&DivIcon> {
        self.icons.get(&marker)
    }

    pub fn pin_marker(&self, marker: MarkerId) -> Option<&PinMarker> {
        self.registry.pins.get(&marker)
    }

    pub fn polyline(&self, polyline: PolylineId) -> Option<&Polyline> {
        self.registry.polylines.get(&polyline)
    }

    pub fn user_location(&self) -> Option<&PinMarker> {
        self.registry.user_location.as_ref()
    }

    pub fn overlay_count(&self) -> usize {
        self.registry.popups.len() + self.icons.len()
    }
}

impl MarkerLayer for OpenStreetMapProvider {
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

    fn open_popup(&mut self, marker: MarkerId) -> Option<&Popup> {
        self.registry.open(marker)
    }

    fn cleanup_info_window(&mut self) {
        self.registry.close_popup();
    }
}

impl VehicleLayer for OpenStreetMapProvider {
    type VehicleMarker = MarkerId;

    fn add_vehicle_marker(&mut self, status: &TripStatus, trip: &Trip) -> Option<MarkerId> {
        let svg = vehicle_icon_svg(status.orientation, Some(vehicle_color(status)));
        let icon = DivIcon::vehicle(&svg);
        let id = self
            .registry
            .insert_vehicle(status, trip, svg, VEHICLE_Z_INDEX_OFFSET)?;
        self.icons.insert(id, icon);
        Some(id)
    }

    /// Unknown next stops read "N/A" once a marker has been refreshed.
    fn update_vehicle_marker(&mut self, marker: &MarkerId, status: &TripStatus, trip: &Trip) {
        if !self.registry.is_ready() {
            return;
        }
        let svg = vehicle_icon_svg(status.orientation, Some(vehicle_color(status)));
        let icon = DivIcon::vehicle(&svg);
        let mut popup = self.registry.vehicle_popup(status, trip);
        popup.next_stop_name.get_or_insert_with(|| "N/A".into());
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

impl PolylineLayer for OpenStreetMapProvider {
    async fn create_polyline(
        &mut self,
        shape: &str,
        options: PolylineOptions,
    ) -> Result<PolylineId, Error> {
        if !self.registry.is_ready() {
            return Err(Error::NotInitialised);
        }
        let path = decode_shape(shape)?;
        if path.is_empty() {
            error!("Failed to decode polyline: {shape}");
            return Err(Error::Polyline("empty path".into()));
        }

        let arrow = options.with_arrow.then(|| ArrowDecoration {
            color: POLYLINE_ARROW_COLOR.into(),
            scale: 12.0,
            offset: "0".into(),
            repeat: "125".into(),
        });
        let id = self.registry.polyline_id();
        self.registry.polylines.insert(
            id,
            Polyline {
                id,
                path,
                color: options.color.unwrap_or_else(|| POLYLINE_COLOR.into()),
                weight: 4.0,
                opacity: 1.0,
                geodesic: false,
                arrow,
            },
        );
        Ok(id)
    }

    /// Removes the line together with its arrow decorator.
    fn remove_polyline(&mut self, polyline: PolylineId) -> bool {
        self.registry.polylines.remove(&polyline).is_some()
    }
}

impl Viewport for OpenStreetMapProvider {
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

    /// Swaps the MapLibre base layer style.
    fn set_theme(&mut self, theme: Theme) {
        if !self.registry.is_ready() {
            return;
        }
        self.registry.theme = theme;
        self.style_name = match theme {
            Theme::Dark => "dark",
            Theme::Light => "positron",
        };
    }

    fn theme(&self) -> Theme {
        self.registry.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oba::Position;

    fn provider() -> OpenStreetMapProvider {
        let mut provider = OpenStreetMapProvider::new();
        provider.init_map(MapOptions::new((47.6062, -122.3321).into()));
        provider
    }

    fn status() -> TripStatus {
        TripStatus {
            vehicle_id: "1_7012".into(),
            position: Some(Position {
                lat: 47.61,
                lon: -122.33,
            }),
            next_stop: Some("unknown".into()),
            ..Default::default()
        }
    }

    #[test]
    fn theme_switches_style() {
        let mut provider = provider();
        assert!(provider.style_url().ends_with("/positron"));
        provider.set_theme(Theme::Dark);
        assert_eq!(provider.style_url(), "https://tiles.openfreemap.org/styles/dark");
        assert_eq!(provider.theme(), Theme::Dark);
    }

    #[test]
    fn unknown_next_stop_reads_na_after_update() {
        let mut provider = provider();
        let trip = Trip {
            id: "1_1".into(),
            trip_headsign: "Northgate".into(),
            ..Default::default()
        };
        let marker = provider.add_vehicle_marker(&status(), &trip).unwrap();
        assert_eq!(provider.vehicle_marker(marker).unwrap().popup.next_stop_name, None);
        provider.update_vehicle_marker(&marker, &status(), &trip);
        let popup = &provider.vehicle_marker(marker).unwrap().popup;
        assert_eq!(popup.next_stop_name.as_deref(), Some("N/A"));
        assert_eq!(popup.next_destination, "Northgate");
        assert!(provider.vehicle_icon(marker).unwrap().html.starts_with("<img"));
    }

    #[test]
    fn clearing_vehicles_releases_icons_and_popups() {
        let mut provider = provider();
        let trip = Trip::default();
        provider.add_vehicle_marker(&status(), &trip).unwrap();
        provider.add_vehicle_marker(&status(), &trip).unwrap();
        assert_eq!(provider.overlay_count(), 4);
        provider.clear_vehicle_markers();
        assert_eq!(provider.overlay_count(), 0);
        assert_eq!(provider.vehicle_markers().count(), 0);
    }

    #[test]
    fn pins_and_highlights() {
        let mut provider = provider();
        let pin = provider
            .add_pin_marker((47.62, -122.35).into(), "From")
            .unwrap();
        assert_eq!(provider.pin_marker(pin).unwrap().text, "From");
        assert!(matches!(provider.open_popup(pin), Some(Popup::Pin { .. })));
        assert!(provider.remove_pin_marker(pin));

        let stop = Stop {
            id: "1_575".into(),
            ..Default::default()
        };
        provider.add_stop_marker(&stop, None);
        assert!(provider.highlight_marker("1_575"));
        assert!(provider.stop_marker("1_575").unwrap().highlighted);
        assert!(provider.unhighlight_marker("1_575"));
        assert!(!provider.highlight_marker("missing"));
        provider.remove_stop_markers();
        assert_eq!(provider.stop_markers().count(), 0);
    }

    #[test]
    fn fly_to_moves_and_zooms() {
        let mut provider = provider();
        provider.fly_to((47.0, -122.0).into(), 15);
        assert_eq!(provider.center(), Some((47.0, -122.0).into()));
        assert_eq!(provider.zoom(), Some(15));
        let bbox = provider.bounding_box().unwrap();
        assert!(bbox.contains(&(47.0, -122.0).into()));
    }

    #[tokio::test]
    async fn polyline_without_arrow() {
        let mut provider = provider();
        let options = PolylineOptions {
            with_arrow: false,
            color: Some("#FF0000".into()),
        };
        let id = provider
            .create_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@", options)
            .await
            .unwrap();
        let polyline = provider.polyline(id).unwrap();
        assert!(polyline.arrow.is_none());
        assert_eq!(polyline.color, "#FF0000");
    }

    #[tokio::test]
    async fn polyline_requires_initialised_map() {
        let mut provider = OpenStreetMapProvider::new();
        let result = provider
            .create_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@", PolylineOptions::default())
            .await;
        assert!(matches!(result, Err(Error::NotInitialised)));
    }
}
