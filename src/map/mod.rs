//! Map provider abstraction.
//!
//! A provider keeps the render model of one map: stop and vehicle markers,
//! popups, polylines and the viewport. Front ends draw from it. Two
//! flavours exist, [`GoogleMapProvider`] and [`OpenStreetMapProvider`], with
//! the same capability set split over four traits.

mod google;
mod osm;
mod registry;

pub use google::*;
pub use osm::*;

use std::{fmt::Display, future::Future};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    oba::{Stop, Trip, TripStatus},
    shared::geo::{BoundingBox, Coordinate},
    vehicles::VehiclePopup,
};

pub const POLYLINE_COLOR: &str = "#00A2FF";
pub const POLYLINE_ARROW_COLOR: &str = "#1E3A8A";
pub const DEFAULT_ZOOM: u8 = 14;
const TILE_SIZE: f64 = 256.0;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Map has not been initialised")]
    NotInitialised,
    #[error("Failed to decode polyline: {0}")]
    Polyline(String),
    #[error("Missing map api key")]
    MissingApiKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(u64);

impl Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolylineId(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    pub center: Coordinate,
    pub zoom: u8,
    /// Viewport size in pixels, used to derive the bounding box.
    pub width: u32,
    pub height: u32,
}

impl MapOptions {
    pub fn new(center: Coordinate) -> Self {
        Self {
            center,
            zoom: DEFAULT_ZOOM,
            width: 1024,
            height: 768,
        }
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center: Coordinate,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
}

impl ViewState {
    /// Web mercator approximation of the visible area.
    pub fn bounding_box(&self) -> BoundingBox {
        let degrees_per_pixel = 360.0 / (TILE_SIZE * f64::powi(2.0, self.zoom as i32));
        let lon_span = self.width as f64 * degrees_per_pixel;
        let lat_span =
            self.height as f64 * degrees_per_pixel * f64::cos(self.center.latitude.to_radians());
        BoundingBox::around(self.center, lat_span, lon_span)
    }
}

impl From<MapOptions> for ViewState {
    fn from(value: MapOptions) -> Self {
        Self {
            center: value.center,
            zoom: value.zoom,
            width: value.width,
            height: value.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopMarker {
    pub id: MarkerId,
    pub stop: Stop,
    pub arrival_time: Option<i64>,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleMarker {
    pub id: MarkerId,
    pub trip_id: String,
    pub position: Coordinate,
    pub icon_svg: String,
    pub popup: VehiclePopup,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinMarker {
    pub id: MarkerId,
    pub position: Coordinate,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Popup {
    Stop {
        stop_name: String,
        arrival_time: Option<i64>,
    },
    Vehicle(VehiclePopup),
    Pin {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowDecoration {
    pub color: String,
    pub scale: f64,
    /// Offset of the first arrow along the line, e.g. "100%".
    pub offset: String,
    /// Distance between arrows, e.g. "50px".
    pub repeat: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub id: PolylineId,
    pub path: Vec<Coordinate>,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub geodesic: bool,
    pub arrow: Option<ArrowDecoration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolylineOptions {
    pub with_arrow: bool,
    pub color: Option<String>,
}

impl Default for PolylineOptions {
    fn default() -> Self {
        Self {
            with_arrow: true,
            color: None,
        }
    }
}

/// Stops, pins, the user location and their popups.
pub trait MarkerLayer {
    /// Returns `None` until the map is initialised.
    fn add_stop_marker(&mut self, stop: &Stop, arrival_time: Option<i64>) -> Option<MarkerId>;
    fn highlight_marker(&mut self, stop_id: &str) -> bool;
    fn unhighlight_marker(&mut self, stop_id: &str) -> bool;
    fn remove_stop_marker(&mut self, stop_id: &str) -> bool;
    fn remove_stop_markers(&mut self);
    fn add_pin_marker(&mut self, position: Coordinate, text: &str) -> Option<MarkerId>;
    fn remove_pin_marker(&mut self, marker: MarkerId) -> bool;
    fn add_user_location_marker(&mut self, position: Coordinate) -> Option<MarkerId>;
    /// Opens the popup bound to a marker, as a click would.
    fn open_popup(&mut self, marker: MarkerId) -> Option<&Popup>;
    fn cleanup_info_window(&mut self);
}

/// Live vehicle markers. `VehicleMarker` is the provider's own handle.
pub trait VehicleLayer {
    type VehicleMarker;

    fn add_vehicle_marker(&mut self, status: &TripStatus, trip: &Trip)
    -> Option<Self::VehicleMarker>;
    fn update_vehicle_marker(
        &mut self,
        marker: &Self::VehicleMarker,
        status: &TripStatus,
        trip: &Trip,
    );
    fn remove_vehicle_marker(&mut self, marker: Self::VehicleMarker);
    fn clear_vehicle_markers(&mut self);
}

/// Route shapes drawn from encoded polylines.
pub trait PolylineLayer {
    fn create_polyline(
        &mut self,
        shape: &str,
        options: PolylineOptions,
    ) -> impl Future<Output = Result<PolylineId, self::Error>> + Send;
    fn remove_polyline(&mut self, polyline: PolylineId) -> bool;
}

pub trait Viewport {
    fn init_map(&mut self, options: MapOptions);
    fn set_center(&mut self, center: Coordinate);
    fn center(&self) -> Option<Coordinate>;
    fn pan_to(&mut self, center: Coordinate) {
        self.set_center(center);
    }
    fn fly_to(&mut self, center: Coordinate, zoom: u8) {
        self.set_center(center);
        self.set_zoom(zoom);
    }
    fn set_zoom(&mut self, zoom: u8);
    fn zoom(&self) -> Option<u8>;
    fn bounding_box(&self) -> Option<BoundingBox>;
    fn set_theme(&mut self, theme: Theme);
    fn theme(&self) -> Theme;
}

pub trait MapProvider: MarkerLayer + VehicleLayer + PolylineLayer + Viewport {}

impl<T> MapProvider for T where T: MarkerLayer + VehicleLayer + PolylineLayer + Viewport {}

pub(crate) fn decode_shape(shape: &str) -> Result<Vec<Coordinate>, self::Error> {
    let line = polyline::decode_polyline(shape, 5).map_err(|err| Error::Polyline(err.to_string()))?;
    Ok(line
        .0
        .iter()
        .map(|coord| Coordinate {
            latitude: coord.y,
            longitude: coord.x,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_polyline() {
        // Reference sample from the encoded polyline algorithm docs.
        let path = decode_shape("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(path.len(), 3);
        assert!((path[0].latitude - 38.5).abs() < 1e-6);
        assert!((path[0].longitude + 120.2).abs() < 1e-6);
        assert!((path[2].latitude - 43.252).abs() < 1e-6);
        assert!((path[2].longitude + 126.453).abs() < 1e-6);
    }

    #[test]
    fn bounding_box_shrinks_with_zoom() {
        let view: ViewState = MapOptions::new((47.6, -122.3).into()).into();
        let wide = view.bounding_box();
        let close = ViewState { zoom: 16, ..view }.bounding_box();
        assert!(wide.east - wide.west > close.east - close.west);
        assert!(close.contains(&view.center));
    }
}
