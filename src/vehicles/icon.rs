use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::{
    oba::{Trip, TripStatus},
    shared::geo::{CompassOctant, to_direction},
};

pub const DEFAULT_VEHICLE_COLOR: &str = "#007BFF";
/// Vehicles reporting schedule data only, no live prediction.
pub const REAL_TIME_OFF_COLOR: &str = "#9CA3AF";

/// Octant the vehicle arrow points to. Missing orientation points north.
pub fn vehicle_octant(orientation: Option<f64>) -> CompassOctant {
    match orientation {
        Some(orientation) => CompassOctant::nearest(to_direction(orientation)),
        None => CompassOctant::North,
    }
}

pub fn vehicle_color(status: &TripStatus) -> &'static str {
    if status.predicted {
        DEFAULT_VEHICLE_COLOR
    } else {
        REAL_TIME_OFF_COLOR
    }
}

/// Round bus badge with a directional arrow snapped to the nearest octant.
pub fn vehicle_icon_svg(orientation: Option<f64>, color: Option<&str>) -> String {
    let color = color.unwrap_or(DEFAULT_VEHICLE_COLOR);
    let angle = vehicle_octant(orientation).angle();
    format!(
        r##"<svg width="60" height="60" viewBox="0 0 40 50" xmlns="http://www.w3.org/2000/svg"><line x1="20" y1="20" x2="20" y2="5" stroke="{color}" stroke-width="2" transform="rotate({angle}, 20, 20)"/><polygon points="20,-5 25,5 15,5" fill="{color}" stroke="white" stroke-width="1" transform="rotate({angle}, 20, 20)"/><circle cx="20" cy="20" r="13" stroke="{color}" stroke-width="2" fill="white"/><rect x="14" y="14" width="12" height="12" rx="2" ry="2" fill="{color}"/><rect x="16" y="18" width="2" height="2" fill="white"/><rect x="22" y="18" width="2" height="2" fill="white"/><rect x="17" y="22" width="6" height="1.5" fill="white"/><circle cx="17" cy="26" r="1.5" fill="{color}"/><circle cx="23" cy="26" r="1.5" fill="{color}"/></svg>"##
    )
}

pub fn svg_data_url(svg: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(svg.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("data:image/svg+xml;charset=UTF-8,{encoded}")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePopup {
    pub next_destination: String,
    pub vehicle_id: String,
    pub last_update_time: i64,
    pub next_stop_name: Option<String>,
    pub predicted: bool,
}

impl VehiclePopup {
    pub fn new(status: &TripStatus, trip: &Trip, next_stop_name: Option<String>) -> Self {
        Self {
            next_destination: trip.trip_headsign.clone(),
            vehicle_id: status.vehicle_id.clone(),
            last_update_time: status.last_update_time,
            next_stop_name,
            predicted: status.predicted,
        }
    }
}
