use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::geo::Coordinate;

/// Every OBA `where` response is wrapped in this envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Envelope<T> {
    pub code: u16,
    pub current_time: i64,
    pub text: String,
    pub version: u32,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListData<T> {
    pub list: Vec<T>,
    pub references: References,
    pub limit_exceeded: bool,
    pub out_of_range: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntryData<T> {
    pub entry: T,
    pub references: References,
}

/// Payload of `trips-for-route`: trip details in `list`, static trip
/// definitions in `references.trips`.
pub type TripsForRoute = ListData<TripDetails>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct References {
    pub agencies: Vec<Agency>,
    pub routes: Vec<Route>,
    pub stops: Vec<Stop>,
    pub trips: Vec<Trip>,
    pub situations: Vec<Situation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Agency {
    pub id: String,
    pub name: String,
    pub url: String,
    pub timezone: String,
    pub lang: String,
    pub phone: String,
    pub email: String,
    pub fare_url: String,
    pub disclaimer: String,
    pub private_service: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgencyWithCoverage {
    pub agency_id: String,
    pub lat: f64,
    pub lon: f64,
    pub lat_span: f64,
    pub lon_span: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub agency_id: String,
    pub short_name: String,
    pub long_name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub route_type: i32,
    pub url: String,
    pub color: String,
    pub text_color: String,
    pub null_safe_short_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub code: String,
    pub lat: f64,
    pub lon: f64,
    pub direction: String,
    pub location_type: i32,
    pub route_ids: Vec<String>,
    pub wheelchair_boarding: String,
}

impl Stop {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.lat,
            longitude: self.lon,
        }
    }
}

/// Static trip definition, found in `references.trips`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub trip_headsign: String,
    pub trip_short_name: String,
    pub service_id: String,
    pub shape_id: String,
    pub direction_id: String,
    pub block_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TripDetails {
    pub trip_id: String,
    pub service_date: i64,
    pub frequency: Option<Value>,
    pub status: Option<TripStatus>,
    pub schedule: Option<Value>,
    pub situation_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl From<Position> for Coordinate {
    fn from(value: Position) -> Self {
        Coordinate {
            latitude: value.lat,
            longitude: value.lon,
        }
    }
}

pub const STATUS_CANCELED: &str = "CANCELED";

/// Real time snapshot of a vehicle serving a trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TripStatus {
    pub active_trip_id: Option<String>,
    pub vehicle_id: String,
    pub position: Option<Position>,
    pub last_known_location: Option<Position>,
    pub orientation: Option<f64>,
    pub predicted: bool,
    pub next_stop: Option<String>,
    pub closest_stop: Option<String>,
    pub last_update_time: i64,
    pub phase: String,
    pub status: String,
    pub schedule_deviation: i64,
    pub service_date: i64,
}

impl TripStatus {
    pub fn is_canceled(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_CANCELED)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWindow {
    pub from: i64,
    pub to: i64,
}

/// Service alert as referenced by OBA responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Situation {
    pub id: String,
    pub creation_time: i64,
    pub active_windows: Vec<TimeWindow>,
    pub reason: String,
    pub severity: String,
    pub summary: Option<Value>,
    pub description: Option<Value>,
    pub url: Option<Value>,
}
