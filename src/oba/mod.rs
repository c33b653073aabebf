mod models;
mod routes_cache;

pub use models::*;
pub use routes_cache::*;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::shared::build_url;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Request failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Unable to fetch {0}.")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy)]
pub struct TripsForRouteParams {
    pub include_status: bool,
    pub include_schedule: bool,
}

impl Default for TripsForRouteParams {
    fn default() -> Self {
        Self {
            include_status: true,
            include_schedule: true,
        }
    }
}

/// Thin client over the OneBusAway `where` REST API.
#[derive(Debug, Clone)]
pub struct ObaClient {
    http: reqwest::Client,
    server_url: String,
    api_key: String,
}

impl ObaClient {
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), server_url, api_key)
    }

    pub fn with_client(
        http: reqwest::Client,
        server_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            server_url: server_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn trips_for_route(
        &self,
        route_id: &str,
        params: TripsForRouteParams,
    ) -> Result<TripsForRoute, self::Error> {
        let value = self.trips_for_route_raw(route_id, params).await?;
        data_of(value, "trips-for-route")
    }

    pub async fn trips_for_route_raw(
        &self,
        route_id: &str,
        params: TripsForRouteParams,
    ) -> Result<Value, self::Error> {
        let query = [
            ("includeStatus", params.include_status.to_string()),
            ("includeSchedule", params.include_schedule.to_string()),
        ];
        let value = self
            .get_raw(&format!("trips-for-route/{}", segment(route_id)), &query)
            .await?;
        handle_response(value, "trips-for-route")
    }

    pub async fn trip(&self, trip_id: &str) -> Result<EntryData<Trip>, self::Error> {
        let value = self.trip_raw(trip_id).await?;
        data_of(value, "trip")
    }

    pub async fn trip_raw(&self, trip_id: &str) -> Result<Value, self::Error> {
        let value = self
            .get_raw(&format!("trip/{}", segment(trip_id)), &[])
            .await?;
        handle_response(value, "trip")
    }

    /// `date` is passed through as given (`YYYY-MM-DD`).
    pub async fn schedule_for_stop_raw(
        &self,
        stop_id: &str,
        date: Option<&str>,
    ) -> Result<Value, self::Error> {
        let mut query = Vec::new();
        if let Some(date) = date {
            query.push(("date", date.to_string()));
        }
        let value = self
            .get_raw(&format!("schedule-for-stop/{}", segment(stop_id)), &query)
            .await?;
        handle_response(value, "stop-for-schedule")
    }

    pub async fn agencies_with_coverage(
        &self,
    ) -> Result<ListData<AgencyWithCoverage>, self::Error> {
        let value = self.get_raw("agencies-with-coverage", &[]).await?;
        data_of(handle_response(value, "agencies-with-coverage")?, "agencies-with-coverage")
    }

    pub async fn routes_for_agency(&self, agency_id: &str) -> Result<ListData<Route>, self::Error> {
        let value = self
            .get_raw(&format!("routes-for-agency/{}", segment(agency_id)), &[])
            .await?;
        data_of(handle_response(value, "routes-for-agency")?, "routes-for-agency")
    }

    async fn get_raw(&self, path: &str, params: &[(&str, String)]) -> Result<Value, self::Error> {
        let mut query: Vec<(&str, &str)> = vec![("key", self.api_key.as_str())];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        let url = build_url(&self.server_url, &format!("api/where/{path}.json"), &query);
        debug!("GET {}", path);

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            warn!("OBA {} responded with {}", path, response.status());
            return Err(self::Error::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

/// Passes a raw OBA body through when its envelope code is 200.
pub fn handle_response(value: Value, name: &str) -> Result<Value, self::Error> {
    match value.get("code").and_then(Value::as_u64) {
        Some(200) => Ok(value),
        code => {
            warn!("OBA {} returned code {:?}", name, code);
            Err(self::Error::Unavailable(name.to_string()))
        }
    }
}

fn data_of<T>(value: Value, name: &str) -> Result<T, self::Error>
where
    T: DeserializeOwned + Default,
{
    let envelope: Envelope<T> = serde_json::from_value(value)?;
    envelope
        .data
        .ok_or_else(|| self::Error::Unavailable(name.to_string()))
}

fn segment(id: &str) -> String {
    form_urlencoded::byte_serialize(id.as_bytes()).collect()
}
