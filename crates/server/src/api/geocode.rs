use std::{collections::HashMap, sync::Arc};

use crate::{
    dto::{LocationDto, SuggestionsDto},
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;
use wayside::geocoder::{self, GeocoderProvider};

fn query(params: &HashMap<String, String>) -> Result<&str, StatusCode> {
    params
        .get("query")
        .map(|query| query.trim())
        .filter(|query| !query.is_empty())
        .ok_or(StatusCode::BAD_REQUEST)
}

fn failed(err: geocoder::Error) -> StatusCode {
    error!("Geocoding failed: {err}");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Geocodes with whichever provider is configured.
pub async fn geocode_location(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let location = state
        .geocoder
        .geocode(query(&params)?)
        .await
        .map_err(failed)?;
    Ok(Json(LocationDto { location }).into_response())
}

pub async fn google_geocode_location(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let query = query(&params)?;
    let location = match state.geocoder.provider() {
        GeocoderProvider::Google => state.geocoder.google_geocode(query).await.map_err(failed)?,
        GeocoderProvider::Bing => None,
    };
    Ok(Json(LocationDto { location }).into_response())
}

pub async fn google_place_autocomplete(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let query = query(&params)?;
    let suggestions = match state.geocoder.provider() {
        GeocoderProvider::Google => state
            .geocoder
            .google_places_autocomplete(query)
            .await
            .map_err(failed)?,
        GeocoderProvider::Bing => Vec::new(),
    };
    Ok(Json(SuggestionsDto { suggestions }).into_response())
}
