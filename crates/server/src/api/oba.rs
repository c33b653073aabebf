use std::{collections::HashMap, sync::Arc};

use crate::{
    dto::{ErrorDto, RoutesDto},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;
use wayside::oba::{self, TripsForRouteParams};

fn flag(params: &HashMap<String, String>, key: &str) -> bool {
    params.get(key).is_none_or(|value| value != "false")
}

fn unavailable(err: oba::Error) -> StatusCode {
    error!("OBA request failed: {err}");
    StatusCode::INTERNAL_SERVER_ERROR
}

pub async fn trips_for_route(
    Path(route_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let params = TripsForRouteParams {
        include_status: flag(&params, "includeStatus"),
        include_schedule: flag(&params, "includeSchedule"),
    };
    let body = state
        .oba
        .trips_for_route_raw(&route_id, params)
        .await
        .map_err(unavailable)?;
    Ok(Json(body).into_response())
}

pub async fn trip(
    Path(trip_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let body = state.oba.trip_raw(&trip_id).await.map_err(unavailable)?;
    Ok(Json(body).into_response())
}

pub async fn schedule_for_stop(
    Path(stop_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let date = params.get("date").map(String::as_str).filter(|d| !d.is_empty());
    let body = state
        .oba
        .schedule_for_stop_raw(&stop_id, date)
        .await
        .map_err(unavailable)?;
    Ok(Json(body).into_response())
}

pub async fn routes(State(state): State<Arc<AppState>>) -> Response {
    match state.routes.preload(&state.oba).await {
        Some(routes) => Json(RoutesDto { routes }).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorDto::new("Routes data not available")),
        )
            .into_response(),
    }
}
