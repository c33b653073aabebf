mod api;
mod cookies;
mod dto;
mod state;

use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wayside::config::Config;

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/oba/trips-for-route/{route_id}", get(api::trips_for_route))
        .route("/api/oba/trip/{trip_id}", get(api::trip))
        .route("/api/oba/schedule-for-stop/{stop_id}", get(api::schedule_for_stop))
        .route("/api/oba/routes", get(api::routes))
        .route("/api/oba/surveys", get(api::surveys))
        .route("/api/oba/surveys/submit-survey", post(api::submit_survey))
        .route("/api/oba/surveys/update-survey/{id}", post(api::update_survey))
        .route("/api/oba/alerts", get(api::alerts))
        .route("/api/oba/geocode-location", get(api::geocode_location))
        .route(
            "/api/oba/google-geocode-location",
            get(api::google_geocode_location),
        )
        .route(
            "/api/oba/google-place-autocomplete",
            get(api::google_place_autocomplete),
        )
        .layer(middleware::from_fn(cookies::ensure_user_id))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting server...");
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };
    let port = config.port;
    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };

    let preload = state.clone();
    tokio::spawn(async move {
        preload.routes.preload(&preload.oba).await;
    });

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind port {port}: {err}");
            std::process::exit(1);
        }
    };
    info!("Listening to port {port}");
    if let Err(err) = axum::serve(listener, router(state)).await {
        error!("Server stopped: {err}");
    }
}
