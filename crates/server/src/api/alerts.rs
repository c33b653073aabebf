use std::sync::Arc;

use crate::{dto::ErrorDto, state::AppState};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{debug, error};
use wayside::{
    alerts::{decode_feed, select_alert},
    shared::build_url,
};

const NO_PARAMS: &[(&str, &str)] = &[];

async fn fetch_feed(state: &AppState) -> Result<Vec<u8>, reqwest::Error> {
    let url = build_url(&state.config.obaco_api_base_url, "alerts.pb", NO_PARAMS);
    let bytes = state
        .http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(bytes.to_vec())
}

pub async fn alerts(State(state): State<Arc<AppState>>) -> Response {
    let failed = || {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorDto::new("Failed to fetch or parse alerts")),
        )
            .into_response()
    };

    let bytes = match fetch_feed(&state).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("Failed to fetch alerts: {err}");
            return failed();
        }
    };
    let feed = match decode_feed(&bytes) {
        Ok(feed) => feed,
        Err(err) => {
            error!("{err}");
            return failed();
        }
    };

    let now = Utc::now().timestamp().max(0) as u64;
    match select_alert(&feed, now, state.alert_mode) {
        Some(alert) => Json(alert).into_response(),
        None => {
            debug!("No high severity alerts available");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
