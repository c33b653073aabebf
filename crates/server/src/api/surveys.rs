use std::{collections::HashMap, sync::Arc};

use crate::{dto::ErrorDto, state::AppState};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::error;
use wayside::shared::build_url;

const NO_PARAMS: &[(&str, &str)] = &[];

fn failure(message: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorDto::new(message))).into_response()
}

async fn read_json(response: reqwest::Response) -> Result<Value, String> {
    if !response.status().is_success() {
        return Err(format!("Upstream responded with {}", response.status()));
    }
    response.json().await.map_err(|err| err.to_string())
}

pub async fn surveys(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let user_id = params.get("userId").map(String::as_str).unwrap_or("null");
    let url = build_url(
        &state.config.obaco_api_base_url,
        &format!("regions/{}/surveys.json", state.config.region_id),
        &[("user_id", user_id)],
    );

    let result = match state.http.get(url).send().await {
        Ok(response) => read_json(response).await,
        Err(err) => Err(err.to_string()),
    };
    match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            error!("Error loading surveys: {err}");
            failure("Failed to load surveys")
        }
    }
}

async fn forward(state: &AppState, path: &str, body: String) -> Result<Value, String> {
    let url = build_url(&state.config.obaco_api_base_url, path, NO_PARAMS);
    let response = state
        .http
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|err| err.to_string())?;
    read_json(response).await
}

pub async fn submit_survey(State(state): State<Arc<AppState>>, body: String) -> Response {
    match forward(&state, "survey_responses.json", body).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            error!("Error submitting survey response: {err}");
            failure("Failed to submit survey response")
        }
    }
}

pub async fn update_survey(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    body: String,
) -> Response {
    match forward(&state, &format!("survey_responses/{id}"), body).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            error!("Error updating survey response: {err}");
            failure("Failed to update survey response")
        }
    }
}
