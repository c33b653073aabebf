mod common;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use wayside::surveys::{self, SurveyClient, SurveyResponse};

fn backend() -> Router {
    Router::new()
        .route(
            "/api/oba/surveys",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("userId").map(String::as_str) {
                    Some("broken") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                    _ => Json(json!({"surveys": [
                        {"id": 1, "name": "Rider survey", "show_on_map": true},
                        {"id": 2, "show_on_stops": true, "visible_stop_list": ["1_575"]}
                    ]}))
                    .into_response(),
                }
            }),
        )
        .route(
            "/api/oba/surveys/submit-survey",
            post(|body: Bytes| async move {
                let sent: Value = serde_json::from_slice(&body).unwrap();
                let responses: Value =
                    serde_json::from_str(sent["responses"].as_str().unwrap()).unwrap();
                Json(json!({"survey_response": {"id": 77, "count": responses.as_array().unwrap().len()}}))
            }),
        )
        .route(
            "/api/oba/surveys/update-survey/{id}",
            post(|Path(id): Path<String>| async move {
                if id == "missing" {
                    StatusCode::NOT_FOUND.into_response()
                } else {
                    Json(json!({"survey_response": {"id": id}})).into_response()
                }
            }),
        )
}

fn response() -> SurveyResponse {
    serde_json::from_value(json!({
        "survey_id": 1,
        "user_identifier": "u-1",
        "responses": [
            {"question_id": 1, "answer": "Yes"},
            {"question_id": 2, "answer": "Weekly"}
        ]
    }))
    .unwrap()
}

#[tokio::test]
async fn load_surveys_test() {
    let client = SurveyClient::new(common::serve(backend()).await);
    let surveys = client.load_surveys(Some("u-1")).await.unwrap();
    assert_eq!(surveys.len(), 2);
    assert!(surveys[0].show_on_map);
    assert_eq!(
        surveys[1].visible_stop_list.as_deref(),
        Some(&["1_575".to_string()][..])
    );

    let err = client.load_surveys(Some("broken")).await.unwrap_err();
    assert!(matches!(err, surveys::Error::Status(status) if status.as_u16() == 500));
}

#[tokio::test]
async fn submit_hero_question_sends_first_answer_test() {
    let client = SurveyClient::new(common::serve(backend()).await);
    let id = client.submit_hero_question(&response()).await.unwrap();
    assert_eq!(id, "77");
}

#[tokio::test]
async fn update_survey_response_test() {
    let client = SurveyClient::new(common::serve(backend()).await);
    assert!(client.update_survey_response("abc", &response()).await.unwrap());
    assert!(client.update_survey_response("missing", &response()).await.is_err());
}
