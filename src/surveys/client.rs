use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

use super::Survey;
use crate::shared::build_url;

/// A user's answers to a survey, as posted to the survey backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub responses: Vec<Value>,
    /// Passed through untouched (user identifier, stop, location, survey id).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SurveyResponse {
    /// Body with `responses` encoded as a JSON string, as the backend expects.
    fn payload(&self, responses: &[Value]) -> Result<Value, super::Error> {
        let mut body = self.fields.clone();
        body.insert(
            "responses".into(),
            Value::String(serde_json::to_string(responses)?),
        );
        Ok(Value::Object(body))
    }
}

#[derive(Debug, Deserialize)]
struct SurveysBody {
    #[serde(default)]
    surveys: Vec<Survey>,
}

/// Talks to the survey routes of the web server.
#[derive(Debug, Clone)]
pub struct SurveyClient {
    http: reqwest::Client,
    base_url: String,
}

impl SurveyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn load_surveys(&self, user_id: Option<&str>) -> Result<Vec<Survey>, super::Error> {
        let url = build_url(
            &self.base_url,
            "api/oba/surveys",
            &[("userId", user_id.unwrap_or("null"))],
        );
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            error!("Failed to fetch surveys: {}", response.status());
            return Err(super::Error::Status(response.status()));
        }
        let body: SurveysBody = response.json().await?;
        debug!("Loaded {} surveys", body.surveys.len());
        Ok(body.surveys)
    }

    /// Posts the first answer only and returns the id of the created response.
    pub async fn submit_hero_question(
        &self,
        response: &SurveyResponse,
    ) -> Result<String, super::Error> {
        let first = response.responses.first().cloned().unwrap_or(Value::Null);
        let payload = response.payload(&[first])?;
        let body = self
            .post("api/oba/surveys/submit-survey".to_string(), &payload)
            .await?;

        match body.pointer("/survey_response/id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(super::Error::MissingResponseId),
        }
    }

    pub async fn update_survey_response(
        &self,
        public_identifier: &str,
        response: &SurveyResponse,
    ) -> Result<bool, super::Error> {
        let payload = response.payload(&response.responses)?;
        self.post(
            format!("api/oba/surveys/update-survey/{public_identifier}"),
            &payload,
        )
        .await?;
        Ok(true)
    }

    async fn post(&self, path: String, payload: &Value) -> Result<Value, super::Error> {
        let url = build_url(&self.base_url, &path, &[] as &[(&str, &str)]);
        let response = self
            .http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            error!("Survey request to {path} failed: {}", response.status());
            return Err(super::Error::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_encodes_responses_as_string() {
        let response: SurveyResponse = serde_json::from_value(json!({
            "survey_id": 4,
            "user_identifier": "u-1",
            "responses": [{"question_id": 1, "answer": "Yes"}]
        }))
        .unwrap();
        let payload = response.payload(&response.responses).unwrap();
        assert_eq!(payload["survey_id"], 4);
        assert_eq!(payload["user_identifier"], "u-1");
        assert_eq!(
            payload["responses"],
            r#"[{"answer":"Yes","question_id":1}]"#
        );
    }
}
