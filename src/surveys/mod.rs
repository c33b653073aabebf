//! Survey eligibility.
//!
//! Given the survey catalog and what the user is looking at, [`SurveyEngine`]
//! picks at most one survey to present and records answers and skips in a
//! [`SurveyStorage`].

mod client;
mod storage;

pub use client::*;
pub use storage::*;

use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::oba::Stop;

/// How long a skipped always-visible, multiple-response survey stays hidden.
pub const SKIP_COOLDOWN: TimeDelta = TimeDelta::days(7);
pub const HIDE_MODAL_DELAY: Duration = Duration::from_secs(3);

#[derive(Error, Debug)]
pub enum Error {
    #[error("Http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Survey request failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Survey response id missing from reply")]
    MissingResponseId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Survey {
    pub id: u64,
    pub name: String,
    pub show_on_map: bool,
    pub show_on_stops: bool,
    pub always_visible: bool,
    pub allows_multiple_responses: bool,
    pub end_date: Option<String>,
    pub visible_stop_list: Option<Vec<String>>,
    pub visible_route_list: Option<Vec<String>>,
    pub questions: Vec<Value>,
}

impl Survey {
    /// `None` when the survey never ends. Unparsable dates count as already
    /// passed.
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.end_date.as_deref()?;
        let parsed = DateTime::parse_from_rfc3339(raw)
            .map(|date| date.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|date| date.and_utc())
            });
        Some(parsed.unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    /// Whether skipping starts a cooldown instead of hiding it for good.
    pub fn has_skip_cooldown(&self) -> bool {
        self.always_visible && self.allows_multiple_responses
    }

    fn on_stop_lists(&self, stop: &Stop) -> bool {
        let on_stop_list = self
            .visible_stop_list
            .as_ref()
            .is_some_and(|stops| stops.contains(&stop.id));
        let on_route_list = self
            .visible_route_list
            .as_ref()
            .is_some_and(|routes| routes.iter().any(|route| stop.route_ids.contains(route)));
        on_stop_list || on_route_list
    }
}

/// What the user is looking at.
#[derive(Debug, Clone, Copy)]
pub enum ViewContext<'a> {
    Map,
    Stop(&'a Stop),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyOutcome {
    KeepModal,
    HideModal,
    HideModalAfter(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveySelection<'a> {
    pub survey: &'a Survey,
    pub show_modal: bool,
}

fn answered_key(survey: &Survey) -> String {
    format!("survey_{}_answered", survey.id)
}

fn skipped_key(survey: &Survey) -> String {
    format!("survey_{}_skipped", survey.id)
}

fn skipped_timestamp_key(survey: &Survey) -> String {
    format!("survey_{}_skipped_timestamp", survey.id)
}

#[derive(Debug, Clone)]
pub struct SurveyEngine<S> {
    storage: S,
    now: Option<DateTime<Utc>>,
}

impl<S: SurveyStorage> SurveyEngine<S> {
    pub fn new(storage: S) -> Self {
        Self { storage, now: None }
    }

    /// Pins the clock, otherwise the system time is used.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    pub fn is_answered(&self, survey: &Survey) -> bool {
        self.storage.get(&answered_key(survey)).is_some()
    }

    pub fn is_skipped(&self, survey: &Survey) -> bool {
        self.storage.get(&skipped_key(survey)).is_some()
    }

    pub fn recently_skipped(&self, survey: &Survey) -> bool {
        let Some(skipped_at) = self
            .storage
            .get(&skipped_timestamp_key(survey))
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
        else {
            return false;
        };
        self.now() - skipped_at < SKIP_COOLDOWN
    }

    /// Surveys that may still be presented, in catalog order.
    pub fn valid_surveys<'a>(&self, surveys: &'a [Survey]) -> Vec<&'a Survey> {
        let now = self.now();
        surveys
            .iter()
            .filter(|survey| survey.end_date().is_none_or(|end| end > now))
            .filter(|survey| {
                if survey.has_skip_cooldown() {
                    !self.recently_skipped(survey)
                } else {
                    !self.is_answered(survey) && !self.is_skipped(survey)
                }
            })
            .collect()
    }

    /// First survey listing the stop itself, else the first listing one of
    /// its routes.
    pub fn valid_stop_survey<'a>(&self, surveys: &[&'a Survey], stop: &Stop) -> Option<&'a Survey> {
        let on_stops = || surveys.iter().copied().filter(|survey| survey.show_on_stops);
        on_stops()
            .find(|survey| {
                survey
                    .visible_stop_list
                    .as_ref()
                    .is_some_and(|stops| stops.contains(&stop.id))
            })
            .or_else(|| on_stops().find(|survey| survey.on_stop_lists(stop)))
    }

    pub fn show_survey_on_all_stops<'a>(&self, surveys: &[&'a Survey]) -> Option<&'a Survey> {
        surveys
            .iter()
            .copied()
            .find(|survey| survey.show_on_stops && survey.visible_stop_list.is_none())
    }

    pub fn map_survey<'a>(&self, surveys: &[&'a Survey]) -> Option<&'a Survey> {
        surveys.iter().copied().find(|survey| survey.show_on_map)
    }

    /// Any valid one-time survey beats the selected one, which beats any
    /// always-visible survey.
    pub fn priority_survey<'a>(
        &self,
        valid: &[&'a Survey],
        selected: Option<&'a Survey>,
    ) -> Option<&'a Survey> {
        valid
            .iter()
            .copied()
            .find(|survey| !survey.always_visible)
            .or(selected)
            .or_else(|| valid.iter().copied().find(|survey| survey.always_visible))
    }

    pub fn should_show_survey(&self, survey: &Survey) -> bool {
        if !survey.always_visible {
            return true;
        }
        !self.is_answered(survey) && !self.is_skipped(survey)
    }

    /// Picks the survey to present for `context`, if any.
    pub fn select_survey<'a>(
        &self,
        surveys: &'a [Survey],
        context: ViewContext<'_>,
    ) -> Option<SurveySelection<'a>> {
        let valid = self.valid_surveys(surveys);
        let selected = match context {
            ViewContext::Stop(stop) => self
                .valid_stop_survey(&valid, stop)
                .or_else(|| self.show_survey_on_all_stops(&valid)),
            ViewContext::Map => self.map_survey(&valid),
        };

        let survey = self.priority_survey(&valid, selected)?;
        debug!("Selected survey {}", survey.id);
        Some(SurveySelection {
            survey,
            show_modal: survey.show_on_map && self.should_show_survey(survey),
        })
    }

    pub fn submit_survey(
        &mut self,
        survey: &Survey,
        hide_modal: bool,
    ) -> Result<SurveyOutcome, self::Error> {
        self.storage.set(&answered_key(survey), "true")?;
        Ok(if hide_modal {
            SurveyOutcome::HideModalAfter(HIDE_MODAL_DELAY)
        } else {
            SurveyOutcome::KeepModal
        })
    }

    pub fn skip_survey(&mut self, survey: &Survey) -> Result<SurveyOutcome, self::Error> {
        self.storage.set(&skipped_key(survey), "true")?;
        if survey.has_skip_cooldown() {
            let now = self.now().timestamp_millis().to_string();
            self.storage.set(&skipped_timestamp_key(survey), &now)?;
        }
        Ok(SurveyOutcome::HideModal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn engine() -> SurveyEngine<MemoryStorage> {
        SurveyEngine::new(MemoryStorage::new()).at(now())
    }

    fn survey(id: u64) -> Survey {
        Survey {
            id,
            ..Default::default()
        }
    }

    fn ids(surveys: &[&Survey]) -> Vec<u64> {
        surveys.iter().map(|s| s.id).collect()
    }

    #[test]
    fn drops_ended_surveys() {
        let surveys = [
            Survey {
                end_date: Some("2025-03-02T00:00:00Z".into()),
                ..survey(1)
            },
            Survey {
                end_date: Some("2025-02-28T00:00:00Z".into()),
                ..survey(2)
            },
            survey(3),
            Survey {
                end_date: Some("not a date".into()),
                ..survey(4)
            },
            Survey {
                end_date: Some("2024-01-01T00:00:00Z".into()),
                always_visible: true,
                allows_multiple_responses: true,
                ..survey(5)
            },
        ];
        assert_eq!(ids(&engine().valid_surveys(&surveys)), vec![1, 3]);
    }

    #[test]
    fn answered_and_skipped_one_time_surveys_are_hidden() {
        let surveys = [survey(1), survey(2), survey(3)];
        let mut engine = engine();
        engine.submit_survey(&surveys[0], false).unwrap();
        engine.skip_survey(&surveys[1]).unwrap();
        assert_eq!(ids(&engine.valid_surveys(&surveys)), vec![3]);
    }

    #[test]
    fn multi_response_survey_survives_answer_but_not_recent_skip() {
        let repeat = Survey {
            always_visible: true,
            allows_multiple_responses: true,
            ..survey(1)
        };
        let mut engine = engine();
        engine.submit_survey(&repeat, true).unwrap();
        assert_eq!(engine.valid_surveys(std::slice::from_ref(&repeat)).len(), 1);

        engine.skip_survey(&repeat).unwrap();
        assert!(engine.recently_skipped(&repeat));
        assert!(engine.valid_surveys(std::slice::from_ref(&repeat)).is_empty());

        let later = engine.at(now() + TimeDelta::days(8));
        assert!(!later.recently_skipped(&repeat));
        assert_eq!(later.valid_surveys(std::slice::from_ref(&repeat)).len(), 1);
    }

    #[test]
    fn single_response_always_visible_survey_hides_once_answered() {
        let survey = Survey {
            always_visible: true,
            ..survey(1)
        };
        let mut engine = engine();
        assert!(engine.should_show_survey(&survey));
        engine.submit_survey(&survey, false).unwrap();
        assert!(engine.valid_surveys(std::slice::from_ref(&survey)).is_empty());
        assert!(!engine.should_show_survey(&survey));
    }

    #[test]
    fn skip_timestamp_only_for_cooldown_surveys() {
        let one_time = survey(1);
        let mut engine = engine();
        engine.skip_survey(&one_time).unwrap();
        assert!(engine.storage().get("survey_1_skipped").is_some());
        assert!(engine.storage().get("survey_1_skipped_timestamp").is_none());

        let repeat = Survey {
            always_visible: true,
            allows_multiple_responses: true,
            ..survey(2)
        };
        assert_eq!(engine.skip_survey(&repeat).unwrap(), SurveyOutcome::HideModal);
        assert_eq!(
            engine.storage().get("survey_2_skipped_timestamp"),
            Some(now().timestamp_millis().to_string())
        );
    }

    #[test]
    fn submit_defers_hiding_the_modal() {
        let mut engine = engine();
        assert_eq!(
            engine.submit_survey(&survey(1), true).unwrap(),
            SurveyOutcome::HideModalAfter(Duration::from_secs(3))
        );
        assert_eq!(
            engine.submit_survey(&survey(2), false).unwrap(),
            SurveyOutcome::KeepModal
        );
    }

    #[test]
    fn stop_survey_prefers_stop_list_over_route_list() {
        let surveys = [
            survey(1),
            Survey {
                show_on_stops: true,
                visible_route_list: Some(vec!["r2".into()]),
                ..survey(2)
            },
            Survey {
                show_on_stops: true,
                visible_stop_list: Some(vec!["stop1".into()]),
                ..survey(3)
            },
        ];
        let stop = Stop {
            id: "stop1".into(),
            route_ids: vec!["r2".into()],
            ..Default::default()
        };
        let engine = engine();
        let valid = engine.valid_surveys(&surveys);
        assert_eq!(engine.valid_stop_survey(&valid, &stop).unwrap().id, 3);

        let elsewhere = Stop {
            id: "stop9".into(),
            ..stop
        };
        assert_eq!(engine.valid_stop_survey(&valid, &elsewhere).unwrap().id, 2);
        let unrelated = Stop {
            id: "stop9".into(),
            ..Default::default()
        };
        assert!(engine.valid_stop_survey(&valid, &unrelated).is_none());
    }

    #[test]
    fn all_stops_and_map_surveys() {
        let surveys = [
            Survey {
                show_on_stops: true,
                visible_stop_list: Some(vec!["stop1".into()]),
                ..survey(1)
            },
            Survey {
                show_on_stops: true,
                ..survey(2)
            },
            Survey {
                show_on_map: true,
                ..survey(3)
            },
        ];
        let engine = engine();
        let valid = engine.valid_surveys(&surveys);
        assert_eq!(engine.show_survey_on_all_stops(&valid).unwrap().id, 2);
        assert_eq!(engine.map_survey(&valid).unwrap().id, 3);
    }

    #[test]
    fn one_time_survey_beats_always_visible() {
        let always = Survey {
            always_visible: true,
            show_on_map: true,
            ..survey(1)
        };
        let once = Survey {
            show_on_map: true,
            ..survey(2)
        };
        let engine = engine();
        let valid = [&always, &once];
        assert_eq!(
            engine.priority_survey(&valid, Some(&always)).unwrap().id,
            2
        );
        assert_eq!(engine.priority_survey(&[&always], None).unwrap().id, 1);
        assert!(engine.priority_survey(&[], None).is_none());

        let surveys = [always.clone(), once.clone()];
        let selection = engine.select_survey(&surveys, ViewContext::Map).unwrap();
        assert_eq!(selection.survey.id, 2);
        assert!(selection.show_modal);
    }

    #[test]
    fn one_time_survey_preempts_outside_its_view() {
        let surveys = [
            Survey {
                always_visible: true,
                show_on_map: true,
                ..survey(1)
            },
            Survey {
                show_on_stops: true,
                ..survey(2)
            },
        ];
        let selection = engine().select_survey(&surveys, ViewContext::Map).unwrap();
        assert_eq!(selection.survey.id, 2);
        assert!(!selection.show_modal);

        let mut engine = engine();
        engine.submit_survey(&surveys[1], true).unwrap();
        let selection = engine.select_survey(&surveys, ViewContext::Map).unwrap();
        assert_eq!(selection.survey.id, 1);
    }

    #[test]
    fn stop_view_does_not_open_the_modal_for_stop_only_surveys() {
        let surveys = [Survey {
            show_on_stops: true,
            ..survey(7)
        }];
        let stop = Stop {
            id: "stop1".into(),
            ..Default::default()
        };
        let selection = engine()
            .select_survey(&surveys, ViewContext::Stop(&stop))
            .unwrap();
        assert_eq!(selection.survey.id, 7);
        assert!(!selection.show_modal);
        assert!(engine().select_survey(&[], ViewContext::Map).is_none());
    }
}
