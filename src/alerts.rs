//! Service alerts, from the GTFS-Realtime feed and from OBA situations.

use gtfs_realtime::{Alert, FeedMessage, alert::SeverityLevel};
use prost::Message;
use thiserror::Error;
use tracing::debug;

use crate::{oba::Situation, shared::normalize_timestamp};

const ALERT_WINDOW_SECS: u64 = 24 * 60 * 60;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to decode alert feed: {0}")]
    Decode(#[from] prost::DecodeError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlertMode {
    #[default]
    Live,
    /// Any alert qualifies.
    Test,
}

pub fn decode_feed(bytes: &[u8]) -> Result<FeedMessage, self::Error> {
    Ok(FeedMessage::decode(bytes)?)
}

fn is_agency_wide(alert: &Alert) -> bool {
    !alert.informed_entity.is_empty()
}

fn is_high_severity(alert: &Alert) -> bool {
    alert.severity_level.is_some_and(|level| {
        level == SeverityLevel::Severe as i32 || level == SeverityLevel::Warning as i32
    })
}

/// The first active period started no more than a day ago.
fn started_within_a_day(alert: &Alert, now_secs: u64) -> bool {
    let Some(start) = alert.active_period.first().and_then(|period| period.start) else {
        return false;
    };
    start <= now_secs && start >= now_secs.saturating_sub(ALERT_WINDOW_SECS)
}

/// First alert worth a banner: agency wide, severe or a warning, and fresh.
pub fn select_alert(feed: &FeedMessage, now_secs: u64, mode: AlertMode) -> Option<&Alert> {
    let mut alerts = feed.entity.iter().filter_map(|entity| entity.alert.as_ref());
    match mode {
        AlertMode::Test => alerts.next(),
        AlertMode::Live => alerts.find(|alert| {
            is_agency_wide(alert) && started_within_a_day(alert, now_secs) && is_high_severity(alert)
        }),
    }
}

/// Situations with any active window enclosing `now_ms`. A window without an
/// end never closes.
pub fn filter_active_alerts(situations: &[Situation], now_ms: i64) -> Vec<&Situation> {
    let active: Vec<&Situation> = situations
        .iter()
        .filter(|situation| {
            situation.active_windows.iter().any(|window| {
                let from = normalize_timestamp(window.from, now_ms);
                let to = match window.to {
                    0 => i64::MAX,
                    to => normalize_timestamp(to, now_ms),
                };
                now_ms >= from && now_ms <= to
            })
        })
        .collect();
    debug!("{} of {} situations active", active.len(), situations.len());
    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oba::TimeWindow;
    use gtfs_realtime::{EntitySelector, FeedEntity, FeedHeader, TimeRange};

    const NOW: u64 = 1_740_312_000;

    fn alert(severity: SeverityLevel, start: u64, agency_wide: bool) -> Alert {
        Alert {
            severity_level: Some(severity as i32),
            active_period: vec![TimeRange {
                start: Some(start),
                end: None,
            }],
            informed_entity: if agency_wide {
                vec![EntitySelector {
                    agency_id: Some("1".into()),
                    ..Default::default()
                }]
            } else {
                vec![]
            },
            ..Default::default()
        }
    }

    fn feed(alerts: Vec<Alert>) -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".into(),
                ..Default::default()
            },
            entity: alerts
                .into_iter()
                .enumerate()
                .map(|(i, alert)| FeedEntity {
                    id: i.to_string(),
                    alert: Some(alert),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn selects_first_fresh_severe_agency_alert() {
        let feed = feed(vec![
            alert(SeverityLevel::Info, NOW - 60, true),
            alert(SeverityLevel::Severe, NOW - 60, false),
            alert(SeverityLevel::Severe, NOW - ALERT_WINDOW_SECS - 1, true),
            alert(SeverityLevel::Warning, NOW - 3600, true),
        ]);
        let selected = select_alert(&feed, NOW, AlertMode::Live).unwrap();
        assert_eq!(selected.severity_level, Some(SeverityLevel::Warning as i32));
    }

    #[test]
    fn future_alerts_do_not_qualify() {
        let feed = feed(vec![alert(SeverityLevel::Severe, NOW + 60, true)]);
        assert!(select_alert(&feed, NOW, AlertMode::Live).is_none());
    }

    #[test]
    fn test_mode_takes_any_alert() {
        let feed = feed(vec![alert(SeverityLevel::Info, 0, false)]);
        assert!(select_alert(&feed, NOW, AlertMode::Live).is_none());
        assert!(select_alert(&feed, NOW, AlertMode::Test).is_some());
    }

    #[test]
    fn decodes_encoded_feed() {
        let encoded = feed(vec![alert(SeverityLevel::Severe, NOW, true)]).encode_to_vec();
        let decoded = decode_feed(&encoded).unwrap();
        assert_eq!(decoded.entity.len(), 1);
        assert!(decode_feed(b"\xff\xff\xff").is_err());
    }

    fn situation(windows: &[(i64, i64)]) -> Situation {
        Situation {
            active_windows: windows
                .iter()
                .map(|&(from, to)| TimeWindow { from, to })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn active_windows_in_ms_or_seconds() {
        let now = 1_740_312_000_000;
        let situations = [
            situation(&[(now - 1000, now + 1000)]),
            situation(&[(now / 1000 - 1, now / 1000 + 1)]),
            situation(&[(now + 1000, now + 2000)]),
            situation(&[(now + 1000, now + 2000), (now - 5000, now + 5000)]),
            situation(&[(now - 1000, 0)]),
            situation(&[]),
        ];
        assert_eq!(filter_active_alerts(&situations, now).len(), 4);
    }
}
