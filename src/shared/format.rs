use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Expands a compass abbreviation ("NE") to its full name. Anything else is
/// returned untouched.
pub fn compass_direction(abbreviation: &str) -> &str {
    match abbreviation {
        "N" => "North",
        "NE" => "Northeast",
        "E" => "East",
        "SE" => "Southeast",
        "S" => "South",
        "SW" => "Southwest",
        "W" => "West",
        "NW" => "Northwest",
        other => other,
    }
}

/// Unit labels used by [`format_last_updated`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translations {
    pub min: String,
    pub sec: String,
    pub ago: String,
}

impl Default for Translations {
    fn default() -> Self {
        Self {
            min: "min".into(),
            sec: "sec".into(),
            ago: "ago".into(),
        }
    }
}

/// "2 min 5 sec ago" style label. Timestamps ahead of `now_ms` count as zero.
pub fn format_last_updated(timestamp_ms: i64, now_ms: i64, translations: &Translations) -> String {
    let seconds_ago = ((now_ms - timestamp_ms).max(0)) / 1000;
    let minutes = seconds_ago / 60;
    let seconds = seconds_ago % 60;
    if minutes > 0 {
        format!(
            "{minutes} {} {seconds} {} {}",
            translations.min, translations.sec, translations.ago
        )
    } else {
        format!("{seconds} {} {}", translations.sec, translations.ago)
    }
}

/// 12 hour clock, e.g. "3:07 PM".
pub fn format_time<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.format("%-I:%M %p").to_string()
}

/// Unix seconds to a UTC "HH:MM" label. Zero means "no time" and yields an
/// empty string.
pub fn convert_unix_to_time(seconds: i64) -> String {
    if seconds == 0 {
        return String::new();
    }
    match Utc.timestamp_opt(seconds, 0).single() {
        Some(time) => time.format("%H:%M").to_string(),
        None => String::new(),
    }
}
