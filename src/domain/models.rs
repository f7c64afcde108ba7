use crate::infrastructure::error::AppError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Cognitive-load tag attached to a session. Descriptive only; never drives
/// scheduling decisions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    HighCognitive,
    MediumCognitive,
    LowCognitive,
    Learning,
    #[default]
    Custom,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::HighCognitive => "high_cognitive",
            Classification::MediumCognitive => "medium_cognitive",
            Classification::LowCognitive => "low_cognitive",
            Classification::Learning => "learning",
            Classification::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Classification> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high_cognitive" => Some(Classification::HighCognitive),
            "medium_cognitive" => Some(Classification::MediumCognitive),
            "low_cognitive" => Some(Classification::LowCognitive),
            "learning" => Some(Classification::Learning),
            "custom" => Some(Classification::Custom),
            _ => None,
        }
    }
}

/// Canonical in-memory representation of a calendar event. Constructed by the
/// schedule builder, read-only afterward, handed by value to the reconciler.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventRecord {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub description: String,
    pub classification: Classification,
    pub location: Option<String>,
}

impl EventRecord {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_non_empty(&self.title, "event.title")?;
        if self.end <= self.start {
            return Err(AppError::InvalidSession(format!(
                "event '{}' must end after it starts",
                self.title
            )));
        }
        Ok(())
    }

    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }
}

/// The Sunday..Thursday date range treated as the current schedule for
/// delete/recreate purposes.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct WeekWindow {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

impl WeekWindow {
    const HORIZON_DAYS: i64 = 4;

    /// Window anchored on the most recently elapsed Sunday. When `today` is a
    /// Sunday, the window starts today.
    pub fn for_date(today: NaiveDate) -> Self {
        let elapsed = today.weekday().num_days_from_sunday();
        let week_start = today - Duration::days(elapsed as i64);
        Self {
            week_start,
            week_end: week_start + Duration::days(Self::HORIZON_DAYS),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.week_start <= date && date <= self.week_end
    }

    /// Inclusive zoned bounds: `week_start 00:00:00` through
    /// `week_end 23:59:59` in `tz`.
    pub fn bounds(&self, tz: Tz) -> (DateTime<Tz>, DateTime<Tz>) {
        let open = self.week_start.and_time(NaiveTime::MIN);
        let close = self
            .week_end
            .and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN));
        (zoned_or_utc(tz, open), zoned_or_utc(tz, close))
    }
}

// A window edge landing in a DST gap falls back to the UTC reading of the
// same wall clock rather than failing the whole pass.
fn zoned_or_utc(tz: Tz, wall_clock: chrono::NaiveDateTime) -> DateTime<Tz> {
    tz.from_local_datetime(&wall_clock)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&wall_clock))
}

/// One day of a declarative weekly template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTemplate {
    pub offset_days: u32,
    pub theme: String,
    pub sessions: Vec<SessionTemplate>,
}

impl DayTemplate {
    pub fn validate(&self) -> Result<(), AppError> {
        for session in &self.sessions {
            session.validate()?;
        }
        Ok(())
    }
}

/// A session defined by a clock-time pair. Sessions never span midnight;
/// `end <= start` is rejected at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTemplate {
    pub title: String,
    pub start: String,
    pub end: String,
    pub description: String,
    pub classification: Classification,
    pub location: Option<String>,
}

impl SessionTemplate {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_non_empty(&self.title, "session.title")?;
        validate_hhmm(&self.start, "session.start")?;
        validate_hhmm(&self.end, "session.end")?;
        Ok(())
    }
}

fn default_duration_minutes() -> u32 {
    60
}

/// A session defined by a start clock and a duration, addressed to a concrete
/// date. This is the request-body shape of the custom scheduling path.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScheduledEntry {
    pub date: NaiveDate,
    pub start: String,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub classification: Classification,
}

impl ScheduledEntry {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_non_empty(&self.title, "entry.title")?;
        validate_hhmm(&self.start, "entry.start")?;
        if self.duration_minutes == 0 {
            return Err(AppError::InvalidSession(format!(
                "entry '{}' must have a positive duration",
                self.title
            )));
        }
        Ok(())
    }
}

/// Dashboard-facing projection of an event, derived at read time and never
/// persisted. At a single evaluation instant at most one of `is_current` and
/// `is_upcoming` holds; events later in the week carry neither flag.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardEventView {
    pub id: Option<String>,
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub start_str: String,
    pub end_str: String,
    pub date: NaiveDate,
    pub day_name: String,
    pub duration_hours: f64,
    pub description: String,
    pub classification: Classification,
    pub location: Option<String>,
    pub html_link: Option<String>,
    pub is_current: bool,
    pub is_upcoming: bool,
    pub is_completed: bool,
}

/// Aggregate statistics over one week of dashboard views.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WeekStats {
    pub total_events: usize,
    pub completed_events: usize,
    pub current_events: usize,
    pub upcoming_events: usize,
    pub total_hours: f64,
    pub completed_hours: f64,
    pub completion_percentage: f64,
    pub today_events: usize,
    pub today_completed: usize,
    pub today_completion: f64,
}

/// Stored OAuth credential for the calendar account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
    pub scope: Option<String>,
}

impl OAuthToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>, leeway_seconds: i64) -> bool {
        self.expires_at > now + Duration::seconds(leeway_seconds)
            && !self.access_token.trim().is_empty()
    }
}

pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidSession(format!(
            "{field_name} must not be empty"
        )));
    }
    Ok(())
}

pub fn validate_hhmm(value: &str, field_name: &str) -> Result<(), AppError> {
    parse_hhmm(value)
        .map(|_| ())
        .ok_or_else(|| AppError::InvalidSession(format!("{field_name} must be HH:MM, got '{value}'")))
}

pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Minute arithmetic on a clock time. Returns the number of whole days the
/// sum rolled past midnight together with the resulting clock time.
pub fn clock_plus_minutes(start: NaiveTime, minutes: u32) -> (u32, NaiveTime) {
    let total = start.hour() * 60 + start.minute() + minutes;
    let carry_days = total / MINUTES_PER_DAY;
    let remainder = total % MINUTES_PER_DAY;
    let clock = NaiveTime::from_hms_opt(remainder / 60, remainder % 60, 0)
        .unwrap_or(NaiveTime::MIN);
    (carry_days, clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn eastern() -> Tz {
        "America/New_York".parse().expect("valid zone")
    }

    fn zoned(value: &str) -> DateTime<Tz> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&eastern())
    }

    fn sample_record() -> EventRecord {
        EventRecord {
            title: "JIRA Analysis - Git Comparison".to_string(),
            start: zoned("2025-10-26T09:00:00-04:00"),
            end: zoned("2025-10-26T10:15:00-04:00"),
            description: "Deep analysis of JIRA tickets and Git commits".to_string(),
            classification: Classification::HighCognitive,
            location: None,
        }
    }

    #[test]
    fn record_validate_accepts_valid_record() {
        assert!(sample_record().validate().is_ok());
    }

    #[test]
    fn record_validate_rejects_reversed_range() {
        let mut record = sample_record();
        record.end = record.start;
        assert!(matches!(
            record.validate(),
            Err(AppError::InvalidSession(_))
        ));
    }

    #[test]
    fn duration_is_in_hours() {
        let record = sample_record();
        assert!((record.duration_hours() - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn week_window_anchors_on_most_recent_sunday() {
        // 2025-10-29 is a Wednesday; the elapsed Sunday is 2025-10-26.
        let window = WeekWindow::for_date(NaiveDate::from_ymd_opt(2025, 10, 29).expect("date"));
        assert_eq!(window.week_start, NaiveDate::from_ymd_opt(2025, 10, 26).expect("date"));
        assert_eq!(window.week_end, NaiveDate::from_ymd_opt(2025, 10, 30).expect("date"));
    }

    #[test]
    fn week_window_starts_today_on_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2025, 10, 26).expect("date");
        assert_eq!(WeekWindow::for_date(sunday).week_start, sunday);
    }

    proptest! {
        #[test]
        fn week_window_is_stable_across_its_span(day_offset in 0i64..5i64) {
            let sunday = NaiveDate::from_ymd_opt(2025, 10, 26).expect("date");
            let window = WeekWindow::for_date(sunday + Duration::days(day_offset));
            prop_assert_eq!(window.week_start, sunday);
        }
    }

    #[test]
    fn week_window_bounds_cover_full_days() {
        let window = WeekWindow::for_date(NaiveDate::from_ymd_opt(2025, 10, 26).expect("date"));
        let (open, close) = window.bounds(eastern());
        assert_eq!(open, eastern().with_ymd_and_hms(2025, 10, 26, 0, 0, 0).unwrap());
        assert_eq!(close, eastern().with_ymd_and_hms(2025, 10, 30, 23, 59, 59).unwrap());
    }

    #[test]
    fn classification_round_trips_through_labels() {
        for classification in [
            Classification::HighCognitive,
            Classification::MediumCognitive,
            Classification::LowCognitive,
            Classification::Learning,
            Classification::Custom,
        ] {
            assert_eq!(Classification::parse(classification.as_str()), Some(classification));
        }
        assert_eq!(Classification::parse("unknown"), None);
    }

    #[test]
    fn hhmm_validation_rejects_out_of_range_values() {
        assert!(validate_hhmm("09:00", "field").is_ok());
        assert!(validate_hhmm("24:00", "field").is_err());
        assert!(validate_hhmm("9am", "field").is_err());
        assert!(validate_hhmm("", "field").is_err());
    }

    #[test]
    fn clock_arithmetic_wraps_past_midnight_with_carry() {
        let start = NaiveTime::from_hms_opt(23, 30, 0).expect("time");
        let (carry, clock) = clock_plus_minutes(start, 60);
        assert_eq!(carry, 1);
        assert_eq!(clock, NaiveTime::from_hms_opt(0, 30, 0).expect("time"));

        let (carry, clock) = clock_plus_minutes(NaiveTime::from_hms_opt(9, 0, 0).expect("time"), 75);
        assert_eq!(carry, 0);
        assert_eq!(clock, NaiveTime::from_hms_opt(10, 15, 0).expect("time"));
    }

    #[test]
    fn scheduled_entry_rejects_zero_duration() {
        let entry = ScheduledEntry {
            date: NaiveDate::from_ymd_opt(2025, 10, 26).expect("date"),
            start: "09:00".to_string(),
            duration_minutes: 0,
            title: "Standup".to_string(),
            description: None,
            classification: Classification::Custom,
        };
        assert!(matches!(entry.validate(), Err(AppError::InvalidSession(_))));
    }

    #[test]
    fn scheduled_entry_deserializes_with_defaults() {
        let entry: ScheduledEntry =
            serde_json::from_str(r#"{"date": "2025-10-26", "start": "09:00", "title": "Standup"}"#)
                .expect("deserialize entry");
        assert_eq!(entry.duration_minutes, 60);
        assert_eq!(entry.classification, Classification::Custom);
    }

    #[test]
    fn token_validity_honors_leeway() {
        let now = Utc::now();
        let token = OAuthToken {
            access_token: "access".to_string(),
            refresh_token: None,
            expires_at: now + Duration::seconds(30),
            token_type: "Bearer".to_string(),
            scope: None,
        };
        assert!(token.is_valid_at(now, 0));
        assert!(!token.is_valid_at(now, 60));
    }
}
