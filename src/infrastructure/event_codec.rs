use crate::domain::models::{Classification, EventRecord};
use crate::infrastructure::error::AppError;
use crate::infrastructure::time::TimeZoneNormalizer;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Fixed reminder policy attached to every created event: one email a day
/// ahead, one popup shortly before.
pub const EMAIL_REMINDER_MINUTES: i64 = 24 * 60;
pub const POPUP_REMINDER_MINUTES: i64 = 15;

const CLASSIFICATION_LABEL: &str = "Session type:";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EventDateTime {
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "timeZone", default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EventReminders {
    #[serde(rename = "useDefault")]
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ReminderOverride>,
}

/// Subset of the Google Calendar v3 event resource this crate reads and
/// writes. Field names follow the wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "htmlLink", default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<EventReminders>,
}

/// An EventRecord recovered from the wire, together with the server-assigned
/// identity fields the record itself does not carry.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub record: EventRecord,
    pub id: Option<String>,
    pub html_link: Option<String>,
}

/// Encode a record as a new remote event with the fixed reminder policy.
pub fn encode_event_record(record: &EventRecord, zone_name: &str) -> RemoteEvent {
    RemoteEvent {
        id: None,
        summary: Some(record.title.clone()),
        description: Some(description_with_classification(record)),
        location: record.location.clone(),
        status: Some("confirmed".to_string()),
        html_link: None,
        start: EventDateTime {
            date_time: Some(record.start.to_rfc3339()),
            date: None,
            time_zone: Some(zone_name.to_string()),
        },
        end: EventDateTime {
            date_time: Some(record.end.to_rfc3339()),
            date: None,
            time_zone: Some(zone_name.to_string()),
        },
        reminders: Some(EventReminders {
            use_default: false,
            overrides: vec![
                ReminderOverride {
                    method: "email".to_string(),
                    minutes: EMAIL_REMINDER_MINUTES,
                },
                ReminderOverride {
                    method: "popup".to_string(),
                    minutes: POPUP_REMINDER_MINUTES,
                },
            ],
        }),
    }
}

/// Decode a remote event back into a record. All-day events (no timed
/// start/end) and events with a non-positive duration decode to `None`.
pub fn decode_remote_event(
    event: &RemoteEvent,
    normalizer: &TimeZoneNormalizer,
) -> Result<Option<DecodedEvent>, AppError> {
    let (Some(start_raw), Some(end_raw)) =
        (event.start.date_time.as_deref(), event.end.date_time.as_deref())
    else {
        return Ok(None);
    };

    let start = normalizer.normalize(parse_rfc3339(start_raw, "start.dateTime")?);
    let end = normalizer.normalize(parse_rfc3339(end_raw, "end.dateTime")?);
    if end <= start {
        return Ok(None);
    }

    let description = event.description.clone().unwrap_or_default();
    let record = EventRecord {
        title: event
            .summary
            .clone()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string()),
        start,
        end,
        classification: classification_from_description(&description),
        description,
        location: event.location.clone(),
    };

    Ok(Some(DecodedEvent {
        record,
        id: event.id.clone(),
        html_link: event.html_link.clone(),
    }))
}

fn description_with_classification(record: &EventRecord) -> String {
    let tag = record.classification.as_str();
    if record.description.trim().is_empty() {
        format!("{CLASSIFICATION_LABEL} {tag}")
    } else {
        format!("{}\n\n{CLASSIFICATION_LABEL} {tag}", record.description)
    }
}

fn classification_from_description(description: &str) -> Classification {
    description
        .lines()
        .rev()
        .find_map(|line| {
            line.trim()
                .strip_prefix(CLASSIFICATION_LABEL)
                .and_then(Classification::parse)
        })
        .unwrap_or_default()
}

fn parse_rfc3339(value: &str, field_name: &str) -> Result<DateTime<chrono::FixedOffset>, AppError> {
    DateTime::parse_from_rfc3339(value).map_err(|error| {
        AppError::CalendarUnavailable(format!(
            "invalid calendar event {field_name} '{value}': {error}"
        ))
    })
}
