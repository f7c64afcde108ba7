use crate::infrastructure::error::AppError;
use crate::infrastructure::event_codec::RemoteEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use url::Url;

const CALENDAR_LIST_ENDPOINT: &str = "https://www.googleapis.com/calendar/v3/users/me/calendarList";
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSummary {
    pub id: String,
    pub summary: String,
    pub primary: bool,
}

/// The calendar capability the schedule engine is written against. The
/// production implementation talks to the Google Calendar v3 API; tests
/// substitute fakes.
#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn list_calendars(&self, access_token: &str) -> Result<Vec<CalendarSummary>, AppError>;

    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>, AppError>;

    async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &RemoteEvent,
    ) -> Result<RemoteEvent, AppError>;

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestCalendarClient {
    client: Client,
}

impl ReqwestCalendarClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), AppError> {
        if value.trim().is_empty() {
            return Err(AppError::CalendarUnavailable(format!(
                "{field} must not be empty"
            )));
        }
        Ok(())
    }

    fn http_error(status: reqwest::StatusCode, body: &str) -> AppError {
        let message = if body.trim().is_empty() {
            format!("calendar api error: http {}", status.as_u16())
        } else {
            format!("calendar api error: http {}; body={body}", status.as_u16())
        };
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            AppError::Authentication(message)
        } else {
            AppError::CalendarUnavailable(message)
        }
    }

    fn events_endpoint(calendar_id: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(CALENDAR_API_BASE).map_err(|error| {
            AppError::CalendarUnavailable(format!("invalid calendar api base url: {error}"))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::CalendarUnavailable("calendar api base URL cannot be a base".to_string())
            })?;
            segments.push("calendars");
            segments.push(calendar_id);
            segments.push("events");
        }
        Ok(url)
    }

    fn event_endpoint(calendar_id: &str, event_id: &str) -> Result<Url, AppError> {
        let mut url = Self::events_endpoint(calendar_id)?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::CalendarUnavailable("calendar events URL cannot be a base".to_string())
            })?;
            segments.push(event_id);
        }
        Ok(url)
    }
}

#[derive(Debug, serde::Deserialize)]
struct CalendarListResponse {
    items: Option<Vec<CalendarListItem>>,
}

#[derive(Debug, serde::Deserialize)]
struct CalendarListItem {
    id: String,
    summary: Option<String>,
    #[serde(default)]
    primary: bool,
}

#[derive(Debug, serde::Deserialize)]
struct EventsPageResponse {
    items: Option<Vec<RemoteEvent>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[async_trait]
impl CalendarService for ReqwestCalendarClient {
    async fn list_calendars(&self, access_token: &str) -> Result<Vec<CalendarSummary>, AppError> {
        Self::ensure_non_empty(access_token, "access token")?;

        let response = self
            .client
            .get(CALENDAR_LIST_ENDPOINT)
            .query(&[("maxResults", 250)])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                AppError::CalendarUnavailable(format!(
                    "network error while listing calendars: {error}"
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            AppError::CalendarUnavailable(format!(
                "failed reading calendar list response: {error}"
            ))
        })?;

        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }

        let parsed: CalendarListResponse = serde_json::from_str(&body).map_err(|error| {
            AppError::CalendarUnavailable(format!(
                "invalid calendar list payload: {error}; body={body}"
            ))
        })?;

        Ok(parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                let id = item.id.trim();
                if id.is_empty() {
                    return None;
                }
                let summary = item
                    .summary
                    .unwrap_or_else(|| id.to_string())
                    .trim()
                    .to_string();
                Some(CalendarSummary {
                    id: id.to_string(),
                    summary,
                    primary: item.primary,
                })
            })
            .collect())
    }

    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>, AppError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;

        let endpoint = Self::events_endpoint(calendar_id)?;
        let mut page_token: Option<String> = None;
        let mut events = Vec::new();

        loop {
            let mut request = self
                .client
                .get(endpoint.clone())
                .bearer_auth(access_token)
                .query(&[
                    ("singleEvents", "true"),
                    ("orderBy", "startTime"),
                    ("maxResults", "2500"),
                ])
                .query(&[
                    ("timeMin", time_min.to_rfc3339()),
                    ("timeMax", time_max.to_rfc3339()),
                ]);

            if let Some(page_token) = page_token.as_deref() {
                request = request.query(&[("pageToken", page_token)]);
            }

            let response = request.send().await.map_err(|error| {
                AppError::CalendarUnavailable(format!(
                    "network error while listing calendar events: {error}"
                ))
            })?;

            let status = response.status();
            let body = response.text().await.map_err(|error| {
                AppError::CalendarUnavailable(format!(
                    "failed reading events list response: {error}"
                ))
            })?;

            if !status.is_success() {
                return Err(Self::http_error(status, &body));
            }

            let mut parsed: EventsPageResponse = serde_json::from_str(&body).map_err(|error| {
                AppError::CalendarUnavailable(format!(
                    "invalid events list payload: {error}; body={body}"
                ))
            })?;

            events.extend(parsed.items.take().unwrap_or_default());

            if let Some(next_page_token) = parsed.next_page_token.take() {
                page_token = Some(next_page_token);
                continue;
            }
            break;
        }

        Ok(events)
    }

    async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &RemoteEvent,
    ) -> Result<RemoteEvent, AppError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;

        let endpoint = Self::events_endpoint(calendar_id)?;
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|error| {
                AppError::CalendarUnavailable(format!(
                    "network error while creating event: {error}"
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            AppError::CalendarUnavailable(format!(
                "failed reading event create response: {error}"
            ))
        })?;

        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|error| {
            AppError::CalendarUnavailable(format!(
                "invalid event create payload: {error}; body={body}"
            ))
        })
    }

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), AppError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;
        Self::ensure_non_empty(event_id, "event id")?;

        let endpoint = Self::event_endpoint(calendar_id, event_id)?;
        let response = self
            .client
            .delete(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                AppError::CalendarUnavailable(format!(
                    "network error while deleting event: {error}"
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            AppError::CalendarUnavailable(format!(
                "failed reading event delete response: {error}"
            ))
        })?;

        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }
        Ok(())
    }
}
