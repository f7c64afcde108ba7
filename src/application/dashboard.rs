use crate::application::classifier;
use crate::domain::models::{DashboardEventView, WeekWindow};
use crate::infrastructure::calendar_client::CalendarService;
use crate::infrastructure::error::AppError;
use crate::infrastructure::time::TimeZoneNormalizer;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

const PRIMARY_ALIAS: &str = "primary";

/// Read side of the dashboard: fetches the current week's remote events,
/// decodes and classifies them for presentation. Shares no state with the
/// reconciler; a poll landing mid-reconciliation may observe a partially
/// rebuilt week.
pub struct DashboardService<C>
where
    C: CalendarService,
{
    calendar_client: Arc<C>,
    normalizer: TimeZoneNormalizer,
    calendar_id: String,
}

impl<C> DashboardService<C>
where
    C: CalendarService,
{
    pub fn new(
        calendar_client: Arc<C>,
        normalizer: TimeZoneNormalizer,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            calendar_client,
            normalizer,
            calendar_id: calendar_id.into(),
        }
    }

    pub fn zone(&self) -> Tz {
        self.normalizer.zone()
    }

    /// Resolve the configured calendar id. The `primary` alias is looked up
    /// in the account's calendar list so later calls address the concrete
    /// calendar resource.
    pub async fn resolve_calendar_id(&self, access_token: &str) -> Result<String, AppError> {
        if self.calendar_id != PRIMARY_ALIAS {
            return Ok(self.calendar_id.clone());
        }

        let calendars = self.calendar_client.list_calendars(access_token).await?;
        calendars
            .into_iter()
            .find(|calendar| calendar.primary)
            .map(|calendar| calendar.id)
            .ok_or_else(|| AppError::CalendarUnavailable("primary calendar not found".to_string()))
    }

    /// The current week's events as dashboard views, sorted by start time.
    pub async fn week_views(
        &self,
        access_token: &str,
        window: WeekWindow,
        now: DateTime<Tz>,
    ) -> Result<Vec<DashboardEventView>, AppError> {
        let calendar_id = self.resolve_calendar_id(access_token).await?;
        let (time_min, time_max) = window.bounds(self.normalizer.zone());

        let remote = self
            .calendar_client
            .list_events(
                access_token,
                &calendar_id,
                time_min.with_timezone(&Utc),
                time_max.with_timezone(&Utc),
            )
            .await?;

        let mut views = Vec::with_capacity(remote.len());
        for event in &remote {
            let Some(decoded) =
                crate::infrastructure::event_codec::decode_remote_event(event, &self.normalizer)?
            else {
                log::debug!(
                    "skipping non-timed event {:?}",
                    event.id.as_deref().unwrap_or("<no id>")
                );
                continue;
            };

            let mut view = classifier::classify_one(&decoded.record, now);
            view.id = decoded.id;
            view.html_link = decoded.html_link;
            views.push(view);
        }

        views.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(views)
    }
}
