use crate::domain::models::{EventRecord, WeekWindow};
use crate::infrastructure::calendar_client::CalendarService;
use crate::infrastructure::error::AppError;
use crate::infrastructure::event_codec::encode_event_record;
use chrono::Utc;
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Delete,
    Create,
}

/// One per-item failure collected during a reconciliation pass. These never
/// abort the batch.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemFailure {
    pub kind: FailureKind,
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileResult {
    pub deleted: usize,
    pub attempted: usize,
    pub created: usize,
    pub failures: Vec<ItemFailure>,
}

/// Full-replace reconciliation of a week window: every remote event in the
/// window is deleted, then the target set is inserted from scratch. No diff
/// is computed, and edits a user made directly on existing events in the
/// window are lost. Deletion always happens first, so re-running with the
/// same input is the recovery path for any partial failure.
pub struct CalendarReconciler<C>
where
    C: CalendarService,
{
    calendar_client: Arc<C>,
    zone: Tz,
}

impl<C> CalendarReconciler<C>
where
    C: CalendarService,
{
    pub fn new(calendar_client: Arc<C>, zone: Tz) -> Self {
        Self {
            calendar_client,
            zone,
        }
    }

    pub async fn reconcile(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: WeekWindow,
        events: &[EventRecord],
    ) -> Result<ReconcileResult, AppError> {
        let (time_min, time_max) = window.bounds(self.zone);
        let remote = self
            .calendar_client
            .list_events(
                access_token,
                calendar_id,
                time_min.with_timezone(&Utc),
                time_max.with_timezone(&Utc),
            )
            .await?;

        let mut result = ReconcileResult {
            attempted: events.len(),
            ..ReconcileResult::default()
        };

        log::info!(
            "reconciling week of {}: {} remote events to remove, {} to create",
            window.week_start,
            remote.len(),
            events.len()
        );

        for event in &remote {
            let Some(event_id) = event
                .id
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
            else {
                continue;
            };

            match self
                .calendar_client
                .delete_event(access_token, calendar_id, event_id)
                .await
            {
                Ok(()) => result.deleted += 1,
                Err(error) => {
                    log::warn!("failed to delete event {event_id}: {error}");
                    result.failures.push(ItemFailure {
                        kind: FailureKind::Delete,
                        target: event_id.to_string(),
                        message: error.to_string(),
                    });
                }
            }
        }

        for record in events {
            let payload = encode_event_record(record, self.zone.name());
            match self
                .calendar_client
                .insert_event(access_token, calendar_id, &payload)
                .await
            {
                Ok(created) => {
                    result.created += 1;
                    if let Some(link) = created.html_link.as_deref() {
                        log::info!("created '{}': {link}", record.title);
                    }
                }
                Err(error) => {
                    log::warn!("failed to create '{}': {error}", record.title);
                    result.failures.push(ItemFailure {
                        kind: FailureKind::Create,
                        target: record.title.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }
}
