use crate::domain::models::{
    clock_plus_minutes, parse_hhmm, DayTemplate, EventRecord, ScheduledEntry,
};
use crate::infrastructure::error::AppError;
use crate::infrastructure::time::TimeZoneNormalizer;
use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use std::collections::BTreeMap;

/// Expands a declarative weekly template into concrete, zone-normalized
/// event records for a target week.
pub struct ScheduleBuilder {
    normalizer: TimeZoneNormalizer,
}

impl ScheduleBuilder {
    pub fn new(normalizer: TimeZoneNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn zone(&self) -> Tz {
        self.normalizer.zone()
    }

    /// Clock-pair variant. Sessions with `end <= start` are rejected rather
    /// than wrapped past midnight; schedules in this domain never span it.
    pub fn build(
        &self,
        week_start: NaiveDate,
        template: &[DayTemplate],
    ) -> Result<Vec<EventRecord>, AppError> {
        let mut records = Vec::new();

        for day in template {
            day.validate()?;
            let date = week_start + Duration::days(day.offset_days as i64);

            for session in &day.sessions {
                let start_clock = parse_hhmm(&session.start).ok_or_else(|| {
                    AppError::InvalidSession(format!(
                        "session '{}' has invalid start '{}'",
                        session.title, session.start
                    ))
                })?;
                let end_clock = parse_hhmm(&session.end).ok_or_else(|| {
                    AppError::InvalidSession(format!(
                        "session '{}' has invalid end '{}'",
                        session.title, session.end
                    ))
                })?;
                if end_clock <= start_clock {
                    return Err(AppError::InvalidSession(format!(
                        "session '{}' ends at or before it starts ({} .. {})",
                        session.title, session.start, session.end
                    )));
                }

                let record = EventRecord {
                    title: session.title.clone(),
                    start: self.normalizer.localize(date.and_time(start_clock))?,
                    end: self.normalizer.localize(date.and_time(end_clock))?,
                    description: session.description.clone(),
                    classification: session.classification,
                    location: session.location.clone(),
                };
                record.validate()?;
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Duration variant. The end clock is start plus duration modulo one day;
    /// a sum past midnight silently rolls the end onto the next date. The two
    /// build paths intentionally disagree here, matching the behavior this
    /// tool replaces.
    pub fn build_from_entries(
        &self,
        entries: &[ScheduledEntry],
    ) -> Result<Vec<EventRecord>, AppError> {
        let mut by_date: BTreeMap<NaiveDate, Vec<&ScheduledEntry>> = BTreeMap::new();
        for entry in entries {
            entry.validate()?;
            by_date.entry(entry.date).or_default().push(entry);
        }

        let mut records = Vec::new();
        for (date, day_entries) in by_date {
            for entry in day_entries {
                let start_clock = parse_hhmm(&entry.start).ok_or_else(|| {
                    AppError::InvalidSession(format!(
                        "entry '{}' has invalid start '{}'",
                        entry.title, entry.start
                    ))
                })?;
                let (carry_days, end_clock) =
                    clock_plus_minutes(start_clock, entry.duration_minutes);
                let end_date = date + Duration::days(carry_days as i64);

                let record = EventRecord {
                    title: entry.title.clone(),
                    start: self.normalizer.localize(date.and_time(start_clock))?,
                    end: self.normalizer.localize(end_date.and_time(end_clock))?,
                    description: entry
                        .description
                        .clone()
                        .unwrap_or_else(|| entry.title.clone()),
                    classification: entry.classification,
                    location: None,
                };
                record.validate()?;
                records.push(record);
            }
        }

        Ok(records)
    }
}
