use crate::domain::models::{clock_plus_minutes, parse_hhmm, DayTemplate, ScheduledEntry};
use crate::infrastructure::error::AppError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Advisory snapshot written after every successful reconciliation. Never
/// read back programmatically.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScheduleBackup {
    pub created_at: String,
    pub schedule: Vec<BackupDay>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BackupDay {
    pub date: String,
    pub day_name: String,
    pub theme: String,
    pub sessions: Vec<BackupSession>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BackupSession {
    pub title: String,
    pub start: String,
    pub end: String,
    pub description: String,
    #[serde(rename = "type")]
    pub session_type: String,
}

impl ScheduleBackup {
    pub fn from_template(
        week_start: NaiveDate,
        template: &[DayTemplate],
        created_at: DateTime<Utc>,
    ) -> Self {
        let schedule = template
            .iter()
            .map(|day| {
                let date = week_start + Duration::days(day.offset_days as i64);
                BackupDay {
                    date: date.format("%Y-%m-%d").to_string(),
                    day_name: date.format("%A").to_string(),
                    theme: day.theme.clone(),
                    sessions: day
                        .sessions
                        .iter()
                        .map(|session| BackupSession {
                            title: session.title.clone(),
                            start: session.start.clone(),
                            end: session.end.clone(),
                            description: session.description.clone(),
                            session_type: session.classification.as_str().to_string(),
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            created_at: created_at.to_rfc3339(),
            schedule,
        }
    }

    pub fn from_entries(entries: &[ScheduledEntry], created_at: DateTime<Utc>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<&ScheduledEntry>> = BTreeMap::new();
        for entry in entries {
            by_date.entry(entry.date).or_default().push(entry);
        }

        let schedule = by_date
            .into_iter()
            .map(|(date, day_entries)| {
                let day_name = date.format("%A").to_string();
                BackupDay {
                    date: date.format("%Y-%m-%d").to_string(),
                    theme: format!("{day_name} schedule"),
                    day_name,
                    sessions: day_entries
                        .into_iter()
                        .map(|entry| {
                            let end = parse_hhmm(&entry.start)
                                .map(|start| clock_plus_minutes(start, entry.duration_minutes).1)
                                .map(|clock| clock.format("%H:%M").to_string())
                                .unwrap_or_default();
                            BackupSession {
                                title: entry.title.clone(),
                                start: entry.start.clone(),
                                end,
                                description: entry
                                    .description
                                    .clone()
                                    .unwrap_or_else(|| entry.title.clone()),
                                session_type: entry.classification.as_str().to_string(),
                            }
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            created_at: created_at.to_rfc3339(),
            schedule,
        }
    }
}

pub fn write_backup(path: &Path, backup: &ScheduleBackup) -> Result<(), AppError> {
    let formatted = serde_json::to_string_pretty(backup)?;
    fs::write(path, format!("{formatted}\n"))?;
    Ok(())
}
