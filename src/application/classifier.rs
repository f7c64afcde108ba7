use crate::domain::models::{DashboardEventView, EventRecord, WeekStats};
use chrono::DateTime;
use chrono_tz::Tz;

/// Derive the dashboard flags for one record at a single evaluation instant.
///
/// `is_current`, `is_upcoming` and `is_completed` are intentionally not
/// exhaustive: an event on a later day of the week carries none of the three.
/// The dashboard only highlights "happening now" and "later today".
pub fn classify_one(record: &EventRecord, now: DateTime<Tz>) -> DashboardEventView {
    let is_current = record.start <= now && now <= record.end;
    let is_upcoming = record.start > now && record.start.date_naive() == now.date_naive();
    let is_completed = record.end < now;

    DashboardEventView {
        id: None,
        title: record.title.clone(),
        start: record.start,
        end: record.end,
        start_str: record.start.format("%H:%M").to_string(),
        end_str: record.end.format("%H:%M").to_string(),
        date: record.start.date_naive(),
        day_name: record.start.format("%A").to_string(),
        duration_hours: record.duration_hours(),
        description: record.description.clone(),
        classification: record.classification,
        location: record.location.clone(),
        html_link: None,
        is_current,
        is_upcoming,
        is_completed,
    }
}

pub fn classify(records: &[EventRecord], now: DateTime<Tz>) -> Vec<DashboardEventView> {
    records.iter().map(|record| classify_one(record, now)).collect()
}

/// Aggregate statistics for the dashboard header. All ratios are guarded
/// against empty inputs.
pub fn aggregate(views: &[DashboardEventView], now: DateTime<Tz>) -> WeekStats {
    let total_events = views.len();
    let completed_events = views.iter().filter(|view| view.is_completed).count();
    let current_events = views.iter().filter(|view| view.is_current).count();
    let upcoming_events = views.iter().filter(|view| view.is_upcoming).count();

    let total_hours: f64 = views.iter().map(|view| view.duration_hours).sum();
    let completed_hours: f64 = views
        .iter()
        .filter(|view| view.is_completed)
        .map(|view| view.duration_hours)
        .sum();

    let completion_percentage = if total_events > 0 {
        completed_events as f64 / total_events as f64 * 100.0
    } else {
        0.0
    };

    let today = now.date_naive();
    let today_events = views.iter().filter(|view| view.date == today).count();
    let today_completed = views
        .iter()
        .filter(|view| view.date == today && view.is_completed)
        .count();
    let today_completion = if today_events > 0 {
        today_completed as f64 / today_events as f64 * 100.0
    } else {
        0.0
    };

    WeekStats {
        total_events,
        completed_events,
        current_events,
        upcoming_events,
        total_hours,
        completed_hours,
        completion_percentage,
        today_events,
        today_completed,
        today_completion,
    }
}

/// The event happening at the evaluation instant, if any.
pub fn current_event(views: &[DashboardEventView]) -> Option<&DashboardEventView> {
    views.iter().find(|view| view.is_current)
}

/// The earliest event still ahead today, if any.
pub fn next_event(views: &[DashboardEventView]) -> Option<&DashboardEventView> {
    views
        .iter()
        .filter(|view| view.is_upcoming)
        .min_by_key(|view| view.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Classification;
    use chrono::Duration;
    use proptest::prelude::*;

    fn eastern() -> Tz {
        "America/New_York".parse().expect("valid zone")
    }

    fn zoned(value: &str) -> DateTime<Tz> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&eastern())
    }

    fn record(title: &str, start: &str, end: &str) -> EventRecord {
        EventRecord {
            title: title.to_string(),
            start: zoned(start),
            end: zoned(end),
            description: String::new(),
            classification: Classification::Custom,
            location: None,
        }
    }

    fn now() -> DateTime<Tz> {
        zoned("2025-10-27T12:00:00-04:00")
    }

    fn sample_week() -> Vec<EventRecord> {
        vec![
            // Yesterday, completed.
            record("Sunday recap", "2025-10-26T09:00:00-04:00", "2025-10-26T10:15:00-04:00"),
            // Earlier today, completed.
            record("Morning focus", "2025-10-27T09:00:00-04:00", "2025-10-27T10:15:00-04:00"),
            // Running right now.
            record("Midday block", "2025-10-27T11:30:00-04:00", "2025-10-27T12:45:00-04:00"),
            // Later today, upcoming.
            record("Afternoon block", "2025-10-27T15:30:00-04:00", "2025-10-27T16:45:00-04:00"),
            // Later this week: none of the three flags.
            record("Wednesday testing", "2025-10-29T09:00:00-04:00", "2025-10-29T10:15:00-04:00"),
        ]
    }

    #[test]
    fn flags_follow_the_dashboard_rules() {
        let views = classify(&sample_week(), now());

        assert!(views[0].is_completed && !views[0].is_current && !views[0].is_upcoming);
        assert!(views[1].is_completed && !views[1].is_current && !views[1].is_upcoming);
        assert!(views[2].is_current && !views[2].is_completed && !views[2].is_upcoming);
        assert!(views[3].is_upcoming && !views[3].is_current && !views[3].is_completed);
        assert!(!views[4].is_current && !views[4].is_upcoming && !views[4].is_completed);
    }

    #[test]
    fn view_carries_presentation_fields() {
        let views = classify(&sample_week(), now());
        assert_eq!(views[1].start_str, "09:00");
        assert_eq!(views[1].end_str, "10:15");
        assert_eq!(views[1].day_name, "Monday");
        assert!((views[1].duration_hours - 1.25).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn at_most_one_of_current_and_upcoming_and_completed_matches_end(
            start_offset_minutes in -2880i64..2880i64,
            duration_minutes in 1i64..600i64,
        ) {
            let now = now();
            let start = now + Duration::minutes(start_offset_minutes);
            let end = start + Duration::minutes(duration_minutes);
            let record = EventRecord {
                title: "Generated".to_string(),
                start,
                end,
                description: String::new(),
                classification: Classification::Custom,
                location: None,
            };

            let view = classify_one(&record, now);
            prop_assert!(!(view.is_current && view.is_upcoming));
            prop_assert_eq!(view.is_completed, end < now);
            if view.is_completed {
                prop_assert!(!view.is_current && !view.is_upcoming);
            }
        }
    }

    #[test]
    fn aggregate_matches_the_sample_week() {
        let views = classify(&sample_week(), now());
        let stats = aggregate(&views, now());

        assert_eq!(stats.total_events, 5);
        assert_eq!(stats.completed_events, 2);
        assert_eq!(stats.current_events, 1);
        assert_eq!(stats.upcoming_events, 1);
        assert!((stats.total_hours - 6.25).abs() < 1e-9);
        assert!((stats.completed_hours - 2.5).abs() < 1e-9);
        assert!((stats.completion_percentage - 40.0).abs() < 1e-9);
        assert_eq!(stats.today_events, 3);
        assert_eq!(stats.today_completed, 1);
        assert!((stats.today_completion - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn aggregate_over_empty_input_yields_zeroes() {
        let stats = aggregate(&[], now());
        assert_eq!(stats.total_events, 0);
        assert_eq!(stats.completion_percentage, 0.0);
        assert_eq!(stats.today_completion, 0.0);
    }

    #[test]
    fn current_and_next_helpers_pick_the_right_events() {
        let mut views = classify(&sample_week(), now());
        assert_eq!(current_event(&views).map(|view| view.title.as_str()), Some("Midday block"));
        assert_eq!(next_event(&views).map(|view| view.title.as_str()), Some("Afternoon block"));

        // A second upcoming event later today must not displace the earlier one.
        views.push(classify_one(
            &record("Evening block", "2025-10-27T18:00:00-04:00", "2025-10-27T19:00:00-04:00"),
            now(),
        ));
        assert_eq!(next_event(&views).map(|view| view.title.as_str()), Some("Afternoon block"));

        let empty: Vec<DashboardEventView> = Vec::new();
        assert_eq!(current_event(&empty), None);
        assert_eq!(next_event(&empty), None);
    }
}
