use crate::infrastructure::error::AppError;
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Attaches and strips zone information around a single configured time zone.
///
/// Ambiguous fall-back wall clocks resolve to the earlier instant; a
/// nonexistent spring-forward wall clock is treated as a data error rather
/// than being coerced.
#[derive(Debug, Clone, Copy)]
pub struct TimeZoneNormalizer {
    tz: Tz,
}

impl TimeZoneNormalizer {
    pub fn new(zone_name: &str) -> Result<Self, AppError> {
        let tz = zone_name.trim().parse::<Tz>().map_err(|_| {
            AppError::InvalidTimeZone(format!("unrecognized time zone '{zone_name}'"))
        })?;
        Ok(Self { tz })
    }

    pub fn zone(&self) -> Tz {
        self.tz
    }

    pub fn zone_name(&self) -> &'static str {
        self.tz.name()
    }

    /// Attach the configured zone to a naive wall-clock timestamp.
    pub fn localize(&self, wall_clock: NaiveDateTime) -> Result<DateTime<Tz>, AppError> {
        match self.tz.from_local_datetime(&wall_clock) {
            LocalResult::Single(value) => Ok(value),
            LocalResult::Ambiguous(earlier, _) => Ok(earlier),
            LocalResult::None => Err(AppError::InvalidSession(format!(
                "wall-clock time {wall_clock} does not exist in {}",
                self.tz
            ))),
        }
    }

    /// Convert any zoned timestamp into the configured zone. A no-op for
    /// timestamps already in it.
    pub fn normalize<T: TimeZone>(&self, value: DateTime<T>) -> DateTime<Tz> {
        value.with_timezone(&self.tz)
    }

    /// Naive local wall clock of a zoned timestamp, for arithmetic and
    /// comparison.
    pub fn strip(&self, value: DateTime<Tz>) -> NaiveDateTime {
        value.naive_local()
    }
}
