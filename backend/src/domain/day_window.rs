//! Local-day boundary calculation.
//!
//! Every ledger read and write goes through [`day_window`]: the half-open
//! UTC range `[start, end)` covering one calendar day in a given timezone.
//! The end is computed by advancing one calendar day and resolving local
//! midnight again, so windows spanning DST transitions are 23 or 25 hours
//! long instead of a fixed 86400 seconds.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{AppError, AppResult};

/// Half-open UTC range `[start, end)` for one local calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Today's calendar date as seen from `tz`
pub fn local_today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Compute the UTC window for `date` interpreted as a calendar day in `tz`
pub fn day_window(date: NaiveDate, tz: Tz) -> AppResult<DayWindow> {
    let start = local_midnight_utc(date, tz)?;
    let next = date
        .succ_opt()
        .ok_or_else(|| AppError::validation("date out of supported range"))?;
    let end = local_midnight_utc(next, tz)?;

    Ok(DayWindow { start, end })
}

/// The UTC instant where `date` begins in `tz`.
///
/// On fall-back days the earlier of the two midnights wins; on spring-forward
/// days where midnight does not exist, the first representable instant of the
/// day is used instead.
fn local_midnight_utc(date: NaiveDate, tz: Tz) -> AppResult<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);

    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            for offset_hours in 1..=3 {
                let shifted = midnight + Duration::hours(offset_hours);
                if let Some(dt) = tz.from_local_datetime(&shifted).earliest() {
                    return Ok(dt.with_timezone(&Utc));
                }
            }
            Err(AppError::validation(format!(
                "cannot resolve local midnight for {} in {}",
                date, tz
            )))
        }
    }
}

/// Parse a date parameter: `YYYY-MM-DD` (a calendar day as-is) or a full
/// RFC 3339 datetime (converted to the calendar day it falls on in `tz`).
/// Anything else is rejected before any window math runs.
pub fn parse_date_param(raw: &str, tz: Tz) -> AppResult<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&tz).date_naive());
    }

    Err(AppError::validation(format!(
        "invalid date '{}': expected YYYY-MM-DD or an RFC 3339 datetime",
        raw
    )))
}
