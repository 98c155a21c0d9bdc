//! Calendar-day policy
//!
//! Every "which day does this session belong to" question goes through a
//! single `DayPolicy`: a fixed UTC offset captured once per read. Daily
//! listings, daily totals, streaks and topic history all share it, so
//! UTC and local grouping never get mixed.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Fixed-offset day boundary policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPolicy {
    offset: FixedOffset,
}

impl DayPolicy {
    /// Device-local offset, fixed at the moment of the call
    pub fn local() -> Self {
        Self {
            offset: *Local::now().offset(),
        }
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Offset east of UTC in minutes; `None` when out of range (±24h)
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::fixed)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar date an instant falls on
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Today's date as seen at `now`
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.date_of(now)
    }

    /// Half-open UTC range `[start, end)` covering one calendar day
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let utc_midnight =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        let start = Utc.from_utc_datetime(&utc_midnight);
        (start, start + Duration::days(1))
    }
}

impl Default for DayPolicy {
    fn default() -> Self {
        Self::local()
    }
}
