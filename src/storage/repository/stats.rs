//! Aggregate queries over closed sessions
//!
//! Daily totals are bucketed in Rust rather than SQL so the same `DayPolicy`
//! decides day membership here as everywhere else.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rusqlite::params;

use super::{format_timestamp, parse_timestamp, StorageError};
use crate::models::{DailyStat, DayPolicy};
use crate::storage::Database;

impl Database {
    /// Total focused seconds per day for the last `days_back` days
    ///
    /// # Arguments
    /// * `days_back` - Number of days, today included
    /// * `today` - The last day of the range
    /// * `days` - Day boundary policy
    ///
    /// # Returns
    /// Exactly `days_back` entries; days without sessions map to 0
    pub fn get_daily_totals(
        &self,
        days_back: u32,
        today: NaiveDate,
        days: &DayPolicy,
    ) -> Result<BTreeMap<NaiveDate, i64>, StorageError> {
        let mut totals = BTreeMap::new();
        if days_back == 0 {
            return Ok(totals);
        }

        let first_day = today
            .checked_sub_days(Days::new(u64::from(days_back - 1)))
            .ok_or_else(|| {
                StorageError::InvalidInput(format!("{days_back} days back from {today} is out of range"))
            })?;

        for day in first_day.iter_days().take(days_back as usize) {
            totals.insert(day, 0);
        }

        let (range_start, _) = days.day_bounds(first_day);
        let (_, range_end) = days.day_bounds(today);

        let mut stmt = self.connection().prepare(
            "SELECT start_time, duration_seconds FROM sessions
             WHERE end_time IS NOT NULL AND start_time >= ?1 AND start_time < ?2",
        )?;

        let rows = stmt.query_map(
            params![format_timestamp(range_start), format_timestamp(range_end)],
            |row| {
                let start_time: String = row.get(0)?;
                Ok((parse_timestamp(&start_time, 0)?, row.get::<_, i64>(1)?))
            },
        )?;

        for row in rows {
            let (start_time, seconds) = row?;
            if let Some(total) = totals.get_mut(&days.date_of(start_time)) {
                *total += seconds;
            }
        }

        Ok(totals)
    }

    /// Daily totals from the day of the first closed session through `today`
    ///
    /// Covers every recorded day, so a backward walk such as the streak
    /// never stops at a window edge. Just `today` when nothing is recorded.
    pub fn get_all_daily_totals(
        &self,
        today: NaiveDate,
        days: &DayPolicy,
    ) -> Result<BTreeMap<NaiveDate, i64>, StorageError> {
        let days_back = match self.earliest_start_time()? {
            Some(first) => {
                let span = (today - days.date_of(first)).num_days().max(0) + 1;
                u32::try_from(span).map_err(|_| {
                    StorageError::InvalidInput(format!("history of {span} days is out of range"))
                })?
            }
            None => 1,
        };
        self.get_daily_totals(days_back, today, days)
    }

    /// Same data as `get_daily_totals`, as an ordered list (oldest first)
    pub fn get_daily_stats(
        &self,
        days_back: u32,
        today: NaiveDate,
        days: &DayPolicy,
    ) -> Result<Vec<DailyStat>, StorageError> {
        Ok(self
            .get_daily_totals(days_back, today, days)?
            .into_iter()
            .map(|(date, total_seconds)| DailyStat {
                date,
                total_seconds,
            })
            .collect())
    }

    /// Lifetime focused seconds across all closed sessions
    pub fn total_focus_seconds(&self) -> Result<i64, StorageError> {
        let total = self.connection().query_row(
            "SELECT COALESCE(SUM(duration_seconds), 0) FROM sessions WHERE end_time IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Start time of the oldest closed session
    pub fn earliest_start_time(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let earliest: Option<String> = self.connection().query_row(
            "SELECT MIN(start_time) FROM sessions WHERE end_time IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        earliest
            .as_deref()
            .map(|value| parse_timestamp(value, 0))
            .transpose()
            .map_err(StorageError::from)
    }
}
