//! Day-level aggregation.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::types::{day_timestamp_ms, DayStats, DayStatus, Record};

/// Focus seconds that count as a fully productive day (one hour).
pub const DAILY_TARGET_SECONDS: u64 = 3600;

/// Productivity index for a day's focus seconds, clamped to 0-100.
///
/// `round(total_seconds / DAILY_TARGET_SECONDS * 100)`, so 60 seconds
/// already yields 2 and anything past the target yields 100.
pub fn productivity(total_seconds: u64) -> u32 {
    let pct = (total_seconds as f64 / DAILY_TARGET_SECONDS as f64 * 100.0).round();
    pct.min(100.0) as u32
}

/// Summarize the records of a single calendar day.
///
/// Records whose start falls on another day are ignored. A day with no
/// matching records is returned as an idle, zero-valued entry.
pub fn compute_day_stats(records: &[Record], date: NaiveDate) -> DayStats {
    summarize_day(date, records.iter().filter(|r| r.date() == date))
}

/// Summarize records already known to belong to `date`.
pub(crate) fn summarize_day<'a>(
    date: NaiveDate,
    records: impl IntoIterator<Item = &'a Record>,
) -> DayStats {
    let mut total_seconds = 0u64;
    let mut completed_sessions = 0u64;
    let mut total_records = 0u64;

    for record in records {
        total_records += 1;
        // Status does not gate inclusion: stopped and skipped focus records count
        if record.is_focus() {
            total_seconds = total_seconds.saturating_add(record.elapsed_seconds);
            completed_sessions += 1;
        }
    }

    DayStats {
        date,
        timestamp: day_timestamp_ms(date),
        total_seconds,
        completed_sessions,
        total_records,
        productivity: productivity(total_seconds),
        status: if total_records > 0 {
            DayStatus::Active
        } else {
            DayStatus::Idle
        },
    }
}

/// Bucket records by calendar day, ascending. Input order is kept within a day.
pub(crate) fn group_by_day<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> BTreeMap<NaiveDate, Vec<&'a Record>> {
    let mut days: BTreeMap<NaiveDate, Vec<&'a Record>> = BTreeMap::new();
    for record in records {
        days.entry(record.date()).or_default().push(record);
    }
    days
}

/// Day summaries for every day that has at least one record, ascending.
pub(crate) fn active_days<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<DayStats> {
    group_by_day(records)
        .into_iter()
        .map(|(date, day_records)| summarize_day(date, day_records))
        .collect()
}

/// Sum that clamps at `u64::MAX` instead of overflowing.
pub(crate) fn saturating_total(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

/// Rounded `numerator / denominator`, 0 when the denominator is 0.
pub(crate) fn rounded_ratio(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        0
    } else {
        (numerator as f64 / denominator as f64).round() as u64
    }
}

/// Rounded mean productivity of `days`, 0 when empty.
pub(crate) fn mean_productivity<'a>(days: impl IntoIterator<Item = &'a DayStats>) -> u32 {
    let (sum, count) = days
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), day| {
            (sum.saturating_add(u64::from(day.productivity)), count + 1)
        });
    rounded_ratio(sum, count) as u32
}
