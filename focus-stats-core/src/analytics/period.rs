//! Month, week and year rollups built from day summaries.

use chrono::{Datelike, Days, NaiveDate};

use super::day::{
    active_days, group_by_day, mean_productivity, rounded_ratio, saturating_total, summarize_day,
};
use crate::types::{DayStats, MonthStats, Record, WeekStats, YearMonth, YearStats};

/// Days covered by a [`WeekStats`].
pub const WEEK_DAYS: u64 = 7;

/// Roll up one calendar month.
///
/// `days` is sparse: only days with at least one record appear, ascending.
pub fn compute_month_stats(records: &[Record], year_month: YearMonth) -> MonthStats {
    let days = active_days(records.iter().filter(|r| year_month.contains(r.date())));
    month_from_days(year_month, days)
}

/// Build month totals from its (sparse, ascending) day summaries.
pub(crate) fn month_from_days(year_month: YearMonth, days: Vec<DayStats>) -> MonthStats {
    let total_seconds = saturating_total(days.iter().map(|d| d.total_seconds));
    let total_sessions = saturating_total(days.iter().map(|d| d.completed_sessions));

    // First-seen wins on ties
    let mut most_productive: Option<&DayStats> = None;
    for day in &days {
        if most_productive.map_or(true, |best| day.productivity > best.productivity) {
            most_productive = Some(day);
        }
    }

    MonthStats {
        year_month,
        total_seconds,
        total_sessions,
        avg_session_duration: rounded_ratio(total_seconds, total_sessions),
        active_days: days.len() as u64,
        most_productive_day: most_productive.map(|d| d.date),
        max_productivity: most_productive.map_or(0, |d| d.productivity),
        days,
    }
}

/// Roll up the seven days `[anchor, anchor + 6]`.
///
/// Not aligned to calendar weeks. Idle days are padded with zero values so
/// `days` always has exactly seven entries.
pub fn compute_week_stats(records: &[Record], anchor: NaiveDate) -> WeekStats {
    let end = anchor
        .checked_add_days(Days::new(WEEK_DAYS - 1))
        .unwrap_or(NaiveDate::MAX);
    let buckets = group_by_day(
        records
            .iter()
            .filter(|r| (anchor..=end).contains(&r.date())),
    );

    let days: Vec<DayStats> = anchor
        .iter_days()
        .take(WEEK_DAYS as usize)
        .map(|date| match buckets.get(&date) {
            Some(day_records) => summarize_day(date, day_records.iter().copied()),
            None => DayStats::idle(date),
        })
        .collect();

    let total_seconds = saturating_total(days.iter().map(|d| d.total_seconds));
    let total_sessions = saturating_total(days.iter().map(|d| d.completed_sessions));
    let active = days.iter().filter(|d| d.is_active()).count() as u64;
    let iso = anchor.iso_week();

    WeekStats {
        year_week: format!("{}-W{:02}", iso.year(), iso.week()),
        start_date: anchor,
        end_date: days.last().map_or(anchor, |d| d.date),
        total_seconds,
        total_sessions,
        active_days: active,
        avg_daily_seconds: rounded_ratio(total_seconds, active),
        days,
    }
}

/// Roll up one calendar year from the months that have records.
pub fn compute_year_stats(records: &[Record], year: i32) -> YearStats {
    let days = active_days(records.iter().filter(|r| r.date().year() == year));
    let total_active_days = days.len() as u64;
    let avg_productivity = mean_productivity(&days);
    let months = months_from_days(days);

    YearStats {
        year,
        total_seconds: saturating_total(months.iter().map(|m| m.total_seconds)),
        total_sessions: saturating_total(months.iter().map(|m| m.total_sessions)),
        total_active_days,
        avg_productivity,
        months,
    }
}

/// Split ascending day summaries into one rollup per month.
pub(crate) fn months_from_days(days: Vec<DayStats>) -> Vec<MonthStats> {
    let mut grouped: Vec<(YearMonth, Vec<DayStats>)> = Vec::new();
    for day in days {
        let month = YearMonth::of(day.date);
        match grouped.last_mut() {
            Some((current, month_days)) if *current == month => month_days.push(day),
            _ => grouped.push((month, vec![day])),
        }
    }
    grouped
        .into_iter()
        .map(|(month, month_days)| month_from_days(month, month_days))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{date, record, rest, ym};

    #[test]
    fn test_month_stats_totals() {
        let records = vec![
            record(1, "2024-12-01T08:00:00Z", 1800),
            record(2, "2024-12-02T08:00:00Z", 1800),
            record(3, "2024-12-03T08:00:00Z", 1800),
            record(4, "2024-12-05T08:00:00Z", 1800),
        ];

        let stats = compute_month_stats(&records, ym("2024-12"));

        assert_eq!(stats.year_month, ym("2024-12"));
        assert_eq!(stats.total_seconds, 7200);
        assert_eq!(stats.total_sessions, 4);
        assert_eq!(stats.active_days, 4);
        // Sparse: 12-04 is not padded in
        assert_eq!(stats.days.len(), 4);
        assert!(stats.days.iter().all(|d| d.date != date("2024-12-04")));
    }

    #[test]
    fn test_month_most_productive_day() {
        let records = vec![
            record(1, "2024-12-01T08:00:00Z", 1800),
            record(2, "2024-12-02T08:00:00Z", 3600),
            record(3, "2024-12-03T08:00:00Z", 900),
        ];

        let stats = compute_month_stats(&records, ym("2024-12"));

        assert_eq!(stats.most_productive_day, Some(date("2024-12-02")));
        assert_eq!(stats.max_productivity, 100);
    }

    #[test]
    fn test_month_most_productive_tie_keeps_first() {
        let records = vec![
            record(1, "2024-12-09T08:00:00Z", 7200),
            record(2, "2024-12-04T08:00:00Z", 3600),
        ];

        let stats = compute_month_stats(&records, ym("2024-12"));

        assert_eq!(stats.most_productive_day, Some(date("2024-12-04")));
    }

    #[test]
    fn test_month_average_session_duration() {
        let records = vec![
            record(1, "2024-12-01T08:00:00Z", 1800),
            record(2, "2024-12-01T09:00:00Z", 1200),
            rest(3, "2024-12-01T10:00:00Z", 600),
        ];

        let stats = compute_month_stats(&records, ym("2024-12"));

        assert_eq!(stats.avg_session_duration, 1500);
    }

    #[test]
    fn test_empty_month() {
        let stats = compute_month_stats(&[], ym("2024-12"));

        assert_eq!(stats.year_month, ym("2024-12"));
        assert!(stats.days.is_empty());
        assert_eq!(stats.total_seconds, 0);
        assert_eq!(stats.active_days, 0);
        assert_eq!(stats.avg_session_duration, 0);
        assert_eq!(stats.most_productive_day, None);
        assert_eq!(stats.max_productivity, 0);
    }

    #[test]
    fn test_cross_month_partition() {
        let records = vec![
            record(1, "2024-11-28T08:00:00Z", 1800),
            record(2, "2024-11-29T08:00:00Z", 1800),
            record(3, "2024-11-30T08:00:00Z", 1800),
            record(4, "2024-12-01T08:00:00Z", 1800),
            record(5, "2024-12-02T08:00:00Z", 1800),
        ];

        let nov = compute_month_stats(&records, ym("2024-11"));
        let dec = compute_month_stats(&records, ym("2024-12"));

        assert_eq!(nov.total_sessions, 3);
        assert_eq!(dec.total_sessions, 2);
        assert_eq!(nov.total_seconds, 5400);
        assert_eq!(dec.total_seconds, 3600);
    }

    #[test]
    fn test_week_stats_is_dense() {
        let records = vec![
            record(1, "2024-12-02T08:00:00Z", 1800),
            record(2, "2024-12-03T08:00:00Z", 1800),
            record(3, "2024-12-04T08:00:00Z", 1800),
            record(4, "2024-12-09T08:00:00Z", 1800),
        ];

        let week = compute_week_stats(&records, date("2024-12-02"));

        assert_eq!(week.days.len(), 7);
        assert_eq!(week.total_seconds, 5400);
        assert_eq!(week.total_sessions, 3);
        assert_eq!(week.active_days, 3);
        assert_eq!(week.avg_daily_seconds, 1800);
        assert_eq!(week.start_date, date("2024-12-02"));
        assert_eq!(week.end_date, date("2024-12-08"));
        assert_eq!(week.year_week, "2024-W49");

        let idle = &week.days[3];
        assert_eq!(idle.date, date("2024-12-05"));
        assert!(!idle.is_active());
        assert_eq!(idle.total_seconds, 0);
    }

    #[test]
    fn test_week_stats_not_calendar_aligned() {
        let records = vec![record(1, "2024-12-31T08:00:00Z", 600)];

        // Anchored on a Thursday, spans the new year
        let week = compute_week_stats(&records, date("2024-12-26"));

        let dates: Vec<_> = week.days.iter().map(|d| d.date).collect();
        assert_eq!(dates.first(), Some(&date("2024-12-26")));
        assert_eq!(dates.last(), Some(&date("2025-01-01")));
        assert_eq!(week.active_days, 1);
        assert!(week.days[5].is_active());
    }

    #[test]
    fn test_empty_week() {
        let week = compute_week_stats(&[], date("2024-12-02"));
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.active_days, 0);
        assert_eq!(week.avg_daily_seconds, 0);
    }

    #[test]
    fn test_year_stats() {
        let records = vec![
            record(1, "2023-12-31T08:00:00Z", 3600),
            record(2, "2024-01-05T08:00:00Z", 1800),
            record(3, "2024-01-06T08:00:00Z", 3600),
            record(4, "2024-03-01T08:00:00Z", 900),
            rest(5, "2024-03-01T09:00:00Z", 300),
        ];

        let year = compute_year_stats(&records, 2024);

        assert_eq!(year.year, 2024);
        let months: Vec<_> = year.months.iter().map(|m| m.year_month).collect();
        assert_eq!(months, vec![ym("2024-01"), ym("2024-03")]);
        assert_eq!(year.total_seconds, 6300);
        assert_eq!(year.total_sessions, 3);
        assert_eq!(year.total_active_days, 3);
        // (50 + 100 + 25) / 3
        assert_eq!(year.avg_productivity, 58);
        assert_eq!(year.months[0].total_seconds, 5400);
    }

    #[test]
    fn test_empty_year() {
        let year = compute_year_stats(&[], 2024);
        assert!(year.months.is_empty());
        assert_eq!(year.total_active_days, 0);
        assert_eq!(year.avg_productivity, 0);
    }
}
