//! Whole-history rollup.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::day::{active_days, mean_productivity, rounded_ratio, saturating_total};
use super::streak::{current_streak, longest_streak};
use crate::types::{OverallStats, Record, Session, YearMonth};

/// Summarize the entire record history.
///
/// `today` anchors the current streak. `sessions` is auxiliary metadata and
/// does not enter the arithmetic. An empty history yields zero totals with
/// `start_date`/`end_date` set to `None`.
pub fn compute_overall_stats(
    sessions: &[Session],
    records: &[Record],
    today: NaiveDate,
) -> OverallStats {
    let days = active_days(records);

    let total_seconds = saturating_total(days.iter().map(|d| d.total_seconds));
    let total_sessions = saturating_total(days.iter().map(|d| d.completed_sessions));
    let total_active_days = days.len() as u64;

    let mut seconds_by_month: BTreeMap<YearMonth, u64> = BTreeMap::new();
    for day in &days {
        let seconds = seconds_by_month.entry(YearMonth::of(day.date)).or_default();
        *seconds = seconds.saturating_add(day.total_seconds);
    }
    // Ascending months, first-seen wins on ties
    let mut most_productive_month: Option<(YearMonth, u64)> = None;
    for (month, seconds) in seconds_by_month {
        if most_productive_month.map_or(true, |(_, best)| seconds > best) {
            most_productive_month = Some((month, seconds));
        }
    }

    tracing::debug!(
        records = records.len(),
        sessions = sessions.len(),
        active_days = total_active_days,
        "Computed overall stats"
    );

    OverallStats {
        total_seconds,
        total_sessions,
        current_streak: current_streak(&days, today),
        longest_streak: longest_streak(&days),
        avg_daily_seconds: rounded_ratio(total_seconds, total_active_days),
        avg_session_duration: rounded_ratio(total_seconds, total_sessions),
        most_productive_month: most_productive_month.map(|(month, _)| month),
        start_date: days.first().map(|d| d.date),
        end_date: days.last().map(|d| d.date),
        total_active_days,
        overall_productivity: mean_productivity(&days),
    }
}
