//! Streak calculation over ascending day summaries.
//!
//! Both calculators are pure: the caller supplies the ordered days and,
//! for the current streak, the reference day to count back from.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::types::DayStats;

/// A run of consecutive active days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakRun {
    pub length: u64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Consecutive active days ending at `reference`, walking backwards.
///
/// Stops at the first missing or idle day. Returns 0 when `reference`
/// itself has no active entry.
pub fn current_streak(days: &[DayStats], reference: NaiveDate) -> u64 {
    let active: HashSet<NaiveDate> = days
        .iter()
        .filter(|d| d.is_active())
        .map(|d| d.date)
        .collect();

    let mut streak = 0u64;
    let mut cursor = Some(reference);
    while let Some(day) = cursor.filter(|d| active.contains(d)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

/// Length of the longest run of consecutive active days.
pub fn longest_streak(days: &[DayStats]) -> u64 {
    longest_run(days).map_or(0, |run| run.length)
}

/// The longest run of consecutive active days, earliest first on ties.
///
/// An idle entry or a missing calendar date between two entries breaks the run.
pub fn longest_run(days: &[DayStats]) -> Option<StreakRun> {
    let mut best: Option<StreakRun> = None;
    let mut current: Option<StreakRun> = None;

    for day in days {
        if !day.is_active() {
            current = None;
            continue;
        }

        current = match current {
            Some(run) if run.end == day.date => Some(run),
            Some(run) if run.end.succ_opt() == Some(day.date) => Some(StreakRun {
                length: run.length + 1,
                end: day.date,
                ..run
            }),
            _ => Some(StreakRun {
                length: 1,
                start: day.date,
                end: day.date,
            }),
        };

        if let Some(run) = current {
            if best.map_or(true, |b| run.length > b.length) {
                best = Some(run);
            }
        }
    }

    best
}
