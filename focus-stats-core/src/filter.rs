//! Predicate filtering over day summaries and raw records.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{DayStats, Record, RecordKind, RecordStatus, YearMonth};

/// Filter for narrowing stats.
///
/// Every predicate that is set must hold (AND). An empty query passes
/// everything through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsQuery {
    /// Inclusive lower bound on the day
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the day
    pub end_date: Option<NaiveDate>,
    pub year_month: Option<YearMonth>,
    pub year: Option<i32>,
    /// Record kind, `None` for all. Only applies to raw records.
    pub kind: Option<RecordKind>,
    /// Record status, `None` for all. Only applies to raw records.
    pub status: Option<RecordStatus>,
}

impl StatsQuery {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    pub fn for_month(year_month: YearMonth) -> Self {
        Self {
            year_month: Some(year_month),
            ..Self::default()
        }
    }

    pub fn for_year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the date predicates against one day.
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
            && self.year_month.map_or(true, |ym| ym.contains(date))
            && self.year.map_or(true, |year| date.year() == year)
    }

    /// Check every predicate against one record.
    pub fn matches_record(&self, record: &Record) -> bool {
        self.kind.map_or(true, |kind| record.kind == kind)
            && self.status.map_or(true, |status| record.status == status)
            && self.matches_date(record.date())
    }
}

/// Keep the day summaries that satisfy the query's date predicates.
///
/// Relative order is preserved. `kind` and `status` are ignored since a day
/// summary mixes kinds.
pub fn filter_stats(days: &[DayStats], query: &StatsQuery) -> Vec<DayStats> {
    days.iter()
        .filter(|day| query.matches_date(day.date))
        .cloned()
        .collect()
}

/// Keep the raw records that satisfy every predicate, order preserved.
pub fn filter_records(records: &[Record], query: &StatsQuery) -> Vec<Record> {
    records
        .iter()
        .filter(|record| query.matches_record(record))
        .cloned()
        .collect()
}
