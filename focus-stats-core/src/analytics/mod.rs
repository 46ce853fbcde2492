//! Aggregation engine for focus-stats
//!
//! Turns an unordered slice of [`Record`]s into derived rollups:
//! - Day summaries with a productivity index ([`day`])
//! - Month, week and year rollups ([`period`])
//! - Current and longest streaks ([`streak`])
//! - A whole-history snapshot ([`overall`])
//! - Month/week comparisons against the previous period ([`comparison`])
//!
//! Everything here is a pure, synchronous function of its inputs. Nothing
//! reads the wall clock: callers pass "today" and "now" explicitly.

pub mod comparison;
pub mod day;
pub mod overall;
pub mod period;
pub mod streak;

pub use comparison::{compute_comparison, growth_rate};
pub use day::{compute_day_stats, productivity, DAILY_TARGET_SECONDS};
pub use overall::compute_overall_stats;
pub use period::{compute_month_stats, compute_week_stats, compute_year_stats};
pub use streak::{current_streak, longest_run, longest_streak, StreakRun};

use chrono::{DateTime, NaiveDate, Utc};

use crate::index::build_session_index;
use crate::types::{Record, Session, StatsCacheData};

/// Compute everything the cache persists in one pass.
///
/// Produces a month rollup for every month that has records, the overall
/// snapshot anchored at `today`, and the session index, stamped at `now`.
pub fn build_cache_data(
    sessions: &[Session],
    records: &[Record],
    today: NaiveDate,
    now: DateTime<Utc>,
    ttl: u64,
) -> StatsCacheData {
    let mut data = StatsCacheData::new(now, ttl);

    for month in period::months_from_days(day::active_days(records)) {
        data.insert_month(month.year_month, month);
    }

    data.set_overall(compute_overall_stats(sessions, records, today));
    data.session_index = build_session_index(records);

    tracing::debug!(
        months = data.monthly_stats.len(),
        index_entries = data.session_index.len(),
        "Built cache data"
    );

    data
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{Record, RecordKind, RecordStatus, YearMonth};
    use chrono::{DateTime, Duration, NaiveDate, Utc};

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    pub fn make_record(
        id: i64,
        start_at: &str,
        elapsed_seconds: u64,
        kind: RecordKind,
        status: RecordStatus,
    ) -> Record {
        let start: DateTime<Utc> = start_at.parse().unwrap();
        Record {
            id,
            kind,
            status,
            round: 1,
            start_at: start,
            end_at: start + Duration::seconds(elapsed_seconds as i64),
            elapsed_seconds,
            related_todo_id: None,
        }
    }

    /// A completed focus record.
    pub fn record(id: i64, start_at: &str, elapsed_seconds: u64) -> Record {
        make_record(
            id,
            start_at,
            elapsed_seconds,
            RecordKind::Focus,
            RecordStatus::Completed,
        )
    }

    /// A completed rest record.
    pub fn rest(id: i64, start_at: &str, elapsed_seconds: u64) -> Record {
        make_record(
            id,
            start_at,
            elapsed_seconds,
            RecordKind::Rest,
            RecordStatus::Completed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{date, record, rest, ym};
    use super::*;
    use crate::types::{CURRENT_CACHE_VERSION, DEFAULT_CACHE_TTL_MS};

    #[test]
    fn test_build_cache_data() {
        let records = vec![
            record(1, "2024-12-02T08:00:00Z", 1800),
            record(2, "2024-11-29T08:00:00Z", 3600),
            rest(3, "2024-11-30T08:00:00Z", 300),
            record(4, "2024-12-01T08:00:00Z", 900),
        ];
        let now = Utc::now();

        let data = build_cache_data(&[], &records, date("2024-12-02"), now, DEFAULT_CACHE_TTL_MS);

        assert_eq!(data.version, CURRENT_CACHE_VERSION);
        assert_eq!(data.last_update_time, now.timestamp_millis());
        let months: Vec<_> = data.monthly_stats.keys().copied().collect();
        assert_eq!(months, vec![ym("2024-11"), ym("2024-12")]);
        assert_eq!(
            data.monthly_stats[&ym("2024-11")],
            compute_month_stats(&records, ym("2024-11"))
        );
        assert_eq!(
            data.monthly_stats[&ym("2024-12")],
            compute_month_stats(&records, ym("2024-12"))
        );
        assert_eq!(
            data.overall_stats,
            compute_overall_stats(&[], &records, date("2024-12-02"))
        );
        assert_eq!(data.overall_stats.current_streak, 4);

        let ids: Vec<_> = data.session_index.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_build_cache_data_empty() {
        let data = build_cache_data(&[], &[], date("2024-12-02"), Utc::now(), 1000);
        assert!(data.monthly_stats.is_empty());
        assert!(data.session_index.is_empty());
        assert_eq!(data.ttl, 1000);
        assert_eq!(data.overall_stats.start_date, None);
    }
}
