//! Current-versus-previous period comparison.

use chrono::{Days, NaiveDate};

use super::period::{compute_month_stats, compute_week_stats};
use crate::types::{ComparisonData, Record, WeekComparison, YearMonth};

/// Compare the month and week containing `today` against the ones before.
///
/// The weeks are the seven days ending at `today` and the seven days before
/// those. `growth_rate` compares month focus seconds.
pub fn compute_comparison(records: &[Record], today: NaiveDate) -> ComparisonData {
    let this_month = YearMonth::of(today);
    let this_month_stats = compute_month_stats(records, this_month);
    let last_month_stats = compute_month_stats(records, this_month.previous());

    let this_week_start = today.checked_sub_days(Days::new(6)).unwrap_or(NaiveDate::MIN);
    let last_week_start = this_week_start
        .checked_sub_days(Days::new(7))
        .unwrap_or(NaiveDate::MIN);

    ComparisonData {
        growth_rate: growth_rate(
            this_month_stats.total_seconds,
            last_month_stats.total_seconds,
        ),
        this_month: this_month_stats.days,
        last_month: last_month_stats.days,
        week_comparison: WeekComparison {
            this_week: compute_week_stats(records, this_week_start),
            last_week: compute_week_stats(records, last_week_start),
        },
    }
}

/// Percent change from `previous` to `current`.
///
/// Growth from nothing is reported as 100%.
pub fn growth_rate(current: u64, previous: u64) -> f64 {
    if previous == 0 {
        if current == 0 {
            0.0
        } else {
            100.0
        }
    } else {
        ((current as f64 - previous as f64) / previous as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{date, record};

    #[test]
    fn test_growth_rate() {
        assert_eq!(growth_rate(123, 100), 23.0);
        assert_eq!(growth_rate(80, 100), -20.0);
        assert_eq!(growth_rate(100, 0), 100.0);
        assert_eq!(growth_rate(0, 0), 0.0);
    }

    #[test]
    fn test_comparison_periods() {
        let records = vec![
            record(1, "2024-11-10T08:00:00Z", 1800),
            record(2, "2024-12-01T08:00:00Z", 1800),
            record(3, "2024-12-09T08:00:00Z", 1800),
            record(4, "2024-12-10T08:00:00Z", 1800),
        ];

        let cmp = compute_comparison(&records, date("2024-12-10"));

        assert_eq!(cmp.this_month.len(), 3);
        assert_eq!(cmp.last_month.len(), 1);
        // 5400 vs 1800
        assert_eq!(cmp.growth_rate, 200.0);

        let this_week = &cmp.week_comparison.this_week;
        assert_eq!(this_week.start_date, date("2024-12-04"));
        assert_eq!(this_week.end_date, date("2024-12-10"));
        assert_eq!(this_week.active_days, 2);

        let last_week = &cmp.week_comparison.last_week;
        assert_eq!(last_week.start_date, date("2024-11-27"));
        assert_eq!(last_week.end_date, date("2024-12-03"));
        assert_eq!(last_week.active_days, 1);
    }
}
