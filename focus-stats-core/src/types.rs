//! Core domain types for focus-stats
//!
//! Two families of types live here:
//!
//! - **Raw records** ([`Record`], [`Session`]) as supplied by the timer's data
//!   source. These use the source's `snake_case` field names.
//! - **Derived rollups** ([`DayStats`], [`MonthStats`], [`WeekStats`],
//!   [`YearStats`], [`OverallStats`], [`SessionIndexEntry`],
//!   [`StatsCacheData`]). These are immutable value snapshots that serialize
//!   with the `camelCase` names of the persisted cache schema.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Focus record** | A concentration interval; the only kind that counts toward productivity |
//! | **Rest record** | A break interval; counted in `total_records` only |
//! | **Active day** | A calendar day with at least one record of any kind |
//! | **Streak** | A maximal run of consecutive active days |
//!
//! Calendar days are UTC days of a record's `start_at`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================
// Raw records
// ============================================

/// Kind of a timer interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Concentration interval
    Focus,
    /// Break interval
    Rest,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Focus => "focus",
            RecordKind::Rest => "rest",
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" => Ok(RecordKind::Focus),
            "rest" => Ok(RecordKind::Rest),
            _ => Err(format!("unknown record kind: {}", s)),
        }
    }
}

/// How a timer interval ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Ran to the end of its planned duration
    Completed,
    /// Stopped early by the human
    Stopped,
    /// Skipped without running
    Skipped,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Completed => "completed",
            RecordStatus::Stopped => "stopped",
            RecordStatus::Skipped => "skipped",
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(RecordStatus::Completed),
            "stopped" => Ok(RecordStatus::Stopped),
            "skipped" => Ok(RecordStatus::Skipped),
            _ => Err(format!("unknown record status: {}", s)),
        }
    }
}

/// One atomic focus or rest interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Caller-assigned unique identifier
    pub id: i64,
    pub kind: RecordKind,
    pub status: RecordStatus,
    /// Pomodoro round within its session
    #[serde(default)]
    pub round: i32,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Time actually elapsed, in seconds
    pub elapsed_seconds: u64,
    /// Task this interval was started from (if any)
    #[serde(default)]
    pub related_todo_id: Option<i64>,
}

impl Record {
    /// The calendar day this record is attributed to.
    pub fn date(&self) -> NaiveDate {
        self.start_at.date_naive()
    }

    pub fn is_focus(&self) -> bool {
        self.kind == RecordKind::Focus
    }

    /// Seconds contributing to productivity totals (zero for rest records).
    pub fn focus_seconds(&self) -> u64 {
        if self.is_focus() {
            self.elapsed_seconds
        } else {
            0
        }
    }
}

/// A timer session grouping several records.
///
/// Auxiliary metadata only; it never participates in aggregation arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================
// Calendar helpers
// ============================================

/// A calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a month, returning `None` when `month` is outside 1-12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid year-month (expected YYYY-MM): {}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in year-month: {}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in year-month: {}", s))?;
        YearMonth::new(year, month).ok_or_else(|| format!("month must be between 1 and 12: {}", s))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Epoch milliseconds of the UTC midnight that starts `date`.
pub fn day_timestamp_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

// ============================================
// Derived rollups
// ============================================

/// Whether anything happened on a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// No records
    #[default]
    Idle,
    /// At least one record of any kind, even a zero-length rest
    Active,
}

/// Summary of a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    /// Calendar day, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    /// Start-of-day instant, epoch milliseconds
    pub timestamp: i64,
    /// Sum of focus seconds
    pub total_seconds: u64,
    /// Number of focus records
    pub completed_sessions: u64,
    /// Number of records of any kind
    pub total_records: u64,
    /// 0-100, relative to the daily target
    pub productivity: u32,
    pub status: DayStatus,
}

impl DayStats {
    /// Zero-valued stats for a day without records.
    pub fn idle(date: NaiveDate) -> Self {
        Self {
            date,
            timestamp: day_timestamp_ms(date),
            total_seconds: 0,
            completed_sessions: 0,
            total_records: 0,
            productivity: 0,
            status: DayStatus::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == DayStatus::Active
    }
}

/// Rollup of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthStats {
    pub year_month: YearMonth,
    /// Only days with at least one record, ascending
    pub days: Vec<DayStats>,
    pub total_seconds: u64,
    /// Focus records in the month
    pub total_sessions: u64,
    pub avg_session_duration: u64,
    pub active_days: u64,
    pub most_productive_day: Option<NaiveDate>,
    pub max_productivity: u32,
}

/// Seven consecutive days starting at an anchor date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekStats {
    /// ISO week of the anchor, `YYYY-Www`
    pub year_week: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Exactly seven entries, idle days included
    pub days: Vec<DayStats>,
    pub total_seconds: u64,
    pub total_sessions: u64,
    pub active_days: u64,
    pub avg_daily_seconds: u64,
}

/// Rollup of one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearStats {
    pub year: i32,
    /// Months with at least one record, ascending
    pub months: Vec<MonthStats>,
    pub total_seconds: u64,
    pub total_sessions: u64,
    pub total_active_days: u64,
    pub avg_productivity: u32,
}

/// Totals across the whole record history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_seconds: u64,
    pub total_sessions: u64,
    pub current_streak: u64,
    pub longest_streak: u64,
    pub avg_daily_seconds: u64,
    pub avg_session_duration: u64,
    /// Month with the most focus seconds
    pub most_productive_month: Option<YearMonth>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_active_days: u64,
    /// Unweighted mean of day productivity
    pub overall_productivity: u32,
}

/// Compact, date-sortable projection of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIndexEntry {
    pub id: i64,
    /// Start of the record's day, epoch milliseconds
    pub date_timestamp: i64,
    pub kind: RecordKind,
    pub status: RecordStatus,
    pub elapsed_seconds: u64,
    /// `YYYY-MM-DD`
    pub date_str: NaiveDate,
}

/// Side-by-side view of the current and previous periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonData {
    pub this_month: Vec<DayStats>,
    pub last_month: Vec<DayStats>,
    pub week_comparison: WeekComparison,
    /// Percent change of month focus seconds vs. the previous month
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekComparison {
    pub this_week: WeekStats,
    pub last_week: WeekStats,
}

// ============================================
// Cache payload
// ============================================

/// Schema version written into every cache blob
pub const CURRENT_CACHE_VERSION: u32 = 1;

/// Default cache lifetime: 24 hours
pub const DEFAULT_CACHE_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// Everything the cache persists in its single slot.
///
/// Derived and rebuildable; raw records stay the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsCacheData {
    pub version: u32,
    /// When the blob was last written, epoch milliseconds
    pub last_update_time: i64,
    pub monthly_stats: BTreeMap<YearMonth, MonthStats>,
    pub overall_stats: OverallStats,
    #[serde(default)]
    pub session_index: Vec<SessionIndexEntry>,
    /// Lifetime in milliseconds
    #[serde(default = "default_ttl")]
    pub ttl: u64,
}

fn default_ttl() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

impl StatsCacheData {
    /// An empty cache payload stamped at `now`.
    pub fn new(now: DateTime<Utc>, ttl: u64) -> Self {
        Self {
            version: CURRENT_CACHE_VERSION,
            last_update_time: now.timestamp_millis(),
            monthly_stats: BTreeMap::new(),
            overall_stats: OverallStats::default(),
            session_index: Vec::new(),
            ttl,
        }
    }

    /// Insert or replace the rollup for one month.
    pub fn insert_month(&mut self, year_month: YearMonth, stats: MonthStats) {
        self.monthly_stats.insert(year_month, stats);
    }

    pub fn set_overall(&mut self, stats: OverallStats) {
        self.overall_stats = stats;
    }

    /// `last_update_time` as an instant.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_update_time)
    }

    /// Whether the TTL has run out at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let age = now.timestamp_millis() - self.last_update_time;
        age > 0 && age as u64 > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_year_month_parse_and_display() {
        let ym: YearMonth = "2024-12".parse().unwrap();
        assert_eq!(ym.year(), 2024);
        assert_eq!(ym.month(), 12);
        assert_eq!(ym.to_string(), "2024-12");
        assert_eq!("2024-3".parse::<YearMonth>().unwrap().to_string(), "2024-03");

        assert!("2024".parse::<YearMonth>().is_err());
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("abcd-01".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_previous() {
        let jan = YearMonth::new(2024, 1).unwrap();
        assert_eq!(jan.previous(), YearMonth::new(2023, 12).unwrap());
        let dec = YearMonth::new(2024, 12).unwrap();
        assert_eq!(dec.previous(), YearMonth::new(2024, 11).unwrap());
    }

    #[test]
    fn test_year_month_serializes_as_string() {
        let ym = YearMonth::new(2024, 11).unwrap();
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"2024-11\"");

        let mut map = BTreeMap::new();
        map.insert(ym, 1);
        assert_eq!(serde_json::to_string(&map).unwrap(), "{\"2024-11\":1}");
        let back: BTreeMap<YearMonth, i32> = serde_json::from_str("{\"2024-11\":1}").unwrap();
        assert_eq!(back.get(&ym), Some(&1));
    }

    #[test]
    fn test_record_kind_status_roundtrip_strings() {
        assert_eq!("focus".parse::<RecordKind>().unwrap(), RecordKind::Focus);
        assert_eq!(RecordKind::Rest.as_str(), "rest");
        assert_eq!(
            "skipped".parse::<RecordStatus>().unwrap(),
            RecordStatus::Skipped
        );
        assert!("paused".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn test_record_deserializes_from_source_shape() {
        let json = r#"{
            "id": 7,
            "kind": "rest",
            "status": "stopped",
            "round": 2,
            "start_at": "2024-12-01T23:30:00Z",
            "end_at": "2024-12-02T00:10:00Z",
            "elapsed_seconds": 2400,
            "related_todo_id": null
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, RecordKind::Rest);
        assert_eq!(record.status, RecordStatus::Stopped);
        // Attributed to the day it started
        assert_eq!(record.date(), date("2024-12-01"));
        assert_eq!(record.focus_seconds(), 0);
    }

    #[test]
    fn test_day_stats_wire_names() {
        let stats = DayStats::idle(date("2024-12-01"));
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["date"], "2024-12-01");
        assert_eq!(value["timestamp"], 1_733_011_200_000i64);
        assert_eq!(value["totalSeconds"], 0);
        assert_eq!(value["completedSessions"], 0);
        assert_eq!(value["status"], "idle");
    }

    #[test]
    fn test_new_cache_data() {
        let now = Utc::now();
        let data = StatsCacheData::new(now, DEFAULT_CACHE_TTL_MS);
        assert_eq!(data.version, 1);
        assert!(data.monthly_stats.is_empty());
        assert!(data.session_index.is_empty());
        assert_eq!(data.ttl, 86_400_000);
        assert_eq!(data.last_update_time, now.timestamp_millis());
        assert_eq!(data.overall_stats, OverallStats::default());
    }

    #[test]
    fn test_cache_data_expiry() {
        let now = Utc::now();
        let data = StatsCacheData::new(now, 100);
        assert!(!data.is_expired_at(now));
        assert!(!data.is_expired_at(now + chrono::Duration::milliseconds(100)));
        assert!(data.is_expired_at(now + chrono::Duration::milliseconds(150)));
    }

    #[test]
    fn test_cache_data_update_helpers() {
        let mut data = StatsCacheData::new(Utc::now(), DEFAULT_CACHE_TTL_MS);
        let nov = YearMonth::new(2024, 11).unwrap();
        let dec = YearMonth::new(2024, 12).unwrap();
        data.insert_month(
            nov,
            MonthStats {
                year_month: nov,
                days: vec![],
                total_seconds: 5400,
                total_sessions: 3,
                avg_session_duration: 1800,
                active_days: 3,
                most_productive_day: Some(date("2024-11-20")),
                max_productivity: 75,
            },
        );
        data.insert_month(
            dec,
            MonthStats {
                year_month: dec,
                days: vec![],
                total_seconds: 10800,
                total_sessions: 6,
                avg_session_duration: 1800,
                active_days: 5,
                most_productive_day: Some(date("2024-12-10")),
                max_productivity: 95,
            },
        );
        assert_eq!(data.monthly_stats.len(), 2);
        assert_eq!(data.monthly_stats[&nov].total_seconds, 5400);
        assert_eq!(data.monthly_stats[&dec].max_productivity, 95);

        let overall = OverallStats {
            total_seconds: 50_000,
            total_sessions: 28,
            ..Default::default()
        };
        data.set_overall(overall.clone());
        assert_eq!(data.overall_stats, overall);
    }
}
