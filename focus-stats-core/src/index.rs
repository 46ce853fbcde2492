//! Date-sorted index over records for range lookups.

use chrono::NaiveDate;

use crate::types::{day_timestamp_ms, Record, SessionIndexEntry};

/// Map every record to its index entry, sorted ascending by day.
///
/// The sort is stable: records sharing a day keep their input order.
pub fn build_session_index(records: &[Record]) -> Vec<SessionIndexEntry> {
    let mut entries: Vec<SessionIndexEntry> = records.iter().map(index_entry).collect();
    entries.sort_by_key(|e| e.date_timestamp);
    entries
}

fn index_entry(record: &Record) -> SessionIndexEntry {
    let date = record.date();
    SessionIndexEntry {
        id: record.id,
        date_timestamp: day_timestamp_ms(date),
        kind: record.kind,
        status: record.status,
        elapsed_seconds: record.elapsed_seconds,
        date_str: date,
    }
}

/// Sorted session index with binary-searched range lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionIndex {
    entries: Vec<SessionIndexEntry>,
}

impl SessionIndex {
    pub fn build(records: &[Record]) -> Self {
        Self {
            entries: build_session_index(records),
        }
    }

    /// Wrap entries loaded from a cache blob. They are re-sorted in case the
    /// blob was produced elsewhere.
    pub fn from_entries(mut entries: Vec<SessionIndexEntry>) -> Self {
        entries.sort_by_key(|e| e.date_timestamp);
        Self { entries }
    }

    pub fn entries(&self) -> &[SessionIndexEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SessionIndexEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose day falls in `[start, end]`, inclusive.
    ///
    /// Returns an empty slice when `start > end`.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> &[SessionIndexEntry] {
        if start > end {
            return &[];
        }
        let lo = self.entries.partition_point(|e| e.date_str < start);
        let hi = self.entries.partition_point(|e| e.date_str <= end);
        &self.entries[lo..hi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{date, record, rest};

    fn sample() -> Vec<Record> {
        vec![
            record(1, "2024-12-03T08:00:00Z", 1800),
            record(2, "2024-12-01T09:00:00Z", 1800),
            rest(3, "2024-12-03T07:00:00Z", 300),
            record(4, "2024-12-01T08:00:00Z", 900),
            record(5, "2024-12-05T08:00:00Z", 600),
        ]
    }

    #[test]
    fn test_index_sorted_and_stable() {
        let index = build_session_index(&sample());

        let ids: Vec<_> = index.iter().map(|e| e.id).collect();
        // Same-day entries keep input order regardless of time of day
        assert_eq!(ids, vec![2, 4, 1, 3, 5]);
        assert!(index
            .windows(2)
            .all(|w| w[0].date_timestamp <= w[1].date_timestamp));
    }

    #[test]
    fn test_index_entry_fields() {
        let index = build_session_index(&[rest(7, "2024-12-01T23:30:00Z", 300)]);

        let entry = &index[0];
        assert_eq!(entry.id, 7);
        assert_eq!(entry.date_str, date("2024-12-01"));
        assert_eq!(entry.date_timestamp, 1_733_011_200_000);
        assert_eq!(entry.elapsed_seconds, 300);
    }

    #[test]
    fn test_index_keeps_every_record() {
        let records = sample();
        let index = build_session_index(&records);

        let mut ids: Vec<_> = index.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(build_session_index(&[]).is_empty());
    }

    #[test]
    fn test_range_lookup() {
        let index = SessionIndex::build(&sample());

        let ids: Vec<_> = index
            .range(date("2024-12-02"), date("2024-12-04"))
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);

        assert_eq!(index.range(date("2024-12-01"), date("2024-12-05")).len(), 5);
        assert!(index.range(date("2024-12-06"), date("2024-12-31")).is_empty());
        assert!(index.range(date("2024-12-05"), date("2024-12-01")).is_empty());
    }

    #[test]
    fn test_from_entries_resorts() {
        let mut entries = build_session_index(&sample());
        entries.reverse();

        let index = SessionIndex::from_entries(entries);

        assert_eq!(index.entries()[0].date_str, date("2024-12-01"));
        assert_eq!(index.range(date("2024-12-05"), date("2024-12-05")).len(), 1);
    }
}
