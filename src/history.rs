//! Session history of submissions.
//!
//! The log is append-only and ordered most recent first. It lives for the session only;
//! the CLI can export it but never reads it back.

use crate::model::{FilterOption, HistoryEntry, HistoryOutcome, SubmissionResult};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    #[serde(skip)]
    last_id: u64,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry. No bound, no deduplication.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.last_id = self.last_id.max(entry.id);
        self.entries.push_front(entry);
    }

    /// Build an entry stamped with the current local time and record it.
    pub fn record_outcome(
        &mut self,
        filename: Option<&str>,
        filter: FilterOption,
        result: Option<SubmissionResult>,
    ) -> HistoryEntry {
        let outcome = match result {
            Some(result) => HistoryOutcome::Success { result },
            None => HistoryOutcome::Error,
        };
        let entry = HistoryEntry {
            id: self.next_id(now_millis()),
            filename: filename
                .unwrap_or(crate::model::UNKNOWN_FILENAME)
                .to_string(),
            filter,
            timestamp: local_timestamp(),
            outcome,
        };
        self.record(entry.clone());
        entry
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Millisecond timestamps collide on rapid resubmits; bump past the last id instead.
    fn next_id(&self, now_ms: u64) -> u64 {
        if now_ms > self.last_id {
            now_ms
        } else {
            self.last_id + 1
        }
    }
}

fn now_millis() -> u64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    u64::try_from(nanos / 1_000_000).unwrap_or(0)
}

/// Local wall-clock time as `DD/MM/YYYY, HH:MM:SS`, UTC when the offset is unknown.
pub fn local_timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(time::macros::format_description!(
        "[day]/[month]/[year], [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| now.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, filename: &str) -> HistoryEntry {
        HistoryEntry {
            id,
            filename: filename.into(),
            filter: FilterOption::Audited,
            timestamp: "01/01/2026, 00:00:00".into(),
            outcome: HistoryOutcome::Error,
        }
    }

    #[test]
    fn record_keeps_most_recent_first() {
        let mut log = HistoryLog::new();
        for i in 1..=5 {
            log.record(entry(i, &format!("f{i}.xlsx")));
            assert_eq!(log.latest().map(|e| e.id), Some(i));
        }
        let ids: Vec<u64> = log.entries().map(|e| e.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn record_does_not_deduplicate() {
        let mut log = HistoryLog::new();
        log.record(entry(7, "same.xlsx"));
        log.record(entry(7, "same.xlsx"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn ids_stay_strictly_increasing() {
        let mut log = HistoryLog::new();
        log.record(entry(1_000, "a.xlsx"));
        assert_eq!(log.next_id(999), 1_001);
        assert_eq!(log.next_id(1_000), 1_001);
        assert_eq!(log.next_id(2_000), 2_000);
    }

    #[test]
    fn record_outcome_uses_placeholder_without_file() {
        let mut log = HistoryLog::new();
        let first = log.record_outcome(None, FilterOption::All, None);
        let second = log.record_outcome(
            Some("planilha.xlsx"),
            FilterOption::Audited,
            Some(SubmissionResult {
                total_rows: Some(3),
                ..Default::default()
            }),
        );

        assert_eq!(first.filename, crate::model::UNKNOWN_FILENAME);
        assert!(!first.is_success());
        assert!(second.is_success());
        assert!(second.id > first.id);
        assert_eq!(log.latest(), Some(&second));
    }

    #[test]
    fn serializes_as_array() {
        let mut log = HistoryLog::new();
        log.record(entry(1, "a.xlsx"));
        let v = serde_json::to_value(&log).unwrap();
        assert!(v.is_array());
        assert_eq!(v[0]["filename"], "a.xlsx");
    }
}
