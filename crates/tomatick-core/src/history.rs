//! Log of finished sessions, newest first.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};

/// One completed or skipped interval. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub mode_label: String,
    pub duration_seconds: u64,
    pub completed_at_epoch_millis: i64,
}

/// Entry shape written by the browser version, which appended to the end of
/// its array.
#[derive(Deserialize)]
struct LegacyEntry {
    mode: String,
    duration: u64,
    timestamp: i64,
}

impl From<LegacyEntry> for HistoryEntry {
    fn from(legacy: LegacyEntry) -> Self {
        Self {
            mode_label: legacy.mode,
            duration_seconds: legacy.duration,
            completed_at_epoch_millis: legacy.timestamp,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Current(HistoryEntry),
    Legacy(LegacyEntry),
}

impl HistoryEntry {
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.completed_at_epoch_millis).single()
    }

    /// `Pomodoro - 25 mins - 2026-10-19 14:03`, or seconds under a minute.
    pub fn describe(&self) -> String {
        let amount = if self.duration_seconds >= 60 {
            let mins = self.duration_seconds as f64 / 60.0;
            format!("{} mins", trim_float(mins))
        } else {
            format!("{} seconds", self.duration_seconds)
        };
        let when = self
            .completed_at()
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown time".into());
        format!("{} - {} - {}", self.mode_label, amount, when)
    }
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{value:.1}")
    }
}

/// Per-label aggregate over the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total_sessions: u64,
    pub total_seconds: u64,
    pub by_label: BTreeMap<String, LabelStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelStats {
    pub sessions: u64,
    pub seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

/// Arrays made only of legacy entries are oldest-first and get reversed.
/// Anything else is already newest-first.
impl<'de> Deserialize<'de> for HistoryLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = Vec::<StoredEntry>::deserialize(deserializer)?;
        let oldest_first =
            !stored.is_empty() && stored.iter().all(|e| matches!(e, StoredEntry::Legacy(_)));
        let mut entries: Vec<HistoryEntry> = stored
            .into_iter()
            .map(|e| match e {
                StoredEntry::Current(entry) => entry,
                StoredEntry::Legacy(legacy) => legacy.into(),
            })
            .collect();
        if oldest_first {
            entries.reverse();
        }
        Ok(Self { entries })
    }
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap entries that are already newest-first.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
    }

    /// Remove the entry at `index`. The log is untouched on error.
    pub fn remove(&mut self, index: usize) -> Result<HistoryEntry> {
        if index >= self.entries.len() {
            return Err(CoreError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> HistoryStats {
        let mut stats = HistoryStats::default();
        for entry in &self.entries {
            stats.total_sessions += 1;
            stats.total_seconds += entry.duration_seconds;
            let label = stats.by_label.entry(entry.mode_label.clone()).or_default();
            label.sessions += 1;
            label.seconds += entry.duration_seconds;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, secs: u64, at: i64) -> HistoryEntry {
        HistoryEntry {
            mode_label: label.into(),
            duration_seconds: secs,
            completed_at_epoch_millis: at,
        }
    }

    #[test]
    fn append_prepends() {
        let mut log = HistoryLog::new();
        log.append(entry("A", 25, 1));
        log.append(entry("B", 5, 2));
        let labels: Vec<_> = log.all().iter().map(|e| e.mode_label.as_str()).collect();
        assert_eq!(labels, ["B", "A"]);
    }

    #[test]
    fn remove_middle_entry() {
        let mut log = HistoryLog::new();
        log.append(entry("C", 1, 3));
        log.append(entry("B", 1, 2));
        log.append(entry("A", 1, 1));
        let removed = log.remove(1).unwrap();
        assert_eq!(removed.mode_label, "B");
        let labels: Vec<_> = log.all().iter().map(|e| e.mode_label.as_str()).collect();
        assert_eq!(labels, ["A", "C"]);
    }

    #[test]
    fn remove_out_of_range_leaves_log_untouched() {
        let mut log = HistoryLog::from_entries(vec![entry("A", 1, 1)]);
        let err = log.remove(1).unwrap_err();
        assert!(matches!(err, CoreError::IndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn clear_empty_log_is_fine() {
        let mut log = HistoryLog::new();
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn legacy_entry_fields_are_accepted() {
        let json = r#"[{"mode":"Pomodoro","duration":1500,"timestamp":1700000000000}]"#;
        let log: HistoryLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.all()[0], entry("Pomodoro", 1500, 1_700_000_000_000));
    }

    #[test]
    fn legacy_log_is_reordered_newest_first() {
        let json = r#"[
            {"mode":"Pomodoro","duration":1500,"timestamp":1},
            {"mode":"Short Break","duration":300,"timestamp":2},
            {"mode":"Pomodoro","duration":1500,"timestamp":3}
        ]"#;
        let mut log: HistoryLog = serde_json::from_str(json).unwrap();
        let stamps: Vec<_> = log.all().iter().map(|e| e.completed_at_epoch_millis).collect();
        assert_eq!(stamps, [3, 2, 1]);

        log.append(entry("Long Break", 600, 4));
        let stamps: Vec<_> = log.all().iter().map(|e| e.completed_at_epoch_millis).collect();
        assert_eq!(stamps, [4, 3, 2, 1]);
    }

    #[test]
    fn current_log_keeps_its_order() {
        let log = HistoryLog::from_entries(vec![entry("B", 5, 2), entry("A", 25, 1)]);
        let json = serde_json::to_string(&log).unwrap();
        let back: HistoryLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let log = HistoryLog::from_entries(vec![entry("Short Break", 300, 5)]);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json[0]["modeLabel"], "Short Break");
        assert_eq!(json[0]["durationSeconds"], 300);
        assert_eq!(json[0]["completedAtEpochMillis"], 5);
    }

    #[test]
    fn describe_uses_minutes_or_seconds() {
        assert!(entry("Pomodoro", 1500, 0).describe().starts_with("Pomodoro - 25 mins - "));
        assert!(entry("Pomodoro", 25, 0).describe().starts_with("Pomodoro - 25 seconds - "));
        assert!(entry("Pomodoro", 90, 0).describe().starts_with("Pomodoro - 1.5 mins - "));
    }

    #[test]
    fn stats_group_by_label() {
        let log = HistoryLog::from_entries(vec![
            entry("Pomodoro", 1500, 3),
            entry("Short Break", 300, 2),
            entry("Pomodoro", 1500, 1),
        ]);
        let stats = log.stats();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_seconds, 3300);
        assert_eq!(stats.by_label["Pomodoro"].sessions, 2);
        assert_eq!(stats.by_label["Short Break"].seconds, 300);
    }
}
