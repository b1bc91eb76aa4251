use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::HistoryEntry;
use crate::modes::ModeId;
use crate::timer::TimerStatus;

/// Every state change in the system produces an Event.
/// Sinks and the CLI consume them; they are also printed as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: ModeId,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: ModeId,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerTicked {
        mode: ModeId,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    /// An interval ran out or was skipped. `entry` is the history record
    /// for the finished mode.
    SessionCompleted {
        from_mode: ModeId,
        to_mode: ModeId,
        cycles_completed: u32,
        skipped: bool,
        entry: HistoryEntry,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: ModeId,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    HistoryEntryRemoved {
        index: usize,
        entry: HistoryEntry,
        at: DateTime<Utc>,
    },
    HistoryCleared {
        removed: usize,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: TimerStatus,
        mode: ModeId,
        label: String,
        clock: String,
        time_left_secs: u64,
        duration_secs: u64,
        remaining_pct: f64,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
}
