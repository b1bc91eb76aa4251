//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not own a clock
//! or a thread - whoever schedules the countdown calls `tick()` once per
//! second while the engine is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Idle            (pause)
//! Running -(time left hits 0)-> Idle (complete, mode advances)
//! any -(skip)-> Idle                 (complete early, mode advances)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(ModeCatalog::default());
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Event::SessionCompleted when the interval ends
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::history::HistoryEntry;
use crate::modes::{ModeCatalog, ModeDefinition, ModeId};
use crate::view::format_clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
}

/// How a finished interval's duration is recorded in the history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPolicy {
    /// The mode's full duration, even when the interval was skipped early.
    #[default]
    Full,
    /// Only the seconds that actually elapsed.
    Elapsed,
}

/// The persisted countdown record (`timerData`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub mode: ModeId,
    #[serde(alias = "timeLeft")]
    pub time_left_seconds: u64,
    #[serde(alias = "cycles")]
    pub cycles_completed: u32,
    pub is_running: bool,
}

impl TimerState {
    /// A pomodoro at full duration, zero cycles, not running.
    pub fn fresh(catalog: &ModeCatalog) -> Self {
        Self {
            mode: ModeId::Pomodoro,
            time_left_seconds: catalog.mode(ModeId::Pomodoro).duration_seconds,
            cycles_completed: 0,
            is_running: false,
        }
    }

    pub fn status(&self) -> TimerStatus {
        if self.is_running {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        }
    }
}

/// Core timer engine.
///
/// Sole owner of the [`TimerState`]. Commands return the [`Event`] they
/// produced, or `None` when they were a no-op.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    catalog: ModeCatalog,
    state: TimerState,
    policy: DurationPolicy,
}

impl TimerEngine {
    pub fn new(catalog: ModeCatalog) -> Self {
        let state = TimerState::fresh(&catalog);
        Self {
            catalog,
            state,
            policy: DurationPolicy::default(),
        }
    }

    /// Rebuild an engine from a persisted record.
    ///
    /// Time left is clamped to the mode's duration and the engine comes back
    /// idle: no countdown outlives the process that scheduled it.
    pub fn restore(catalog: ModeCatalog, mut state: TimerState) -> Self {
        let duration = catalog.mode(state.mode).duration_seconds;
        state.time_left_seconds = state.time_left_seconds.min(duration);
        state.is_running = false;
        Self {
            catalog,
            state,
            policy: DurationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DurationPolicy) -> Self {
        self.policy = policy;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn catalog(&self) -> &ModeCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> DurationPolicy {
        self.policy
    }

    pub fn current_mode(&self) -> &ModeDefinition {
        self.catalog.mode(self.state.mode)
    }

    /// 0.0 .. 100.0 share of the current interval still left.
    pub fn remaining_pct(&self) -> f64 {
        let total = self.current_mode().duration_seconds;
        if total == 0 {
            return 0.0;
        }
        self.state.time_left_seconds as f64 / total as f64 * 100.0
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let mode = self.current_mode();
        Event::StateSnapshot {
            status: self.status(),
            mode: self.state.mode,
            label: mode.label.clone(),
            clock: format_clock(self.state.time_left_seconds),
            time_left_secs: self.state.time_left_seconds,
            duration_secs: mode.duration_seconds,
            remaining_pct: self.remaining_pct(),
            cycles_completed: self.state.cycles_completed,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.state.is_running = true;
        Some(Event::TimerStarted {
            mode: self.state.mode,
            time_left_secs: self.state.time_left_seconds,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        Some(Event::TimerPaused {
            mode: self.state.mode,
            time_left_secs: self.state.time_left_seconds,
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `TimerTicked` while time remains, `SessionCompleted` when the
    /// tick lands on zero, and `None` while idle.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        if self.state.time_left_seconds == 0 {
            return Some(self.complete());
        }
        self.state.time_left_seconds -= 1;
        Some(Event::TimerTicked {
            mode: self.state.mode,
            time_left_secs: self.state.time_left_seconds,
            at: Utc::now(),
        })
    }

    /// Finish the current interval and advance to the next mode.
    ///
    /// Allowed while idle. The returned event carries the history entry.
    pub fn complete(&mut self) -> Event {
        self.finish(false)
    }

    /// Complete the current interval regardless of the time left.
    pub fn skip(&mut self) -> Event {
        self.finish(true)
    }

    /// Stop and refill the current interval. Mode and cycles are kept.
    pub fn reset(&mut self) -> Event {
        self.state.is_running = false;
        self.state.time_left_seconds = self.current_mode().duration_seconds;
        Event::TimerReset {
            mode: self.state.mode,
            time_left_secs: self.state.time_left_seconds,
            at: Utc::now(),
        }
    }

    /// Swap in an edited catalog, clamping time left to the new duration.
    pub fn set_catalog(&mut self, catalog: ModeCatalog) {
        self.catalog = catalog;
        let duration = self.current_mode().duration_seconds;
        self.state.time_left_seconds = self.state.time_left_seconds.min(duration);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, skipped: bool) -> Event {
        self.state.is_running = false;

        let from_mode = self.state.mode;
        let finished = self.catalog.mode(from_mode);
        let duration_seconds = match self.policy {
            DurationPolicy::Full => finished.duration_seconds,
            DurationPolicy::Elapsed => finished
                .duration_seconds
                .saturating_sub(self.state.time_left_seconds),
        };
        let at = Utc::now();
        let entry = HistoryEntry {
            mode_label: finished.label.clone(),
            duration_seconds,
            completed_at_epoch_millis: at.timestamp_millis(),
        };

        let (to_mode, cycles) = self.catalog.next(from_mode, self.state.cycles_completed);
        self.state.mode = to_mode;
        self.state.cycles_completed = cycles;
        self.state.time_left_seconds = self.catalog.mode(to_mode).duration_seconds;

        Event::SessionCompleted {
            from_mode,
            to_mode,
            cycles_completed: cycles,
            skipped,
            entry,
            at,
        }
    }
}
