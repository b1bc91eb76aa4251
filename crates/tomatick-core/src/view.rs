//! Render-ready view of the timer, plus the sink traits the session signals.

use serde::Serialize;

use crate::history::HistoryEntry;
use crate::modes::{ModeDefinition, ModeId, Theme};
use crate::timer::TimerEngine;

/// `MM:SS`, zero-padded. Minutes are not wrapped at 60.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerView {
    pub mode: ModeId,
    pub label: String,
    pub clock: String,
    pub remaining_pct: f64,
    pub is_running: bool,
    pub cycles_completed: u32,
    pub theme: Theme,
}

impl TimerView {
    pub fn from_engine(engine: &TimerEngine) -> Self {
        let state = engine.state();
        let mode = engine.current_mode();
        Self {
            mode: state.mode,
            label: mode.label.clone(),
            clock: format_clock(state.time_left_seconds),
            remaining_pct: engine.remaining_pct(),
            is_running: state.is_running,
            cycles_completed: state.cycles_completed,
            theme: mode.theme.clone(),
        }
    }

    /// Label for the start/pause control.
    pub fn toggle_label(&self) -> &'static str {
        if self.is_running {
            "Pause"
        } else {
            "Start"
        }
    }
}

/// Receives everything a display needs to redraw.
pub trait RenderSink {
    /// Clock text and progress. Called on every tick.
    fn render_timer(&mut self, view: &TimerView);
    /// Label and theme colors of the active mode.
    fn render_mode(&mut self, mode: &ModeDefinition);
    fn render_history(&mut self, entries: &[HistoryEntry]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCue {
    /// User started, paused or skipped.
    Click,
    /// An interval finished.
    Alarm,
}

/// Plays cues. Implementations rewind a cue to the start before playing it.
pub trait AudioSink {
    fn play(&mut self, cue: AudioCue);
}

/// Sink that drops every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn render_timer(&mut self, _view: &TimerView) {}
    fn render_mode(&mut self, _mode: &ModeDefinition) {}
    fn render_history(&mut self, _entries: &[HistoryEntry]) {}
}

impl AudioSink for NullSink {
    fn play(&mut self, _cue: AudioCue) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::ModeCatalog;

    #[test]
    fn clock_is_zero_padded() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(5), "00:05");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(100 * 60 + 9), "100:09");
    }

    #[test]
    fn view_tracks_engine() {
        let mut catalog = ModeCatalog::default();
        catalog.set_duration(ModeId::Pomodoro, 4).unwrap();
        let mut engine = TimerEngine::new(catalog);
        engine.start();
        engine.tick();

        let view = TimerView::from_engine(&engine);
        assert_eq!(view.clock, "00:03");
        assert_eq!(view.remaining_pct, 75.0);
        assert_eq!(view.label, "Pomodoro");
        assert_eq!(view.theme.accent, "#E85D60");
        assert_eq!(view.toggle_label(), "Pause");
    }
}
