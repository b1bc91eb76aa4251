//! The focus session: one engine, one history, and their collaborators.
//!
//! `FocusSession` is the single access point for everything that mutates the
//! timer or the history. It is opened from the persisted records (or
//! defaults), owns the only live tick task, flushes the affected record
//! after every mutation and signals the render and audio sinks.
//!
//! ```ignore
//! let mut session = FocusSession::open(MemoryStore::new(), ManualScheduler::new(), SessionOptions::default());
//! session.start();
//! session.advance(Duration::from_secs(1)); // one tick
//! ```

use std::time::Duration;

use chrono::Utc;

use crate::error::Result;
use crate::events::Event;
use crate::history::HistoryLog;
use crate::modes::{ModeCatalog, DEFAULT_LONG_BREAK_INTERVAL};
use crate::scheduler::{ManualScheduler, Scheduler, TaskId};
use crate::storage::{KeyValueStore, StateStore};
use crate::timer::{DurationPolicy, TimerEngine, TimerState};
use crate::view::{AudioCue, AudioSink, NullSink, RenderSink, TimerView};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub duration_policy: DurationPolicy,
    pub long_break_interval: u32,
    /// Re-arm the countdown when the persisted record was running.
    pub restore_running: bool,
    pub tick_period: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            duration_policy: DurationPolicy::default(),
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
            restore_running: false,
            tick_period: Duration::from_secs(1),
        }
    }
}

/// User actions coming from the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// The start/pause button. Plays the click cue.
    ToggleClicked,
    /// The keyboard shortcut for start/pause. Silent.
    SpacePressed,
    SkipClicked,
    RemoveHistory(usize),
    /// Clearing only happens once the host has asked for confirmation.
    ClearHistory { confirmed: bool },
}

pub struct FocusSession<K, S> {
    engine: TimerEngine,
    history: HistoryLog,
    store: StateStore<K>,
    scheduler: S,
    tick_task: Option<TaskId>,
    tick_period: Duration,
    render: Box<dyn RenderSink>,
    audio: Box<dyn AudioSink>,
}

/// The persisted records decoded the way [`FocusSession::open`] sees them,
/// without writing anything back. Inspection commands use this directly.
#[derive(Debug, Clone)]
pub struct SavedSession {
    pub engine: TimerEngine,
    pub history: HistoryLog,
    /// The timer record as stored, before clamping and the idle reset.
    pub persisted: TimerState,
}

impl SavedSession {
    pub fn load<K: KeyValueStore>(store: &StateStore<K>, options: &SessionOptions) -> Self {
        let loaded = store.load_catalog();
        let catalog = match loaded.clone().with_long_break_interval(options.long_break_interval) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring long break interval");
                loaded
            }
        };

        let persisted = store.load_timer(&catalog);
        let history = store.load_history();
        let engine =
            TimerEngine::restore(catalog, persisted.clone()).with_policy(options.duration_policy);
        Self {
            engine,
            history,
            persisted,
        }
    }
}

impl<K: KeyValueStore, S: Scheduler> FocusSession<K, S> {
    /// Load the persisted records, falling back to defaults for any that are
    /// absent or unreadable.
    pub fn open(kv: K, scheduler: S, options: SessionOptions) -> Self {
        let store = StateStore::new(kv);
        let SavedSession {
            engine,
            history,
            persisted,
        } = SavedSession::load(&store, &options);

        let mut session = Self {
            engine,
            history,
            store,
            scheduler,
            tick_task: None,
            tick_period: options.tick_period,
            render: Box::new(NullSink),
            audio: Box::new(NullSink),
        };

        if persisted.is_running && options.restore_running {
            tracing::info!(mode = %persisted.mode, "resuming countdown from previous run");
            session.start();
        } else if session.engine.state() != &persisted {
            session.store.flush_timer(session.engine.state());
        }
        session
    }

    pub fn with_render_sink(mut self, sink: impl RenderSink + 'static) -> Self {
        self.render = Box::new(sink);
        self
    }

    pub fn with_audio_sink(mut self, sink: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(sink);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn state(&self) -> &TimerState {
        self.engine.state()
    }

    pub fn catalog(&self) -> &ModeCatalog {
        self.engine.catalog()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn view(&self) -> TimerView {
        TimerView::from_engine(&self.engine)
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    /// The live tick task, if the countdown is scheduled.
    pub fn tick_task(&self) -> Option<TaskId> {
        self.tick_task
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn store(&self) -> &K {
        self.store.inner()
    }

    /// Stop the countdown and hand back the underlying store.
    pub fn into_store(mut self) -> K {
        self.cancel_tick();
        self.store.into_inner()
    }

    // ── Timer commands ───────────────────────────────────────────────

    /// Start the countdown. No-op while already running.
    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start()?;
        if self.tick_task.is_none() {
            self.tick_task = Some(self.scheduler.schedule_repeating(self.tick_period));
        }
        tracing::info!(mode = %self.state().mode, time_left = self.state().time_left_seconds, "timer started");
        self.store.flush_timer(self.engine.state());
        self.render.render_timer(&self.view());
        Some(event)
    }

    /// Stop the countdown. No-op while idle.
    pub fn pause(&mut self) -> Option<Event> {
        let event = self.engine.pause()?;
        self.cancel_tick();
        tracing::info!(mode = %self.state().mode, time_left = self.state().time_left_seconds, "timer paused");
        self.store.flush_timer(self.engine.state());
        self.render.render_timer(&self.view());
        Some(event)
    }

    pub fn toggle(&mut self) -> Option<Event> {
        if self.engine.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Deliver a scheduler firing. Ticks from tasks that are no longer live
    /// are dropped.
    pub fn on_tick(&mut self, task: TaskId) -> Option<Event> {
        if self.tick_task != Some(task) {
            tracing::debug!(task = task.0, "dropping tick from stale task");
            return None;
        }
        self.tick()
    }

    /// One second of countdown. Completes the interval when time left is zero.
    pub fn tick(&mut self) -> Option<Event> {
        match self.engine.tick()? {
            event @ Event::SessionCompleted { .. } => Some(self.settle_completion(event)),
            event => {
                self.store.flush_timer(self.engine.state());
                self.render.render_timer(&self.view());
                Some(event)
            }
        }
    }

    /// Finish the current interval now. Valid while idle.
    pub fn complete(&mut self) -> Event {
        let event = self.engine.complete();
        self.settle_completion(event)
    }

    /// Finish the current interval early.
    pub fn skip(&mut self) -> Event {
        let event = self.engine.skip();
        self.settle_completion(event)
    }

    /// Stop and refill the current interval.
    pub fn reset(&mut self) -> Event {
        self.cancel_tick();
        let event = self.engine.reset();
        self.store.flush_timer(self.engine.state());
        self.render.render_timer(&self.view());
        event
    }

    // ── History commands ─────────────────────────────────────────────

    pub fn remove_history(&mut self, index: usize) -> Result<Event> {
        let entry = self.history.remove(index)?;
        self.store.flush_history(&self.history);
        self.render.render_history(self.history.all());
        Ok(Event::HistoryEntryRemoved {
            index,
            entry,
            at: Utc::now(),
        })
    }

    pub fn clear_history(&mut self) -> Event {
        let removed = self.history.len();
        self.history.clear();
        self.store.flush_history(&self.history);
        self.render.render_history(self.history.all());
        Event::HistoryCleared {
            removed,
            at: Utc::now(),
        }
    }

    // ── Input & configuration ────────────────────────────────────────

    pub fn handle_input(&mut self, input: Input) -> Result<Option<Event>> {
        match input {
            Input::ToggleClicked => {
                self.audio.play(AudioCue::Click);
                Ok(self.toggle())
            }
            Input::SpacePressed => Ok(self.toggle()),
            Input::SkipClicked => {
                self.audio.play(AudioCue::Click);
                Ok(Some(self.skip()))
            }
            Input::RemoveHistory(index) => self.remove_history(index).map(Some),
            Input::ClearHistory { confirmed: true } => Ok(Some(self.clear_history())),
            Input::ClearHistory { confirmed: false } => Ok(None),
        }
    }

    /// Edit the mode catalog and persist it. The edit is discarded on error.
    pub fn update_catalog(
        &mut self,
        edit: impl FnOnce(&mut ModeCatalog) -> Result<()>,
    ) -> Result<()> {
        let mut catalog = self.engine.catalog().clone();
        edit(&mut catalog)?;
        self.engine.set_catalog(catalog);
        self.store.flush_catalog(self.engine.catalog());
        self.store.flush_timer(self.engine.state());
        self.render();
        Ok(())
    }

    /// Push the full state to the render sink.
    pub fn render(&mut self) {
        let view = self.view();
        self.render.render_timer(&view);
        self.render.render_mode(self.engine.current_mode());
        self.render.render_history(self.history.all());
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn cancel_tick(&mut self) {
        if let Some(task) = self.tick_task.take() {
            self.scheduler.cancel(task);
        }
    }

    fn settle_completion(&mut self, event: Event) -> Event {
        self.cancel_tick();
        if let Event::SessionCompleted {
            from_mode,
            to_mode,
            skipped,
            ref entry,
            ..
        } = event
        {
            tracing::info!(from = %from_mode, to = %to_mode, skipped, "interval finished");
            self.history.append(entry.clone());
        }
        self.store.flush_history(&self.history);
        self.store.flush_timer(self.engine.state());
        self.audio.play(AudioCue::Alarm);
        self.render();
        event
    }
}

impl<K: KeyValueStore> FocusSession<K, ManualScheduler> {
    /// Move the virtual clock forward, delivering every firing in order.
    pub fn advance(&mut self, by: Duration) -> Vec<Event> {
        let fired = self.scheduler.advance(by);
        fired
            .into_iter()
            .filter_map(|task| self.on_tick(task))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::history::HistoryEntry;
    use crate::modes::{ModeDefinition, ModeId};
    use crate::error::StorageError;
    use crate::storage::{MemoryStore, TIMER_KEY};

    #[derive(Clone, Default)]
    struct Recorder {
        cues: Rc<RefCell<Vec<AudioCue>>>,
        clocks: Rc<RefCell<Vec<String>>>,
        modes: Rc<RefCell<Vec<String>>>,
        history_lens: Rc<RefCell<Vec<usize>>>,
    }

    impl AudioSink for Recorder {
        fn play(&mut self, cue: AudioCue) {
            self.cues.borrow_mut().push(cue);
        }
    }

    impl RenderSink for Recorder {
        fn render_timer(&mut self, view: &TimerView) {
            self.clocks.borrow_mut().push(view.clock.clone());
        }
        fn render_mode(&mut self, mode: &ModeDefinition) {
            self.modes.borrow_mut().push(mode.label.clone());
        }
        fn render_history(&mut self, entries: &[HistoryEntry]) {
            self.history_lens.borrow_mut().push(entries.len());
        }
    }

    fn short_store() -> MemoryStore {
        let mut catalog = ModeCatalog::default();
        catalog.set_duration(ModeId::Pomodoro, 3).unwrap();
        catalog.set_duration(ModeId::ShortBreak, 2).unwrap();
        let mut store = StateStore::new(MemoryStore::new());
        store.flush_catalog(&catalog);
        store.into_inner()
    }

    /// Reads succeed, every write is rejected.
    struct ReadOnlyDisk(MemoryStore);

    impl KeyValueStore for ReadOnlyDisk {
        fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.0.get(key)
        }
        fn set(&mut self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Locked)
        }
    }

    fn session() -> FocusSession<MemoryStore, ManualScheduler> {
        FocusSession::open(short_store(), ManualScheduler::new(), SessionOptions::default())
    }

    #[test]
    fn start_schedules_a_single_task() {
        let mut session = session();
        assert!(session.start().is_some());
        assert!(session.start().is_none());
        assert_eq!(session.scheduler().live_tasks(), 1);

        let events = session.advance(Duration::from_secs(1));
        assert_eq!(events.len(), 1);
        assert_eq!(session.state().time_left_seconds, 2);
    }

    #[test]
    fn pause_cancels_task_and_is_total() {
        let mut session = session();
        session.start();
        session.pause();
        assert_eq!(session.scheduler().live_tasks(), 0);
        assert!(session.tick_task().is_none());

        let before = session.state().clone();
        assert!(session.pause().is_none());
        assert!(session.advance(Duration::from_secs(5)).is_empty());
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn stale_task_ticks_are_dropped() {
        let mut session = session();
        session.start();
        let old = session.tick_task().unwrap();
        session.pause();
        session.start();
        assert!(session.on_tick(old).is_none());
        assert_eq!(session.state().time_left_seconds, 3);
    }

    #[test]
    fn tick_at_zero_completes_once() {
        let recorder = Recorder::default();
        let mut session = session()
            .with_audio_sink(recorder.clone())
            .with_render_sink(recorder.clone());
        session.start();
        session.advance(Duration::from_secs(3));
        assert_eq!(session.state().time_left_seconds, 0);
        assert!(session.history().is_empty());

        let events = session.advance(Duration::from_secs(1));
        assert!(matches!(events.as_slice(), [Event::SessionCompleted { .. }]));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.state().mode, ModeId::ShortBreak);
        assert!(!session.state().is_running);
        assert_eq!(session.scheduler().live_tasks(), 0);
        assert_eq!(*recorder.cues.borrow(), vec![AudioCue::Alarm]);
        assert_eq!(recorder.modes.borrow().last().map(String::as_str), Some("Short Break"));
        assert_eq!(recorder.clocks.borrow().last().map(String::as_str), Some("00:02"));
    }

    #[test]
    fn inputs_play_clicks_except_space() {
        let recorder = Recorder::default();
        let mut session = session().with_audio_sink(recorder.clone());
        session.handle_input(Input::SpacePressed).unwrap();
        assert!(session.state().is_running);
        session.handle_input(Input::ToggleClicked).unwrap();
        assert!(!session.state().is_running);
        session.handle_input(Input::SkipClicked).unwrap();
        assert_eq!(
            *recorder.cues.borrow(),
            vec![AudioCue::Click, AudioCue::Click, AudioCue::Alarm]
        );
    }

    #[test]
    fn skip_while_running_stops_ticking() {
        let mut session = session();
        session.start();
        session.skip();
        assert!(!session.state().is_running);
        assert_eq!(session.scheduler().live_tasks(), 0);
        assert!(session.advance(Duration::from_secs(3)).is_empty());
    }

    #[test]
    fn unconfirmed_clear_keeps_history() {
        let mut session = session();
        session.skip();
        assert_eq!(
            session
                .handle_input(Input::ClearHistory { confirmed: false })
                .unwrap(),
            None
        );
        assert_eq!(session.history().len(), 1);
        session
            .handle_input(Input::ClearHistory { confirmed: true })
            .unwrap();
        assert!(session.history().is_empty());
    }

    #[test]
    fn remove_out_of_range_is_an_error() {
        let mut session = session();
        assert!(session.handle_input(Input::RemoveHistory(0)).is_err());
    }

    #[test]
    fn every_mutation_is_flushed() {
        let mut session = session();
        let base = session.store().writes();
        session.start();
        session.advance(Duration::from_secs(1));
        session.pause();
        assert_eq!(session.store().writes(), base + 3);

        let raw = session.store().raw(TIMER_KEY).unwrap().to_string();
        let persisted: TimerState = serde_json::from_str(&raw).unwrap();
        assert_eq!(&persisted, session.state());
    }

    #[test]
    fn update_catalog_clamps_time_left() {
        let mut session = session();
        session
            .update_catalog(|catalog| catalog.set_duration(ModeId::Pomodoro, 1))
            .unwrap();
        assert_eq!(session.state().time_left_seconds, 1);
        assert!(session
            .update_catalog(|catalog| catalog.set_duration(ModeId::Pomodoro, 0))
            .is_err());
        assert_eq!(session.catalog().mode(ModeId::Pomodoro).duration_seconds, 1);
    }

    #[test]
    fn failed_writes_keep_in_memory_changes() {
        let recorder = Recorder::default();
        let mut session = FocusSession::open(
            ReadOnlyDisk(short_store()),
            ManualScheduler::new(),
            SessionOptions::default(),
        )
        .with_render_sink(recorder.clone())
        .with_audio_sink(recorder.clone());

        session.start();
        session.advance(Duration::from_secs(2));
        assert_eq!(session.state().time_left_seconds, 1);
        assert!(session.state().is_running);

        session.handle_input(Input::SkipClicked).unwrap();
        assert_eq!(session.state().mode, ModeId::ShortBreak);
        assert_eq!(session.state().time_left_seconds, 2);
        assert_eq!(session.state().cycles_completed, 1);
        assert_eq!(session.history().len(), 1);
        assert!(recorder.cues.borrow().contains(&AudioCue::Alarm));

        session.handle_input(Input::RemoveHistory(0)).unwrap();
        assert!(session.history().is_empty());
        assert!(session.store().0.raw(TIMER_KEY).is_none());
    }

    #[test]
    fn saved_session_load_writes_nothing() {
        let mut kv = short_store();
        kv.set(
            TIMER_KEY,
            r#"{"mode":"pomodoro","timeLeftSeconds":99,"cyclesCompleted":2,"isRunning":true}"#,
        )
        .unwrap();
        let store = StateStore::new(kv);
        let base = store.inner().writes();

        let saved = SavedSession::load(&store, &SessionOptions::default());
        assert!(saved.persisted.is_running);
        assert_eq!(saved.engine.state().time_left_seconds, 3);
        assert!(!saved.engine.state().is_running);
        assert_eq!(store.inner().writes(), base);
    }
}
