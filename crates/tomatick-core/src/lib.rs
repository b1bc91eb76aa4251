//! # Tomatick Core Library
//!
//! This library provides the core logic for the Tomatick focus timer. The
//! CLI binary is a thin host over the same types: it supplies a real clock,
//! a terminal renderer and keyboard input, while the timer and history logic
//! lives here.
//!
//! ## Architecture
//!
//! - **Mode Catalog**: the three interval kinds and the cycle policy
//! - **Timer Engine**: a tick-driven countdown state machine with no clock of
//!   its own
//! - **History**: newest-first log of finished intervals
//! - **Session**: the single owner of engine, history, storage, scheduler and
//!   sinks; flushes state after every mutation
//! - **Storage**: key-value persistence (SQLite or memory) and TOML config
//!
//! ## Key Components
//!
//! - [`FocusSession`]: context object driving everything
//! - [`TimerEngine`]: core timer state machine
//! - [`ModeCatalog`]: validated mode definitions
//! - [`HistoryLog`]: session history
//! - [`Scheduler`]: repeating tick tasks (virtual or tokio)

pub mod error;
pub mod events;
pub mod history;
pub mod modes;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod timer;
pub mod view;

pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use history::{HistoryEntry, HistoryLog, HistoryStats};
pub use modes::{ModeCatalog, ModeDefinition, ModeId, Theme};
pub use scheduler::{ManualScheduler, Scheduler, TaskId, TokioScheduler};
pub use session::{FocusSession, Input, SavedSession, SessionOptions};
pub use storage::{Config, KeyValueStore, MemoryStore, SqliteStore, StateStore};
pub use timer::{DurationPolicy, TimerEngine, TimerState, TimerStatus};
pub use view::{AudioCue, AudioSink, NullSink, RenderSink, TimerView};
