mod engine;

pub use engine::{DurationPolicy, TimerEngine, TimerState, TimerStatus};
