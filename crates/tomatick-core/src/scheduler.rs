//! Repeating-task scheduling for the countdown.
//!
//! The engine never owns a clock. A [`Scheduler`] hands out a [`TaskId`] for a
//! repeating task and cancels it on request; the host feeds fired task ids
//! back into the session. Two implementations ship here:
//!
//! - [`ManualScheduler`]: a virtual clock advanced explicitly (tests, embedding)
//! - [`TokioScheduler`]: an interval task per id posting to an mpsc channel

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

pub trait Scheduler {
    /// Start a task that fires every `period` until cancelled.
    fn schedule_repeating(&mut self, period: Duration) -> TaskId;

    /// Stop a task. Cancelling an unknown or finished task is a no-op.
    fn cancel(&mut self, task: TaskId);
}

#[derive(Debug, Clone)]
struct VirtualTask {
    period: Duration,
    next_due: Duration,
}

/// Virtual clock. Nothing fires until [`ManualScheduler::advance`] is called.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    tasks: BTreeMap<TaskId, VirtualTask>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of tasks currently scheduled.
    pub fn live_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Move the clock forward and return every firing in time order.
    pub fn advance(&mut self, by: Duration) -> Vec<TaskId> {
        let target = self.now + by;
        let mut fired = Vec::new();
        loop {
            let due = self
                .tasks
                .iter()
                .filter(|(_, task)| task.next_due <= target)
                .min_by_key(|(id, task)| (task.next_due, **id))
                .map(|(id, _)| *id);
            let Some(id) = due else { break };
            if let Some(task) = self.tasks.get_mut(&id) {
                self.now = task.next_due;
                task.next_due += task.period;
            }
            fired.push(id);
        }
        self.now = target;
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&mut self, period: Duration) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        let period = period.max(Duration::from_millis(1));
        self.tasks.insert(
            id,
            VirtualTask {
                period,
                next_due: self.now + period,
            },
        );
        id
    }

    fn cancel(&mut self, task: TaskId) {
        self.tasks.remove(&task);
    }
}

/// Real-clock scheduler backed by tokio.
///
/// Must be used from inside a tokio runtime. Each task is a spawned
/// `tokio::time::interval` loop sending its id on the channel returned by
/// [`TokioScheduler::new`]. A cancelled task may already have queued a tick;
/// the session drops ticks for ids that are no longer live.
pub struct TokioScheduler {
    sender: mpsc::UnboundedSender<TaskId>,
    next_id: u64,
    tasks: HashMap<TaskId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TaskId>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                next_id: 0,
                tasks: HashMap::new(),
            },
            receiver,
        )
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&mut self, period: Duration) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if sender.send(id).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(id, handle);
        id
    }

    fn cancel(&mut self, task: TaskId) {
        if let Some(handle) = self.tasks.remove(&task) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}
