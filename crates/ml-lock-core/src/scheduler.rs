//! Deferred task queue for the single-threaded session loop
//!
//! Tasks are plain tags; the session decides what each one does and
//! re-registers it after it runs, so the period is measured from the end of
//! one run to the start of the next.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use tokio::time::Instant;

/// A deferred unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Task {
    /// One-shot security setup shortly after start
    Setup,
    /// Raise and topmost re-assertion
    Raise,
    /// Fullscreen double-check
    FullscreenCheck,
    /// Entry focus re-assertion
    Focus,
    /// Elapsed-session clock redraw
    Clock,
    /// One-second cooldown countdown
    CooldownTick,
}

impl Task {
    /// Only the cooldown countdown may be cancelled; enforcement runs for
    /// the lifetime of the session
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Task::CooldownTick)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due: Instant,
    seq: u64,
    task: Task,
}

/// Deadline-ordered task queue
///
/// Entries with equal deadlines pop in insertion order.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task to run at `due`
    pub fn schedule(&mut self, task: Task, due: Instant) {
        self.seq += 1;
        self.queue.push(Reverse(Entry {
            due,
            seq: self.seq,
            task,
        }));
    }

    /// Register a task to run `delay` after `now`
    pub fn schedule_after(&mut self, task: Task, now: Instant, delay: Duration) {
        self.schedule(task, now + delay);
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    /// Pop the next task whose deadline has passed
    pub fn pop_due(&mut self, now: Instant) -> Option<Task> {
        match self.queue.peek() {
            Some(Reverse(entry)) if entry.due <= now => {
                self.queue.pop().map(|Reverse(entry)| entry.task)
            }
            _ => None,
        }
    }

    /// Drop every pending instance of a cancellable task
    ///
    /// Returns false, leaving the queue untouched, for tasks that may not
    /// be cancelled.
    pub fn cancel(&mut self, task: Task) -> bool {
        if !task.is_cancellable() {
            return false;
        }
        self.queue.retain(|Reverse(entry)| entry.task != task);
        true
    }

    /// Earliest pending deadline of one task
    pub fn deadline_of(&self, task: Task) -> Option<Instant> {
        self.queue
            .iter()
            .filter(|Reverse(entry)| entry.task == task)
            .map(|Reverse(entry)| entry.due)
            .min()
    }

    pub fn is_scheduled(&self, task: Task) -> bool {
        self.queue.iter().any(|Reverse(entry)| entry.task == task)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
