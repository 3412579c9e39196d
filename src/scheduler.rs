//! One-shot timers on a virtual millisecond clock.
//!
//! Nothing here sleeps. The owner advances the clock (from a real timer in
//! the CLI session, or by hand in tests) and dispatches whatever became due.
//! Timers are never cancelled; handlers must tolerate firing for state that
//! has already gone away.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Work that can be scheduled for later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Task {
    /// Deliver the initial batch of trades
    LoadInitialTrades,
    /// Feed interval elapsed; maybe emit a trade
    FeedTick,
    /// Start fading a notification out
    HideNotification(u64),
    /// Drop a faded notification
    RemoveNotification(u64),
    /// Clear the "limit reached" notice on a trade's comments
    ClearCommentLimitNotice(u64),
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due_ms: u64,
    seq: u64,
    task: Task,
}

/// Timer queue ordered by due time, then by insertion order.
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Run `task` once, `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, task: Task) {
        let entry = Entry {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.seq,
            task,
        };
        self.seq += 1;
        self.queue.push(Reverse(entry));
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(e)| e.due_ms)
    }

    /// Pop the earliest task due at or before `until_ms`, moving the clock to its due time.
    ///
    /// Once nothing else is due the clock settles at `until_ms`. The clock
    /// never moves backwards.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Task> {
        match self.queue.peek() {
            Some(Reverse(entry)) if entry.due_ms <= until_ms => {
                let Reverse(entry) = self.queue.pop()?;
                self.now_ms = self.now_ms.max(entry.due_ms);
                Some(entry.task)
            }
            _ => {
                self.now_ms = self.now_ms.max(until_ms);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_fire_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(300, Task::RemoveNotification(1));
        s.schedule(100, Task::HideNotification(1));
        s.schedule(100, Task::HideNotification(2));

        assert_eq!(s.pop_due(1000), Some(Task::HideNotification(1)));
        assert_eq!(s.now_ms(), 100);
        assert_eq!(s.pop_due(1000), Some(Task::HideNotification(2)));
        assert_eq!(s.pop_due(1000), Some(Task::RemoveNotification(1)));
        assert_eq!(s.now_ms(), 300);
        assert_eq!(s.pop_due(1000), None);
        assert_eq!(s.now_ms(), 1000);
    }

    #[test]
    fn test_delay_is_relative_to_current_time() {
        let mut s = Scheduler::new();
        assert_eq!(s.pop_due(500), None);

        s.schedule(100, Task::FeedTick);
        assert_eq!(s.next_due(), Some(600));
        assert_eq!(s.pop_due(599), None);
        assert_eq!(s.pop_due(600), Some(Task::FeedTick));
    }

    #[test]
    fn test_clock_never_rewinds() {
        let mut s = Scheduler::new();
        s.pop_due(1000);
        s.pop_due(10);
        assert_eq!(s.now_ms(), 1000);
    }
}
