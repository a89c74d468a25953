//! Frame Timers
//!
//! Single-threaded delayed and repeating callbacks, measured in frames.
//!
//! Timers carry plain data actions instead of closures: `advance()` hands
//! the due actions back to the owner, which applies them between frames.
//! This keeps a timer from ever re-entering a component mid-update.

use std::collections::BTreeMap;

/// Handle of a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct Timer<A> {
    action: A,
    /// Re-arm interval for repeating timers
    repeat: Option<u64>,
}

/// Frame-based timer queue.
///
/// Timers due on the same frame fire in the order they were scheduled.
#[derive(Clone, Debug)]
pub struct Scheduler<A> {
    /// Frames advanced so far
    frame: u64,
    next_id: u64,
    /// Pending timers keyed by (due frame, id)
    queue: BTreeMap<(u64, TimerId), Timer<A>>,
    /// Due frame of every pending timer
    due_by_id: BTreeMap<TimerId, u64>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            frame: 0,
            next_id: 0,
            queue: BTreeMap::new(),
            due_by_id: BTreeMap::new(),
        }
    }

    /// Frames advanced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Fire `action` once, `delay` frames from now (minimum one frame).
    pub fn schedule_once(&mut self, delay: u64, action: A) -> TimerId {
        self.insert(delay, Timer { action, repeat: None })
    }

    /// Fire `action` every `interval` frames until cancelled.
    pub fn schedule_repeating(&mut self, interval: u64, action: A) -> TimerId {
        let interval = interval.max(1);
        self.insert(interval, Timer { action, repeat: Some(interval) })
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_id.remove(&id) {
            Some(due) => self.queue.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    /// Check whether a timer is still pending.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id)
    }

    /// Number of pending timers.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    fn insert(&mut self, delay: u64, timer: Timer<A>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.frame + delay.max(1);
        self.queue.insert((due, id), timer);
        self.due_by_id.insert(id, due);
        id
    }
}

impl<A: Clone> Scheduler<A> {
    /// Advance one frame and return the actions that became due.
    pub fn advance(&mut self) -> Vec<A> {
        self.frame += 1;

        let mut fired = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            let (due, id) = *entry.key();
            if due > self.frame {
                break;
            }
            let timer = entry.remove();
            self.due_by_id.remove(&id);
            fired.push(timer.action.clone());

            if let Some(interval) = timer.repeat {
                let next_due = self.frame + interval;
                self.queue.insert((next_due, id), timer);
                self.due_by_id.insert(id, next_due);
            }
        }
        fired
    }
}
