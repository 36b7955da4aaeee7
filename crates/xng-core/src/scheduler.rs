//! Scheduler: the single virtual-time clock that serializes every event.
//!
//! Tasks are ordered by `(at, seq)` where `seq` is the insertion sequence,
//! so tasks due at the same tick run strictly first-in first-out. A task
//! that schedules a sibling at `now + 0` sees it run only after it returns.
//!
//! The scheduler only orders work; it does not know how to run it. The
//! owner pops due tasks and dispatches them, which keeps task payloads free
//! to borrow the owner mutably.

use crate::error::{Result, XngError};
use crate::types::{Duration, Tick};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct Entry<T> {
    at: Tick,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed so the max-heap pops the earliest (at, seq) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of timestamped tasks over a virtual clock.
pub struct Scheduler<T> {
    now: Tick,
    seq: u64,
    queue: BinaryHeap<Entry<T>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(now: Tick) -> Self {
        Self {
            now,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Enqueue `task` to run `delay` ticks from now.
    pub fn schedule(&mut self, delay: Duration, task: T) -> Result<()> {
        self.schedule_at(self.now.saturating_add(delay), task)
    }

    /// Enqueue `task` to run at tick `at`, which may not be in the past.
    pub fn schedule_at(&mut self, at: Tick, task: T) -> Result<()> {
        if at < self.now {
            return Err(XngError::invalid_time(at, self.now));
        }
        let seq = self.seq;
        self.seq += 1;
        self.queue.push(Entry { at, seq, task });
        Ok(())
    }

    /// Pop the next task, advancing the clock to its tick.
    pub fn pop(&mut self) -> Option<T> {
        self.pop_until(Tick::MAX)
    }

    /// Pop the next task due at or before `limit`, advancing the clock to its tick.
    pub fn pop_until(&mut self, limit: Tick) -> Option<T> {
        if self.queue.peek()?.at > limit {
            return None;
        }
        let entry = self.queue.pop()?;
        self.now = entry.at;
        Some(entry.task)
    }

    /// Move the clock forward without running anything. Pending tasks due
    /// before `t` keep their slots and run at the new `now` when popped.
    pub fn advance_to(&mut self, t: Tick) -> Result<()> {
        if t < self.now {
            return Err(XngError::invalid_time(t, self.now));
        }
        if let Some(next) = self.queue.peek() {
            if next.at < t {
                return Err(XngError::invalid_time(next.at, t));
            }
        }
        self.now = t;
        Ok(())
    }

    /// Tick of the earliest pending task.
    pub fn next_at(&self) -> Option<Tick> {
        self.queue.peek().map(|e| e.at)
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
