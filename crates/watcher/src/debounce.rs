//! Debounce timer facility
//!
//! Timers are plain deadlines owned by one layer. Nothing fires on its own:
//! the owner asks for due timers with [`Scheduler::pop_due`] and decides
//! what firing means. Cancelling removes the deadline before it can ever be
//! popped, so a cancelled timer never fires.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Opaque handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer taken off the queue because its deadline passed
#[derive(Debug)]
pub struct Fired<T> {
    pub id: TimerId,
    pub deadline: Instant,
    pub payload: T,
}

/// Deadline queue with schedule/cancel semantics
///
/// Timers sharing a deadline fire in the order they were scheduled.
pub struct Scheduler<T> {
    /// Monotonic handle counter
    next_id: u64,
    /// Pending timers ordered by deadline, then by scheduling order
    queue: BTreeMap<(Instant, TimerId), T>,
    /// Deadline of each pending timer
    deadlines: HashMap<TimerId, Instant>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Schedule `payload` to fire at `deadline`
    pub fn schedule(&mut self, deadline: Instant, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        self.queue.insert((deadline, id), payload);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a pending timer
    ///
    /// Returns the payload if the timer was still pending, `None` if it
    /// already fired or was cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        self.queue.remove(&(deadline, id))
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Take the earliest timer whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<Fired<T>> {
        let (&(deadline, id), _) = self.queue.iter().next()?;
        if deadline > now {
            return None;
        }

        let payload = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);

        Some(Fired {
            id,
            deadline,
            payload,
        })
    }

    /// Cancel every pending timer, returning how many were pending
    pub fn cancel_all(&mut self) -> usize {
        let count = self.queue.len();
        self.queue.clear();
        self.deadlines.clear();
        count
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
