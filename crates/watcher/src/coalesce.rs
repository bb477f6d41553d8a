//! Event coalescing
//!
//! Second layer of the pipeline. Turns classified events into the public
//! taxonomy: a settled create followed within one window by a write becomes
//! `new`, a settled create left alone becomes `touch`. Every path is
//! handled independently.

use crate::debounce::{Scheduler, TimerId};
use crate::error::{Result, WatchError};
use semitia_core::{ClassifiedEvent, WatchEvent};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Layer two of the pipeline
pub struct Coalescer {
    threshold: Duration,
    /// Pending confirm-as-touch timer per created path
    pending: HashMap<PathBuf, TimerId>,
    scheduler: Scheduler<PathBuf>,
}

impl Coalescer {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            pending: HashMap::new(),
            scheduler: Scheduler::new(),
        }
    }

    /// Map one classified event observed at `now` to at most one public event
    pub fn process(&mut self, event: ClassifiedEvent, now: Instant) -> Option<WatchEvent> {
        match event {
            ClassifiedEvent::Create { at } => {
                let timer = self.scheduler.schedule(now + self.threshold, at.clone());
                if let Some(old) = self.pending.insert(at, timer) {
                    self.scheduler.cancel(old);
                }
                None
            }
            ClassifiedEvent::Modify { at } => match self.pending.remove(&at) {
                Some(timer) => {
                    self.scheduler.cancel(timer);
                    Some(WatchEvent::New { at })
                }
                None => Some(WatchEvent::Modify { at }),
            },
            ClassifiedEvent::Move { from, to } => Some(WatchEvent::Move { from, to }),
            ClassifiedEvent::Remove { at } => Some(WatchEvent::Remove { at }),
            ClassifiedEvent::Momentary { .. } | ClassifiedEvent::Ignore { .. } => None,
        }
    }

    /// Confirm the earliest create due at `now` as a touch
    pub fn fire_next(&mut self, now: Instant) -> Result<Option<(Instant, WatchEvent)>> {
        let Some(fired) = self.scheduler.pop_due(now) else {
            return Ok(None);
        };

        match self.pending.remove(&fired.payload) {
            Some(timer) if timer == fired.id => {}
            _ => {
                return Err(WatchError::Invariant(format!(
                    "touch timer fired for {} without a matching entry",
                    fired.payload.display()
                )))
            }
        }

        Ok(Some((fired.deadline, WatchEvent::Touch { at: fired.payload })))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    /// Cancel every pending touch confirmation
    pub fn shutdown(&mut self) -> usize {
        self.pending.clear();
        self.scheduler.cancel_all()
    }
}
