//! Two-layer reclassification pipeline
//!
//! Feeds raw records through the [`Interpreter`] and its output through the
//! [`Coalescer`]. Time only moves forward through [`Pipeline::advance`] and
//! [`Pipeline::process`]; timers of both layers fire in deadline order, and
//! every timer due at a record's arrival fires before that record is seen.

use crate::coalesce::Coalescer;
use crate::error::Result;
use crate::interpret::Interpreter;
use semitia_core::{RawRecord, WatchEvent};
use std::time::{Duration, Instant};
use tracing::debug;

pub struct Pipeline {
    interpreter: Interpreter,
    coalescer: Coalescer,
}

impl Pipeline {
    pub fn new(threshold: Duration) -> Self {
        Self {
            interpreter: Interpreter::new(threshold),
            coalescer: Coalescer::new(threshold),
        }
    }

    /// Process one raw record, returning public events in emission order
    ///
    /// Includes whatever timers fell due up to the record's arrival.
    pub fn process(&mut self, record: RawRecord) -> Result<Vec<WatchEvent>> {
        let now = record.observed_at;
        let mut out = self.advance(now)?;

        for classified in self.interpreter.process(record) {
            if let Some(event) = self.coalescer.process(classified, now) {
                debug!(%event, "public event");
                out.push(event);
            }
        }

        Ok(out)
    }

    /// Fire every timer due at or before `now`
    pub fn advance(&mut self, now: Instant) -> Result<Vec<WatchEvent>> {
        let mut out = Vec::new();

        loop {
            let interpreter_due = self.interpreter.next_deadline().filter(|d| *d <= now);
            let coalescer_due = self.coalescer.next_deadline().filter(|d| *d <= now);

            match (interpreter_due, coalescer_due) {
                (None, None) => break,
                (Some(first), Some(second)) if second < first => self.fire_coalescer(now, &mut out)?,
                (Some(_), _) => self.fire_interpreter(now, &mut out)?,
                (None, Some(_)) => self.fire_coalescer(now, &mut out)?,
            }
        }

        Ok(out)
    }

    /// Earliest deadline across both layers
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.interpreter.next_deadline(), self.coalescer.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Number of timers pending across both layers
    pub fn pending(&self) -> usize {
        self.interpreter.pending() + self.coalescer.pending()
    }

    /// Cancel every outstanding timer in both layers
    pub fn shutdown(&mut self) -> usize {
        self.interpreter.shutdown() + self.coalescer.shutdown()
    }

    fn fire_interpreter(&mut self, now: Instant, out: &mut Vec<WatchEvent>) -> Result<()> {
        if let Some((deadline, classified)) = self.interpreter.fire_next(now)? {
            // Settled events enter layer two at the moment their timer fired
            for event in classified {
                if let Some(event) = self.coalescer.process(event, deadline) {
                    debug!(%event, "public event");
                    out.push(event);
                }
            }
        }
        Ok(())
    }

    fn fire_coalescer(&mut self, now: Instant, out: &mut Vec<WatchEvent>) -> Result<()> {
        if let Some((_, event)) = self.coalescer.fire_next(now)? {
            debug!(%event, "public event");
            out.push(event);
        }
        Ok(())
    }
}
