//! Raw event interpreter
//!
//! First layer of the pipeline. Consumes raw records one at a time, in
//! arrival order, and reclassifies bursts of platform notifications into
//! [`ClassifiedEvent`]s using short timing windows and per-path state:
//!
//! - `create` is confirmed only after a quiet window, unless the path is
//!   removed again first (a momentary lifecycle)
//! - two adjacent `modify` records on one path are a single edit
//! - two adjacent `modify` records on different paths are a move
//! - a lone `modify` is confirmed after a quiet window
//! - a sustained write reports roughly every second `modify`, so events keep
//!   coming until the write ends

use crate::debounce::{Scheduler, TimerId};
use crate::error::{Result, WatchError};
use semitia_core::{within_window, ClassifiedEvent, IgnoreReason, RawKind, RawRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Lifecycle phase of a path that has not settled yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Create,
    Modify,
}

/// Kind, path and arrival time of a processed record
#[derive(Debug, Clone)]
struct WatchStatus {
    kind: RawKind,
    path: PathBuf,
    time: Instant,
}

/// Pending create confirmation
///
/// Also serves as the path's momentary marker: the phase tracks how far the
/// transient lifecycle progressed before it either settles or vanishes.
/// Markers live per path, so several paths can be mid-transition at once
/// without overwriting each other.
#[derive(Debug)]
struct Transient {
    timer: TimerId,
    phase: Phase,
    /// Arrival of the create; writes within one window of it are noise
    since: Instant,
    /// A write was absorbed while the create was pending
    written: bool,
}

#[derive(Debug, Default)]
struct PathTimers {
    create: Option<Transient>,
    modify: Option<TimerId>,
}

impl PathTimers {
    fn is_idle(&self) -> bool {
        self.create.is_none() && self.modify.is_none()
    }
}

#[derive(Debug)]
enum Pending {
    Create(PathBuf),
    Modify(PathBuf),
}

/// Layer one of the pipeline
pub struct Interpreter {
    threshold: Duration,
    /// Most recently processed record
    current: Option<WatchStatus>,
    /// Record processed before `current`
    previous: Option<WatchStatus>,
    /// Per-path create/modify confirmation timers
    timers: HashMap<PathBuf, PathTimers>,
    scheduler: Scheduler<Pending>,
}

impl Interpreter {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            current: None,
            previous: None,
            timers: HashMap::new(),
            scheduler: Scheduler::new(),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Classify one raw record
    ///
    /// Records must be fed in arrival order, after every timer due at the
    /// record's arrival time has been fired with [`Interpreter::fire_next`].
    pub fn process(&mut self, record: RawRecord) -> Vec<ClassifiedEvent> {
        let RawRecord {
            kind,
            path,
            observed_at: now,
        } = record;

        trace!(path = %path.display(), %kind, "raw record");

        if !kind.is_interpretable() {
            return Vec::new();
        }

        self.prune();
        self.previous = self.current.replace(WatchStatus {
            kind,
            path: path.clone(),
            time: now,
        });

        let events = match kind {
            RawKind::Create => self.on_create(path, now),
            RawKind::Modify => self.on_modify(path, now),
            RawKind::Remove => self.on_remove(path, now),
            RawKind::Access | RawKind::Other => Vec::new(),
        };

        for event in &events {
            debug!(%event, "classified");
        }
        events
    }

    /// Fire the earliest timer due at `now`
    ///
    /// Returns the timer's deadline along with what it emitted, or `None`
    /// once nothing is due.
    pub fn fire_next(&mut self, now: Instant) -> Result<Option<(Instant, Vec<ClassifiedEvent>)>> {
        let Some(fired) = self.scheduler.pop_due(now) else {
            return Ok(None);
        };

        let events = match fired.payload {
            Pending::Create(path) => {
                let transient = self.timers.get_mut(&path).and_then(|t| t.create.take());
                let written = match transient {
                    Some(transient) if transient.timer == fired.id => transient.written,
                    _ => {
                        return Err(WatchError::Invariant(format!(
                            "create timer fired for {} without a matching entry",
                            path.display()
                        )))
                    }
                };
                self.forget_if_idle(&path);

                let mut events = vec![ClassifiedEvent::Create { at: path.clone() }];
                if written {
                    events.push(ClassifiedEvent::Modify { at: path });
                }
                events
            }
            Pending::Modify(path) => {
                match self.timers.get_mut(&path).and_then(|t| t.modify.take()) {
                    Some(id) if id == fired.id => {}
                    _ => {
                        return Err(WatchError::Invariant(format!(
                            "modify timer fired for {} without a matching entry",
                            path.display()
                        )))
                    }
                }
                self.forget_if_idle(&path);

                vec![ClassifiedEvent::Modify { at: path }]
            }
        };

        for event in &events {
            debug!(%event, "classified (settled)");
        }
        Ok(Some((fired.deadline, events)))
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Number of pending timers
    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    /// Current phase of a transient path, if it has one
    pub fn phase(&self, path: &Path) -> Option<Phase> {
        self.timers
            .get(path)
            .and_then(|t| t.create.as_ref())
            .map(|t| t.phase)
    }

    /// Cancel every timer and drop all per-path state
    ///
    /// Returns how many timers were still pending.
    pub fn shutdown(&mut self) -> usize {
        let cancelled = self.scheduler.cancel_all();
        self.timers.clear();
        self.current = None;
        self.previous = None;
        cancelled
    }

    fn on_create(&mut self, path: PathBuf, now: Instant) -> Vec<ClassifiedEvent> {
        let entry = self.timers.entry(path.clone()).or_default();

        // A create supersedes whatever was pending on this path
        if let Some(id) = entry.modify.take() {
            self.scheduler.cancel(id);
        }
        if let Some(old) = entry.create.take() {
            self.scheduler.cancel(old.timer);
        }

        let timer = self
            .scheduler
            .schedule(now + self.threshold, Pending::Create(path));
        entry.create = Some(Transient {
            timer,
            phase: Phase::Create,
            since: now,
            written: false,
        });

        vec![ignore(IgnoreReason::InitialCreate)]
    }

    fn on_modify(&mut self, path: PathBuf, now: Instant) -> Vec<ClassifiedEvent> {
        let threshold = self.threshold;
        let mut events = Vec::new();

        // Momentary progress does not end the evaluation
        if let Some(transient) = self.transient_mut(&path, now) {
            if transient.phase == Phase::Create {
                transient.phase = Phase::Modify;
                events.push(ignore(IgnoreReason::MomentaryProgress));
            }
        }

        // Writes accompanying a create inside the create's own window
        if let Some(transient) = self.transient_mut(&path, now) {
            transient.written = true;
            events.push(ignore(IgnoreReason::WithCreate));
            return events;
        }

        let previous = self
            .previous
            .as_ref()
            .filter(|p| p.kind == RawKind::Modify && within_window(p.time, now, threshold))
            .map(|p| p.path.clone());

        if let Some(previous) = previous {
            if previous == path {
                if self.cancel_modify(&path) {
                    events.push(ClassifiedEvent::Modify { at: path });
                    return events;
                }
            } else if self.cancel_modify(&previous) {
                events.push(ClassifiedEvent::Move {
                    from: previous,
                    to: path,
                });
                return events;
            }
        }

        // Create still unconfirmed past its window
        if let Some(transient) = self.timers.get_mut(&path).and_then(|t| t.create.as_mut()) {
            transient.written = true;
            events.push(ignore(IgnoreReason::WithCreate));
            return events;
        }

        let timer = self
            .scheduler
            .schedule(now + threshold, Pending::Modify(path.clone()));
        let entry = self.timers.entry(path).or_default();
        if let Some(old) = entry.modify.replace(timer) {
            self.scheduler.cancel(old);
        }

        events.push(ignore(IgnoreReason::InitialModify));
        events
    }

    fn on_remove(&mut self, path: PathBuf, now: Instant) -> Vec<ClassifiedEvent> {
        let momentary = self.transient_mut(&path, now).is_some();

        // Confirmations pending for a path that is gone are meaningless
        if let Some(entry) = self.timers.remove(&path) {
            if let Some(transient) = entry.create {
                self.scheduler.cancel(transient.timer);
            }
            if let Some(id) = entry.modify {
                self.scheduler.cancel(id);
            }
        }
        if momentary {
            vec![ClassifiedEvent::Momentary { at: path }]
        } else {
            vec![ClassifiedEvent::Remove { at: path }]
        }
    }

    /// Pending create for `path` whose window still covers `now`
    fn transient_mut(&mut self, path: &Path, now: Instant) -> Option<&mut Transient> {
        let threshold = self.threshold;
        self.timers
            .get_mut(path)
            .and_then(|t| t.create.as_mut())
            .filter(|t| within_window(t.since, now, threshold))
    }

    /// Cancel the pending modify confirmation for `path`
    ///
    /// Returns whether one was pending.
    fn cancel_modify(&mut self, path: &Path) -> bool {
        let cancelled = match self.timers.get_mut(path).and_then(|t| t.modify.take()) {
            Some(id) => self.scheduler.cancel(id).is_some(),
            None => false,
        };
        self.forget_if_idle(path);
        cancelled
    }

    fn forget_if_idle(&mut self, path: &Path) {
        if self.timers.get(path).is_some_and(PathTimers::is_idle) {
            self.timers.remove(path);
        }
    }

    fn prune(&mut self) {
        self.timers.retain(|_, t| !t.is_idle());
    }
}

fn ignore(reason: IgnoreReason) -> ClassifiedEvent {
    ClassifiedEvent::Ignore { reason }
}
