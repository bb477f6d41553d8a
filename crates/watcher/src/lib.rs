//! File system watching for Semitia
//!
//! This crate turns the noisy stream of platform notifications into a small
//! set of semantic events (`touch`, `new`, `modify`, `move`, `remove`):
//! - Raw event interpretation with per-path timing windows
//! - Create/modify coalescing into `new` vs `touch`
//! - Subscribe-by-kind delivery
//! - Idempotent abort that cancels every pending timer

pub mod coalesce;
pub mod config;
pub mod debounce;
pub mod error;
pub mod interpret;
pub mod pipeline;
pub mod platform;
pub mod source;
mod subscribe;

pub use config::WatchConfig;
pub use error::{Result, WatchError};
pub use pipeline::Pipeline;
pub use platform::NotifySource;
pub use source::RawSource;
pub use subscribe::Subscription;

pub use semitia_core::{EventKind, RawEvent, RawKind, WatchEvent};

use semitia_core::Rejected;
use std::sync::Arc;
use std::time::Instant;
use subscribe::Subscribers;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// File system watcher
///
/// Owns the pipeline for one run: created with a configuration, fed by a
/// [`RawSource`] in [`Watcher::watch`], stopped with [`Watcher::abort`].
pub struct Watcher {
    config: WatchConfig,
    subscribers: Subscribers,
    abort: AbortHandle,
}

impl Watcher {
    /// Create a new watcher for the given configuration
    pub fn new(config: WatchConfig) -> Result<Self> {
        config.validate()?;

        let (tx, _) = watch::channel(false);
        let subscribers = Subscribers::default();

        Ok(Self {
            config,
            abort: AbortHandle {
                signal: Arc::new(tx),
                subscribers: subscribers.clone(),
            },
            subscribers,
        })
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Receive public events of the given kinds
    pub fn subscribe(&self, kinds: impl IntoIterator<Item = EventKind>) -> Subscription {
        self.subscribers.subscribe(kinds.into_iter().collect())
    }

    /// Receive every public event
    pub fn subscribe_all(&self) -> Subscription {
        self.subscribe(EventKind::ALL)
    }

    /// Handle that stops this watcher from another task
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Stop watching; calling it again has no effect
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Watch the configured targets through the platform backend
    pub async fn watch_fs(&self) -> Result<()> {
        let source = NotifySource::new(&self.config)?;
        self.watch(source).await
    }

    /// Drive the pipeline from `source` until aborted
    ///
    /// Returns `Ok(())` after an abort, [`WatchError::SourceClosed`] if the
    /// source runs dry first, and any invariant violation as soon as it is
    /// detected. Pending timers are cancelled and subscriptions finished in
    /// every case.
    pub async fn watch<S: RawSource>(&self, mut source: S) -> Result<()> {
        let mut aborted = self.abort.signal.subscribe();
        if *aborted.borrow_and_update() {
            drop(source);
            self.subscribers.close();
            return Ok(());
        }

        let mut pipeline = Pipeline::new(self.config.threshold);
        info!(threshold_ms = self.config.threshold.as_millis() as u64, "watcher started");

        let outcome = loop {
            let deadline = pipeline.next_deadline();

            tokio::select! {
                biased;

                changed = aborted.changed() => {
                    if changed.is_err() || *aborted.borrow_and_update() {
                        break Ok(());
                    }
                }

                _ = sleep_until(deadline) => {
                    match pipeline.advance(now()) {
                        Ok(events) => self.publish(events),
                        Err(e) => break Err(e),
                    }
                }

                next = source.next_event() => {
                    let Some(event) = next else {
                        break Err(WatchError::SourceClosed);
                    };

                    match event.into_record(now()) {
                        Ok(record) => match pipeline.process(record) {
                            Ok(events) => self.publish(events),
                            Err(e) => break Err(e),
                        },
                        Err(Rejected::Flagged(flag)) => warn!(%flag, "dropping flagged notification"),
                        Err(rejected) => trace!(%rejected, "dropping notification"),
                    }
                }
            }
        };

        let cancelled = pipeline.shutdown();
        drop(source);
        self.subscribers.close();

        match &outcome {
            Ok(()) => info!(cancelled, "watcher stopped"),
            Err(e) => warn!(error = %e, cancelled, "watcher terminated"),
        }
        outcome
    }

    fn publish(&self, events: Vec<WatchEvent>) {
        if events.is_empty() {
            return;
        }

        for event in &events {
            debug!(%event, "dispatching");
        }
        self.subscribers.publish(events);
    }
}

/// Cloneable handle that aborts a [`Watcher`]
#[derive(Clone)]
pub struct AbortHandle {
    signal: Arc<watch::Sender<bool>>,
    subscribers: Subscribers,
}

impl AbortHandle {
    /// Stop the watcher
    ///
    /// Once this returns no further event is delivered. Only the first call
    /// has an effect.
    pub fn abort(&self) {
        let first = self.signal.send_if_modified(|aborted| {
            if *aborted {
                false
            } else {
                *aborted = true;
                true
            }
        });

        if first {
            self.subscribers.close();
            debug!("abort requested");
        }
    }

    pub fn is_aborted(&self) -> bool {
        *self.signal.borrow()
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
