//! Subscribe-by-kind event delivery
//!
//! Each [`Subscription`] receives only the public event kinds it asked for,
//! over its own channel. Once the registry is closed (abort or watcher
//! exit) nothing more is delivered and every subscription drains to `None`.

use futures::Stream;
use parking_lot::Mutex;
use semitia_core::{EventKind, WatchEvent};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

struct Entry {
    id: u64,
    kinds: Vec<EventKind>,
    tx: mpsc::UnboundedSender<WatchEvent>,
}

#[derive(Default)]
struct Registry {
    closed: bool,
    next_id: u64,
    entries: Vec<Entry>,
}

/// Shared set of live subscriptions
#[derive(Clone, Default)]
pub(crate) struct Subscribers {
    inner: Arc<Mutex<Registry>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&self, kinds: Vec<EventKind>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.inner.lock();

        let id = registry.next_id;
        registry.next_id += 1;

        // Dropping the sender right away leaves a subscription that is
        // already finished
        if !registry.closed {
            registry.entries.push(Entry { id, kinds, tx });
        }

        Subscription {
            id,
            rx,
            registry: self.inner.clone(),
        }
    }

    /// Deliver events to every subscription interested in their kind
    ///
    /// Returns `false` without delivering anything once closed.
    pub(crate) fn publish(&self, events: Vec<WatchEvent>) -> bool {
        let mut registry = self.inner.lock();
        if registry.closed {
            return false;
        }

        registry.entries.retain(|entry| !entry.tx.is_closed());
        for event in events {
            let kind = event.kind();
            for entry in registry.entries.iter().filter(|e| e.kinds.contains(&kind)) {
                let _ = entry.tx.send(event.clone());
            }
        }
        true
    }

    /// Stop delivery for good; returns whether this call closed it
    pub(crate) fn close(&self) -> bool {
        let mut registry = self.inner.lock();
        if registry.closed {
            return false;
        }

        registry.closed = true;
        registry.entries.clear();
        true
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

/// Stream of public events of the subscribed kinds
///
/// Dropping the subscription cancels it.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<WatchEvent>,
    registry: Arc<Mutex<Registry>>,
}

impl Subscription {
    /// Wait for the next event; `None` once the watcher stopped and every
    /// delivered event was received
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }

    /// Next already-delivered event, if any
    pub fn try_recv(&mut self) -> Option<WatchEvent> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving events
    pub fn cancel(self) {}
}

impl Stream for Subscription {
    type Item = WatchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let id = self.id;
        self.registry.lock().entries.retain(|entry| entry.id != id);
    }
}
