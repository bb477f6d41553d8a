//! Raw event sources
//!
//! The watcher pulls [`RawEvent`]s from anything implementing [`RawSource`].
//! Channel receivers implement it directly, which is how tests and embedders
//! feed scripted notifications; [`crate::platform::NotifySource`] feeds real
//! filesystem notifications.

use async_trait::async_trait;
use semitia_core::RawEvent;
use tokio::sync::mpsc;

/// Pull-based sequence of raw notifications
///
/// `next_event` is raced against timers and abort requests, so it must be
/// cancel-safe: dropping the future before completion may not lose an event.
#[async_trait]
pub trait RawSource: Send {
    /// Next notification, or `None` once the source is exhausted
    async fn next_event(&mut self) -> Option<RawEvent>;
}

#[async_trait]
impl RawSource for mpsc::Receiver<RawEvent> {
    async fn next_event(&mut self) -> Option<RawEvent> {
        self.recv().await
    }
}

#[async_trait]
impl RawSource for mpsc::UnboundedReceiver<RawEvent> {
    async fn next_event(&mut self) -> Option<RawEvent> {
        self.recv().await
    }
}
