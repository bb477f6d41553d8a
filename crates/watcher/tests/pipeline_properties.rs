//! End-to-end properties of the watcher
//!
//! Drives a real [`Watcher`] through a channel source on a paused clock, so
//! every timing window is exact and runs are reproducible.

use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use watcher::{
    AbortHandle, EventKind, RawEvent, RawKind, Subscription, WatchConfig, WatchError, WatchEvent,
    Watcher,
};

/// Comfortably longer than two debounce windows
const SETTLE: Duration = Duration::from_millis(50);

struct Harness {
    tx: Option<mpsc::UnboundedSender<RawEvent>>,
    events: Subscription,
    abort: AbortHandle,
    task: JoinHandle<watcher::Result<()>>,
}

impl Harness {
    fn start() -> Self {
        Self::start_with(EventKind::ALL)
    }

    fn start_with(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        let watcher = Watcher::new(WatchConfig::default()).unwrap();
        let events = watcher.subscribe(kinds);
        let abort = watcher.abort_handle();
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move { watcher.watch(rx).await });

        Self {
            tx: Some(tx),
            events,
            abort,
            task,
        }
    }

    fn send(&self, kind: RawKind, path: &str) {
        self.send_raw(RawEvent::new(kind, path));
    }

    fn send_raw(&self, event: RawEvent) {
        self.tx.as_ref().unwrap().send(event).unwrap();
    }

    /// Abort and collect everything delivered before the abort
    async fn finish(mut self) -> Vec<WatchEvent> {
        self.abort.abort();
        self.task.await.unwrap().unwrap();

        let mut out = Vec::new();
        while let Some(event) = self.events.recv().await {
            out.push(event);
        }
        out
    }
}

fn at(path: &str) -> PathBuf {
    PathBuf::from(path)
}

async fn settle() {
    tokio::time::sleep(SETTLE).await;
}

#[tokio::test(start_paused = true)]
async fn test_lone_create_is_touch() {
    let harness = Harness::start();
    harness.send(RawKind::Create, "/w/a");
    settle().await;

    assert_eq!(harness.finish().await, vec![WatchEvent::Touch { at: at("/w/a") }]);
}

#[tokio::test(start_paused = true)]
async fn test_create_with_write_is_new() {
    let harness = Harness::start();
    harness.send(RawKind::Create, "/w/a");
    harness.send(RawKind::Modify, "/w/a");
    settle().await;

    assert_eq!(harness.finish().await, vec![WatchEvent::New { at: at("/w/a") }]);
}

#[tokio::test(start_paused = true)]
async fn test_create_with_chunked_write_is_single_new() {
    let harness = Harness::start();
    harness.send(RawKind::Create, "/w/a");
    harness.send(RawKind::Modify, "/w/a");
    harness.send(RawKind::Modify, "/w/a");
    harness.send(RawKind::Access, "/w/a");
    harness.send(RawKind::Modify, "/w/a");
    settle().await;

    assert_eq!(harness.finish().await, vec![WatchEvent::New { at: at("/w/a") }]);
}

#[tokio::test(start_paused = true)]
async fn test_double_modify_is_single_modify() {
    let harness = Harness::start();
    harness.send(RawKind::Modify, "/w/a");
    harness.send(RawKind::Modify, "/w/a");
    settle().await;

    assert_eq!(harness.finish().await, vec![WatchEvent::Modify { at: at("/w/a") }]);
}

#[tokio::test(start_paused = true)]
async fn test_sustained_write_to_existing_file() {
    let harness = Harness::start();
    for _ in 0..100 {
        harness.send(RawKind::Modify, "/w/a");
        tokio::time::sleep(Duration::from_millis(3)).await;
    }
    settle().await;

    assert_eq!(
        harness.finish().await,
        vec![WatchEvent::Modify { at: at("/w/a") }; 50]
    );
}

#[tokio::test(start_paused = true)]
async fn test_sustained_write_after_create() {
    let harness = Harness::start();
    harness.send(RawKind::Create, "/w/a");
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(3)).await;
        harness.send(RawKind::Modify, "/w/a");
    }
    settle().await;

    // The write keeps being reported well past the create's window
    let mut expected = vec![WatchEvent::New { at: at("/w/a") }];
    expected.extend(vec![WatchEvent::Modify { at: at("/w/a") }; 50]);
    assert_eq!(harness.finish().await, expected);
}

#[tokio::test(start_paused = true)]
async fn test_lone_modify_settles() {
    let harness = Harness::start();
    harness.send(RawKind::Modify, "/w/a");
    settle().await;

    assert_eq!(harness.finish().await, vec![WatchEvent::Modify { at: at("/w/a") }]);
}

#[tokio::test(start_paused = true)]
async fn test_modify_pair_on_different_paths_is_move() {
    let harness = Harness::start();
    harness.send(RawKind::Modify, "/w/a");
    harness.send(RawKind::Modify, "/w/b");
    settle().await;

    assert_eq!(
        harness.finish().await,
        vec![WatchEvent::Move {
            from: at("/w/a"),
            to: at("/w/b"),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_momentary_file_is_not_reported() {
    let harness = Harness::start();
    harness.send(RawKind::Create, "/w/a");
    harness.send(RawKind::Remove, "/w/a");
    harness.send(RawKind::Create, "/w/b");
    harness.send(RawKind::Modify, "/w/b");
    harness.send(RawKind::Remove, "/w/b");
    settle().await;

    assert_eq!(harness.finish().await, vec![]);
}

#[tokio::test(start_paused = true)]
async fn test_lone_remove() {
    let harness = Harness::start();
    harness.send(RawKind::Remove, "/w/a");
    settle().await;

    assert_eq!(harness.finish().await, vec![WatchEvent::Remove { at: at("/w/a") }]);
}

#[tokio::test(start_paused = true)]
async fn test_remove_after_window_is_reported() {
    let harness = Harness::start();
    harness.send(RawKind::Create, "/w/a");
    settle().await;
    harness.send(RawKind::Remove, "/w/a");
    settle().await;

    assert_eq!(
        harness.finish().await,
        vec![
            WatchEvent::Touch { at: at("/w/a") },
            WatchEvent::Remove { at: at("/w/a") },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_notifications_are_dropped() {
    let harness = Harness::start();
    harness.send_raw(RawEvent::with_paths(
        RawKind::Modify,
        vec![at("/w/a"), at("/w/b")],
    ));
    harness.send_raw(RawEvent::new(RawKind::Create, "/w/c").flagged("Rescan"));
    harness.send(RawKind::Access, "/w/d");
    harness.send(RawKind::Other, "/w/e");
    harness.send(RawKind::Remove, "/w/f");
    settle().await;

    assert_eq!(harness.finish().await, vec![WatchEvent::Remove { at: at("/w/f") }]);
}

#[tokio::test(start_paused = true)]
async fn test_subscription_receives_only_requested_kinds() {
    let harness = Harness::start_with([EventKind::Touch]);
    harness.send(RawKind::Create, "/w/a");
    harness.send(RawKind::Remove, "/w/b");
    settle().await;

    assert_eq!(harness.finish().await, vec![WatchEvent::Touch { at: at("/w/a") }]);
}

#[tokio::test(start_paused = true)]
async fn test_replay_is_deterministic() {
    async fn run() -> Vec<WatchEvent> {
        let harness = Harness::start();
        harness.send(RawKind::Create, "/w/a");
        harness.send(RawKind::Modify, "/w/a");
        harness.send(RawKind::Modify, "/w/b");
        tokio::time::sleep(Duration::from_millis(2)).await;
        harness.send(RawKind::Modify, "/w/c");
        harness.send(RawKind::Create, "/w/d");
        settle().await;
        harness.send(RawKind::Modify, "/w/d");
        harness.send(RawKind::Modify, "/w/e");
        harness.send(RawKind::Remove, "/w/b");
        settle().await;
        harness.finish().await
    }

    let first = run().await;
    let second = run().await;

    assert_eq!(
        first,
        vec![
            WatchEvent::Move {
                from: at("/w/b"),
                to: at("/w/c"),
            },
            WatchEvent::New { at: at("/w/a") },
            WatchEvent::Touch { at: at("/w/d") },
            WatchEvent::Move {
                from: at("/w/d"),
                to: at("/w/e"),
            },
            WatchEvent::Remove { at: at("/w/b") },
        ]
    );
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_outstanding_timers() {
    let mut harness = Harness::start();
    harness.send(RawKind::Create, "/w/a");
    harness.send(RawKind::Modify, "/w/b");

    // Records are processed, their timers are still pending
    tokio::time::sleep(Duration::from_millis(1)).await;

    harness.abort.abort();
    harness.abort.abort();
    assert!(harness.abort.is_aborted());

    settle().await;
    assert!(harness.events.try_recv().is_none());
    assert!(harness.finish().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_pending_touch() {
    let mut harness = Harness::start();
    harness.send(RawKind::Create, "/w/a");

    // The create settled at 4ms; only the touch confirmation is pending
    tokio::time::sleep(Duration::from_millis(6)).await;
    assert!(harness.events.try_recv().is_none());

    harness.abort.abort();

    settle().await;
    assert!(harness.events.try_recv().is_none());
    assert!(harness.finish().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_source_exhaustion_is_an_error() {
    let mut harness = Harness::start();
    harness.send(RawKind::Create, "/w/a");
    drop(harness.tx.take());

    let result = (&mut harness.task).await.unwrap();
    assert!(matches!(result, Err(WatchError::SourceClosed)));

    // The pending touch died with the watcher
    settle().await;
    assert_eq!(harness.events.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_subscription_is_a_stream() {
    let harness = Harness::start();
    harness.send(RawKind::Modify, "/w/a");
    harness.send(RawKind::Modify, "/w/a");
    harness.send(RawKind::Remove, "/w/b");
    settle().await;

    let Harness {
        events,
        abort,
        task,
        tx: _tx,
    } = harness;
    abort.abort();
    task.await.unwrap().unwrap();

    let collected: Vec<EventKind> = events.map(|event| event.kind()).collect().await;
    assert_eq!(collected, vec![EventKind::Modify, EventKind::Remove]);
}
