//! Platform filesystem notifications
//!
//! Wraps the `notify` crate's recommended backend (inotify, FSEvents,
//! ReadDirectoryChangesW, ...) as a [`RawSource`].

use crate::config::WatchConfig;
use crate::error::Result;
use crate::source::RawSource;
use async_trait::async_trait;
use notify::event::ModifyKind;
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use semitia_core::{RawEvent, RawKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Raw source backed by the platform's notification API
pub struct NotifySource {
    /// Channel fed by the backend's callback thread
    rx: mpsc::UnboundedReceiver<RawEvent>,
    /// Backend handle, must stay alive while watching
    _watcher: RecommendedWatcher,
}

impl NotifySource {
    /// Start watching every configured target
    pub fn new(config: &WatchConfig) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    // Receiver gone means the watcher is shutting down
                    let _ = tx.send(translate(event));
                }
                Err(e) => warn!(error = %e, "notify backend error"),
            }
        })?;

        let mode = if config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        for target in config.resolved_targets()? {
            watcher.watch(&target, mode)?;
            info!(target = %target.display(), recursive = config.recursive, "watching");
        }

        Ok(Self {
            rx,
            _watcher: watcher,
        })
    }
}

#[async_trait]
impl RawSource for NotifySource {
    async fn next_event(&mut self) -> Option<RawEvent> {
        self.rx.recv().await
    }
}

/// Convert a backend event into a raw event
pub fn translate(event: notify::Event) -> RawEvent {
    let flag = event.flag().map(|flag| format!("{:?}", flag));

    RawEvent {
        kind: raw_kind(&event.kind),
        paths: event.paths,
        flag,
    }
}

/// Map backend kinds onto the raw vocabulary
///
/// Renames surface as modify notifications. Metadata-only changes (chmod,
/// timestamps) carry no content change and map to `Other`.
pub fn raw_kind(kind: &notify::EventKind) -> RawKind {
    match kind {
        notify::EventKind::Create(_) => RawKind::Create,
        notify::EventKind::Modify(ModifyKind::Metadata(_)) => RawKind::Other,
        notify::EventKind::Modify(_) => RawKind::Modify,
        notify::EventKind::Remove(_) => RawKind::Remove,
        notify::EventKind::Access(_) => RawKind::Access,
        notify::EventKind::Any | notify::EventKind::Other => RawKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, Flag, MetadataKind, RenameMode};
    use std::path::PathBuf;

    #[test]
    fn test_kind_mapping() {
        use notify::EventKind;

        assert_eq!(raw_kind(&EventKind::Create(CreateKind::File)), RawKind::Create);
        assert_eq!(
            raw_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            RawKind::Modify
        );
        assert_eq!(
            raw_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            RawKind::Modify
        );
        assert_eq!(
            raw_kind(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))),
            RawKind::Other
        );
        assert_eq!(
            raw_kind(&EventKind::Remove(notify::event::RemoveKind::File)),
            RawKind::Remove
        );
        assert_eq!(raw_kind(&EventKind::Access(AccessKind::Read)), RawKind::Access);
        assert_eq!(raw_kind(&EventKind::Any), RawKind::Other);
    }

    #[test]
    fn test_translate_keeps_paths_and_flag() {
        let event = notify::Event::new(notify::EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/w/a"))
            .add_path(PathBuf::from("/w/b"))
            .set_flag(Flag::Rescan);

        let raw = translate(event);
        assert_eq!(raw.kind, RawKind::Modify);
        assert_eq!(raw.paths, vec![PathBuf::from("/w/a"), PathBuf::from("/w/b")]);
        assert_eq!(raw.flag.as_deref(), Some("Rescan"));
    }
}
