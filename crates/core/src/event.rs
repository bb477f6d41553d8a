//! Classified and public event vocabularies
//!
//! Two closed sum types, one per layer:
//! - [`ClassifiedEvent`] is what the raw event interpreter produces. It
//!   still carries diagnostics (`Ignore`) and suppressed lifecycles
//!   (`Momentary`).
//! - [`WatchEvent`] is the public contract handed to dispatchers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Why the interpreter produced no settled event for a raw record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// A create record arrived; its classification is pending
    InitialCreate,
    /// Modify noise accompanying a create that has not settled yet
    WithCreate,
    /// A transient path advanced from create to modify
    MomentaryProgress,
    /// A modify record arrived; its classification is pending
    InitialModify,
}

impl IgnoreReason {
    pub fn as_str(self) -> &'static str {
        match self {
            IgnoreReason::InitialCreate => "initial-create",
            IgnoreReason::WithCreate => "with-create",
            IgnoreReason::MomentaryProgress => "momentary-progress",
            IgnoreReason::InitialModify => "initial-modify",
        }
    }
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the raw event interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedEvent {
    /// Diagnostic only, never leaves the interpreter's consumer
    Ignore { reason: IgnoreReason },
    /// Path appeared and vanished before anything settled
    Momentary { at: PathBuf },
    /// Path creation settled
    Create { at: PathBuf },
    /// Path content changed
    Modify { at: PathBuf },
    /// Path was renamed
    Move { from: PathBuf, to: PathBuf },
    /// Path was removed
    Remove { at: PathBuf },
}

impl fmt::Display for ClassifiedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifiedEvent::Ignore { reason } => write!(f, "ignore ({})", reason),
            ClassifiedEvent::Momentary { at } => write!(f, "momentary {}", at.display()),
            ClassifiedEvent::Create { at } => write!(f, "create {}", at.display()),
            ClassifiedEvent::Modify { at } => write!(f, "modify {}", at.display()),
            ClassifiedEvent::Move { from, to } => {
                write!(f, "move {} -> {}", from.display(), to.display())
            }
            ClassifiedEvent::Remove { at } => write!(f, "remove {}", at.display()),
        }
    }
}

/// Public event kinds a dispatcher can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Created, and nothing else happened within the window
    Touch,
    /// Created and written within the window
    New,
    /// Pre-existing path was written
    Modify,
    /// Path was renamed
    Move,
    /// Path was removed
    Remove,
}

impl EventKind {
    /// Every public kind, in declaration order
    pub const ALL: [EventKind; 5] = [
        EventKind::Touch,
        EventKind::New,
        EventKind::Modify,
        EventKind::Move,
        EventKind::Remove,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Touch => "touch",
            EventKind::New => "new",
            EventKind::Modify => "modify",
            EventKind::Move => "move",
            EventKind::Remove => "remove",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event kind name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind {0:?} (expected touch, new, modify, move or remove)")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// Public semantic event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WatchEvent {
    Touch { at: PathBuf },
    New { at: PathBuf },
    Modify { at: PathBuf },
    Move { from: PathBuf, to: PathBuf },
    Remove { at: PathBuf },
}

impl WatchEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WatchEvent::Touch { .. } => EventKind::Touch,
            WatchEvent::New { .. } => EventKind::New,
            WatchEvent::Modify { .. } => EventKind::Modify,
            WatchEvent::Move { .. } => EventKind::Move,
            WatchEvent::Remove { .. } => EventKind::Remove,
        }
    }

    /// Affected paths, `from` before `to` for moves
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            WatchEvent::Touch { at }
            | WatchEvent::New { at }
            | WatchEvent::Modify { at }
            | WatchEvent::Remove { at } => vec![at.as_path()],
            WatchEvent::Move { from, to } => vec![from.as_path(), to.as_path()],
        }
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchEvent::Move { from, to } => {
                write!(f, "move {} -> {}", from.display(), to.display())
            }
            other => write!(f, "{} {}", other.kind(), other.paths()[0].display()),
        }
    }
}
