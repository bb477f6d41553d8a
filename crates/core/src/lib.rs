//! Shared event vocabulary for Semitia
//!
//! This crate provides:
//! - Raw change records as produced by a notification source
//! - The classified vocabulary emitted by the raw event interpreter
//! - The public event taxonomy surfaced to dispatchers
//! - The debounce window comparison used by every layer

pub mod event;
pub mod raw;
pub mod window;

// Re-exports
pub use event::{ClassifiedEvent, EventKind, IgnoreReason, UnknownEventKind, WatchEvent};
pub use raw::{RawEvent, RawKind, RawRecord, Rejected};
pub use window::{elapsed_between, within_window, DEFAULT_THRESHOLD};
