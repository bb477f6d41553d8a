//! Watcher error types

use thiserror::Error;

/// Errors surfaced by a running watcher
#[derive(Debug, Error)]
pub enum WatchError {
    /// The raw source ended while nobody asked the watcher to stop
    #[error("raw event source ended without an abort")]
    SourceClosed,

    /// Internal bookkeeping disagreed with itself; the watcher cannot continue
    #[error("watcher invariant violated: {0}")]
    Invariant(String),

    #[error("filesystem notification backend failed: {0}")]
    Backend(#[from] notify::Error),

    #[error("invalid watch configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
