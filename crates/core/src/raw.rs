//! Raw change records
//!
//! A source hands over [`RawEvent`]s exactly as the platform reported them.
//! Only events naming a single path and carrying no platform flag are
//! accepted as [`RawRecord`]s; everything else is filtered at the boundary.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Kind of a raw change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKind {
    /// Path was created
    Create,
    /// Path content or name changed
    Modify,
    /// Path was removed
    Remove,
    /// Path was read or opened
    Access,
    /// Anything the platform could not categorize
    Other,
}

impl RawKind {
    /// Whether records of this kind drive classification at all
    pub fn is_interpretable(self) -> bool {
        matches!(self, RawKind::Create | RawKind::Modify | RawKind::Remove)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RawKind::Create => "create",
            RawKind::Modify => "modify",
            RawKind::Remove => "remove",
            RawKind::Access => "access",
            RawKind::Other => "other",
        }
    }
}

impl fmt::Display for RawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification as delivered by a source, before boundary filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Type of change
    pub kind: RawKind,
    /// Paths named by the notification
    pub paths: Vec<PathBuf>,
    /// Platform flag attached to the notification (e.g. a rescan request)
    pub flag: Option<String>,
}

impl RawEvent {
    /// Create an unflagged single-path event
    pub fn new(kind: RawKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            paths: vec![path.into()],
            flag: None,
        }
    }

    /// Create an unflagged event naming any number of paths
    pub fn with_paths(kind: RawKind, paths: Vec<PathBuf>) -> Self {
        Self {
            kind,
            paths,
            flag: None,
        }
    }

    /// Attach a platform flag
    pub fn flagged(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    /// Accept this event as a single-path record observed at `observed_at`
    ///
    /// Returns [`Rejected`] for flagged or multi-path notifications.
    pub fn into_record(mut self, observed_at: Instant) -> Result<RawRecord, Rejected> {
        if let Some(flag) = self.flag {
            return Err(Rejected::Flagged(flag));
        }

        if self.paths.len() != 1 {
            return Err(Rejected::PathCount(self.paths.len()));
        }

        let path = self.paths.remove(0);
        Ok(RawRecord {
            kind: self.kind,
            path,
            observed_at,
        })
    }
}

/// Reason a raw event was filtered at the boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("notification names {0} paths, expected exactly one")]
    PathCount(usize),

    #[error("notification carries platform flag {0:?}")]
    Flagged(String),
}

/// A single-path record accepted for interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Type of change
    pub kind: RawKind,
    /// Affected path
    pub path: PathBuf,
    /// When the record was taken off the source
    pub observed_at: Instant,
}

impl RawRecord {
    pub fn new(kind: RawKind, path: impl Into<PathBuf>, observed_at: Instant) -> Self {
        Self {
            kind,
            path: path.into(),
            observed_at,
        }
    }
}
