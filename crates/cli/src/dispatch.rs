//! Running the configured command for each event

use crate::filter::PathFilter;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::ffi::OsString;
use tokio::process::{Child, Command};
use tracing::{debug, warn};
use watcher::WatchEvent;

/// What to run for an accepted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Command words, run as-is
    Shell(Vec<String>),
    /// `deno task` followed by these words
    Task(Vec<String>),
}

impl Action {
    /// Command words before the event paths
    pub fn argv(&self) -> Vec<String> {
        match self {
            Action::Shell(words) => words.clone(),
            Action::Task(words) => ["deno", "task"]
                .into_iter()
                .map(String::from)
                .chain(words.iter().cloned())
                .collect(),
        }
    }

    /// Full argument vector for one event; a move passes `from` then `to`
    pub fn command_line(&self, event: &WatchEvent) -> Vec<OsString> {
        self.argv()
            .into_iter()
            .map(OsString::from)
            .chain(event.paths().into_iter().map(|p| p.as_os_str().to_os_string()))
            .collect()
    }
}

/// Filters events and spawns one process per accepted event
pub struct Dispatcher {
    action: Action,
    filter: PathFilter,
    json: bool,
}

impl Dispatcher {
    pub fn new(action: Action, filter: PathFilter, json: bool) -> Self {
        Self {
            action,
            filter,
            json,
        }
    }

    /// Whether any path of the event survives the filter
    pub fn accepts(&self, event: &WatchEvent) -> bool {
        event.paths().into_iter().any(|path| !self.filter.is_ignored(path))
    }

    /// User-facing line announcing the event
    pub fn render(&self, event: &WatchEvent) -> Result<String> {
        if self.json {
            return serde_json::to_string(event).context("Failed to serialize event");
        }
        Ok(format!("{} {}", "dispatched:".green().bold(), event))
    }

    /// Start the command for `event` without waiting for it
    pub fn spawn(&self, event: &WatchEvent) -> Result<Child> {
        let argv = self.action.command_line(event);
        let (program, args) = argv.split_first().context("No command configured")?;

        Command::new(program)
            .args(args)
            .spawn()
            .with_context(|| format!("Failed to run {}", program.to_string_lossy()))
    }

    /// Announce and run the command for `event`
    ///
    /// Returns `Ok(false)` when the filter rejected the event. The exit
    /// status is logged once the process ends; it is never retried.
    pub fn dispatch(&self, event: &WatchEvent) -> Result<bool> {
        if !self.accepts(event) {
            debug!(%event, "filtered");
            return Ok(false);
        }

        println!("{}", self.render(event)?);

        let mut child = self.spawn(event)?;
        let event = event.to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!(%event, %status, "command finished"),
                Ok(status) => warn!(%event, %status, "command failed"),
                Err(e) => warn!(%event, error = %e, "could not wait for command"),
            }
        });

        Ok(true)
    }
}
