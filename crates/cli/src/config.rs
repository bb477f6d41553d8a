//! Config file loading and merging with command-line flags
//!
//! The file is optional. Every value it sets can be overridden on the
//! command line:
//!
//! ```toml
//! [watch]
//! recursive = true
//! threshold_ms = 4
//!
//! [dispatch]
//! shell = ["cargo", "test"]
//! events = ["new", "modify"]
//! all = false
//! ignore = ["target/", "*.log"]
//! ```

use crate::args::Cli;
use crate::dispatch::Action;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use watcher::{EventKind, WatchConfig};

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "semitia.toml";

/// Contents of a config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub dispatch: DispatchSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    pub recursive: Option<bool>,
    pub threshold_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    pub shell: Option<Vec<String>>,
    pub task: Option<Vec<String>>,
    pub events: Option<Vec<EventKind>>,
    pub all: Option<bool>,
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl FileConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the explicit file, or the default one in `cwd` if it exists
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default = cwd.join(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            Self::load(&default)
        } else {
            Ok(Self::default())
        }
    }
}

/// Everything a run needs, after merging file and flags
#[derive(Debug, Clone)]
pub struct Settings {
    pub watch: WatchConfig,
    pub action: Action,
    pub events: BTreeSet<EventKind>,
    pub show_all: bool,
    pub ignore: Vec<String>,
    pub json: bool,
}

impl Settings {
    /// Merge flags over the file config and validate the result
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let FileConfig { watch, dispatch } = file;

        let action = resolve_action(cli, &dispatch)?;
        let events = resolve_events(cli, &dispatch)?;

        let mut config = if cli.dirs.is_empty() {
            WatchConfig::default()
        } else {
            WatchConfig::new(cli.dirs.clone())
        };
        config.recursive = !cli.no_recursive && watch.recursive.unwrap_or(true);
        if let Some(ms) = cli.threshold.or(watch.threshold_ms) {
            config.threshold = Duration::from_millis(ms);
        }
        config.validate().context("Invalid watch configuration")?;

        Ok(Self {
            watch: config,
            action,
            events,
            show_all: cli.all || dispatch.all.unwrap_or(false),
            ignore: dispatch.ignore,
            json: cli.json,
        })
    }

    /// Directories being watched, as absolute paths
    pub fn roots(&self) -> Result<Vec<PathBuf>> {
        self.watch
            .resolved_targets()
            .context("Failed to resolve watch targets")
    }
}

fn resolve_action(cli: &Cli, dispatch: &DispatchSection) -> Result<Action> {
    if !cli.shell.is_empty() {
        return Ok(Action::Shell(cli.shell.clone()));
    }
    if !cli.task.is_empty() {
        return Ok(Action::Task(cli.task.clone()));
    }

    match (&dispatch.shell, &dispatch.task) {
        (Some(_), Some(_)) => anyhow::bail!("Config sets both dispatch.shell and dispatch.task"),
        (Some(shell), None) if !shell.is_empty() => Ok(Action::Shell(shell.clone())),
        (None, Some(task)) if !task.is_empty() => Ok(Action::Task(task.clone())),
        _ => anyhow::bail!("No command to run: pass --shell <cmd> or --task <task>"),
    }
}

fn resolve_events(cli: &Cli, dispatch: &DispatchSection) -> Result<BTreeSet<EventKind>> {
    let mut events = BTreeSet::new();
    if cli.create {
        events.extend([EventKind::Touch, EventKind::New]);
    }
    if cli.modify {
        events.insert(EventKind::Modify);
    }
    if cli.remove {
        events.insert(EventKind::Remove);
    }
    if cli.moves {
        events.insert(EventKind::Move);
    }

    if events.is_empty() {
        if let Some(configured) = &dispatch.events {
            events.extend(configured.iter().copied());
        }
    }

    if events.is_empty() {
        anyhow::bail!("No events selected: pass --create, --modify, --remove or --move");
    }
    Ok(events)
}
