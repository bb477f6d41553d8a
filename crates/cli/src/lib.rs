//! Semitia CLI library
//!
//! Wires a [`watcher::Watcher`] to a command: every accepted event of the
//! selected kinds runs the configured command with the affected path(s).

pub mod args;
pub mod config;
pub mod dispatch;
pub mod filter;

use anyhow::{Context, Result};
use config::Settings;
use dispatch::Dispatcher;
use filter::PathFilter;
use tracing::{info, warn};
use watcher::Watcher;

/// Watch until Ctrl-C, dispatching every selected event
pub async fn run(settings: Settings) -> Result<()> {
    let roots = settings.roots()?;
    let filter = PathFilter::new(roots, settings.show_all, &settings.ignore)?;
    let dispatcher = Dispatcher::new(settings.action.clone(), filter, settings.json);

    let watcher = Watcher::new(settings.watch.clone()).context("Invalid watch configuration")?;
    let mut events = watcher.subscribe(settings.events.iter().copied());

    let abort = watcher.abort_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupted, stopping"),
            Err(e) => warn!(error = %e, "could not listen for Ctrl-C, stopping"),
        }
        abort.abort();
    });

    let dispatch = async {
        while let Some(event) = events.recv().await {
            if let Err(e) = dispatcher.dispatch(&event) {
                let message = format!("{:#}", e);
                warn!(%event, error = %message, "dispatch failed");
            }
        }
    };

    let (outcome, ()) = tokio::join!(watcher.watch_fs(), dispatch);
    outcome.context("Watcher stopped unexpectedly")
}
