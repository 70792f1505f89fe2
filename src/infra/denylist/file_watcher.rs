// Hot-reload of the denylist file.
//
// The watcher does one reload up front, then reloads on every raw filesystem
// notification for the file until the shutdown signal flips to `true`.
// Notifications are not debounced: a single save usually produces several
// events, and each one triggers a (cheap, idempotent) reload.

use std::sync::Arc;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::file_source::FileDenylistSource;
use crate::core::moderation::{DenylistSource, DenylistStore};

/// Lifecycle of the watcher task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Watching,
    Stopped,
}

type EventReceiver = mpsc::UnboundedReceiver<notify::Result<Event>>;

pub struct DenylistWatcher {
    store: Arc<DenylistStore>,
    source: Arc<FileDenylistSource>,
    retry_interval: Duration,
}

impl DenylistWatcher {
    pub fn new(
        store: Arc<DenylistStore>,
        source: Arc<FileDenylistSource>,
        retry_interval: Duration,
    ) -> Self {
        Self {
            store,
            source,
            retry_interval,
        }
    }

    /// Run the watcher on its own task.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<WatcherState> {
        tokio::spawn(self.run(shutdown))
    }

    /// Reload once, then keep reloading on file changes until shutdown.
    ///
    /// If the watch cannot be set up the denylist keeps whatever the initial
    /// reload produced, and setup is retried every `retry_interval`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> WatcherState {
        self.reload().await;

        let filepath = self.source.location();
        tracing::info!(filepath = %filepath, "Monitoring denylist for file changes");

        loop {
            let (watcher, events) = match self.start_watching() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::error!(
                        filepath = %filepath,
                        error = %e,
                        retry_in_secs = self.retry_interval.as_secs(),
                        "Failed to watch denylist, changes will not be picked up until this succeeds"
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(self.retry_interval) => {
                            // The file may have come back while we were not watching it.
                            self.reload().await;
                            continue;
                        }
                        _ = shutdown_requested(&mut shutdown) => break,
                    }
                }
            };

            match self.watch_until_stopped(watcher, events, &mut shutdown).await {
                WatcherState::Stopped => break,
                WatcherState::Watching => {
                    tracing::warn!(filepath = %filepath, "Denylist watch lost, re-registering");
                }
            }
        }

        tracing::info!(filepath = %filepath, "Stopped monitoring denylist");
        WatcherState::Stopped
    }

    /// Register interest in the file; events arrive on the returned channel.
    fn start_watching(&self) -> notify::Result<(RecommendedWatcher, EventReceiver)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the watcher is being torn down.
            let _ = tx.send(res);
        })?;
        watcher.watch(self.source.path(), RecursiveMode::NonRecursive)?;

        Ok((watcher, rx))
    }

    /// Returns `Stopped` on shutdown, or `Watching` when the watch needs to
    /// be registered again (file removed/replaced, or the channel closed).
    async fn watch_until_stopped(
        &self,
        watcher: RecommendedWatcher,
        mut events: EventReceiver,
        shutdown: &mut watch::Receiver<bool>,
    ) -> WatcherState {
        // Dropping the watcher unregisters the watch, so keep it for the whole loop.
        let _watcher = watcher;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(Ok(event)) => {
                        tracing::debug!(kind = ?event.kind, "Denylist file event");
                        self.reload().await;

                        // Editors that save by rename leave us watching a dead inode.
                        if matches!(
                            event.kind,
                            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
                        ) {
                            return WatcherState::Watching;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Denylist watcher reported an error");
                    }
                    None => return WatcherState::Watching,
                },
                _ = shutdown_requested(shutdown) => return WatcherState::Stopped,
            }
        }
    }

    async fn reload(&self) {
        // Failures are logged by the store and leave the last good list active.
        let _ = self.store.reload(self.source.as_ref()).await;
    }
}

/// Resolves once shutdown is signalled (or the sender is gone).
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
