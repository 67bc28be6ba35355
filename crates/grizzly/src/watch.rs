//! Local-to-remote sync: re-parse and apply whenever a watched file is written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEvent};
use tokio::sync::mpsc;
use tracing::{info_span, Instrument};

use crate::config::{Config, WatchOptions};
use crate::error::{GrizzlyError, Result};
use crate::parser::Parser;
use crate::reconciler::Reconciler;
use crate::shutdown::ShutdownSignal;

/// Watches one directory and reapplies a parser's whole source on writes.
pub struct SourceWatcher {
    reconciler: Reconciler,
    watch_dir: PathBuf,
    parser: Arc<dyn Parser>,
    options: WatchOptions,
}

impl SourceWatcher {
    pub fn new(config: Config, watch_dir: impl Into<PathBuf>, parser: Arc<dyn Parser>) -> Self {
        Self {
            reconciler: Reconciler::new(config),
            watch_dir: watch_dir.into(),
            parser,
            options: WatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    /// Watches until `shutdown` is triggered.
    ///
    /// Only setup failures are returned. Parse and apply errors during a cycle
    /// are logged and the watch carries on.
    pub async fn watch(&self, shutdown: &ShutdownSignal) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();
        let mut debouncer = new_debouncer(self.options.debounce, move |res: DebounceEventResult| {
            // Receiver gone means the loop has ended
            let _ = tx.send(res);
        })
        .map_err(|e| GrizzlyError::Watch(e.to_string()))?;

        debouncer
            .watcher()
            .watch(&self.watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| GrizzlyError::Watch(e.to_string()))?;

        let mut fingerprints = Fingerprints::scan(&self.watch_dir);
        log::info!("Watching for changes in {}", self.watch_dir.display());

        async {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    received = rx.recv() => match received {
                        Some(Ok(events)) => {
                            // Reads (including our own parse) also raise events
                            if fingerprints.record(&events) {
                                self.run_cycle().await;
                            }
                        }
                        Some(Err(e)) => log::error!("Watch error: {}", e),
                        None => break,
                    }
                }
            }
        }
        .instrument(info_span!("watch", dir = %self.watch_dir.display()))
        .await;

        log::info!("Stopped watching {}", self.watch_dir.display());
        Ok(())
    }

    /// Parses the whole source and applies it. Never fails.
    pub async fn run_cycle(&self) {
        log::info!("Changes detected. Applying {}", self.parser.name());
        let config = self.reconciler.config();
        let _guard = config.local_lock.acquire().await;

        let resources = match self.parser.parse(config) {
            Ok(resources) => resources,
            Err(e) => {
                log::error!("Error parsing {}: {}", self.parser.name(), e);
                return;
            }
        };
        if let Err(e) = self.reconciler.apply(&resources).await {
            log::error!("Error applying {}: {}", self.parser.name(), e);
        }
    }
}

/// Last seen modification time and length of each watched file.
#[derive(Debug, Default)]
struct Fingerprints {
    seen: HashMap<PathBuf, (SystemTime, u64)>,
}

impl Fingerprints {
    /// Snapshots the visible files directly inside `dir`.
    fn scan(dir: &Path) -> Self {
        let mut fingerprints = Self::default();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                fingerprints.changed(&entry.path());
            }
        }
        fingerprints
    }

    /// Updates the snapshot from a batch of events.
    ///
    /// Returns true when at least one visible file was written since it was
    /// last seen. Every event is recorded, not just the first changed one.
    fn record(&mut self, events: &[DebouncedEvent]) -> bool {
        events
            .iter()
            .fold(false, |written, event| self.changed(&event.path) || written)
    }

    fn changed(&mut self, path: &Path) -> bool {
        if is_hidden(path) {
            return false;
        }
        let Ok(meta) = std::fs::metadata(path) else {
            self.seen.remove(path);
            return false;
        };
        if !meta.is_file() {
            return false;
        }
        let state = (meta.modified().unwrap_or(UNIX_EPOCH), meta.len());
        self.seen.insert(path.to_path_buf(), state) != Some(state)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true)
}
