//! Process-scoped configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::notifier::{LogNotifier, Notifier};
use crate::parser::evaluator::Evaluator;
use crate::parser::native::NativeFunctions;
use crate::registry::Registry;

/// Environment variable holding extra evaluator import paths.
pub const IMPORT_PATH_ENV: &str = "JSONNET_PATH";

/// Options for the parsing pipeline.
#[derive(Clone, Default)]
pub struct ParseOptions {
    /// Search path for evaluator imports, in priority order.
    pub import_paths: Vec<PathBuf>,
    /// Template engine for `.jsonnet`/`.libsonnet` sources.
    pub evaluator: Option<Arc<dyn Evaluator>>,
    /// Helper functions made available to the evaluator.
    pub native_functions: NativeFunctions,
}

impl ParseOptions {
    /// Reads import paths from `JSONNET_PATH`.
    pub fn from_env() -> Self {
        let import_paths = std::env::var_os(IMPORT_PATH_ENV)
            .map(|paths| {
                std::env::split_paths(&paths)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            import_paths,
            ..Self::default()
        }
    }

    pub fn with_import_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.import_paths.push(path.into());
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }
}

impl std::fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseOptions")
            .field("import_paths", &self.import_paths)
            .field("evaluator", &self.evaluator.is_some())
            .field("native_functions", &self.native_functions.names())
            .finish()
    }
}

/// Options for the watch loop.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Quiet period before a burst of file events triggers a run.
    pub debounce: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }
}

/// Single-writer gate over the local resource files.
///
/// Listen holds it while overwriting a file; Watch holds it while re-reading
/// and applying its source.
#[derive(Debug, Clone, Default)]
pub struct LocalLock {
    inner: Arc<Mutex<()>>,
}

impl LocalLock {
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }
}

/// Read-only bundle shared by every operation.
#[derive(Clone)]
pub struct Config {
    pub registry: Arc<Registry>,
    pub notifier: Arc<dyn Notifier>,
    pub parse: ParseOptions,
    pub local_lock: LocalLock,
}

impl Config {
    /// Creates a config with default parse options.
    pub fn new(registry: Registry, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            registry: Arc::new(registry),
            notifier,
            parse: ParseOptions::default(),
            local_lock: LocalLock::default(),
        }
    }

    /// Creates a config that reports through the `log` facade.
    pub fn with_log_notifier(registry: Registry) -> Self {
        Self::new(registry, Arc::new(LogNotifier))
    }

    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("registry", &self.registry)
            .field("parse", &self.parse)
            .finish()
    }
}
