//! Test harness for isolated integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use grizzly::{Config, Reconciler, Registry};

use super::handler::MemoryHandler;
use super::notifier::RecordingNotifier;

/// Owns a temp directory, a handler and a notifier wired into a [`Config`].
pub struct TestHarness {
    pub temp_dir: TempDir,
    pub handler: Arc<MemoryHandler>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: Config,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_handler(MemoryHandler::new())
    }

    pub fn with_handler(handler: MemoryHandler) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let handler = Arc::new(handler);
        let notifier = Arc::new(RecordingNotifier::new());
        let registry = Registry::new().with_handler(handler.clone());
        let config = Config::new(registry, notifier.clone());
        Self {
            temp_dir,
            handler,
            notifier,
            config,
        }
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.config.clone())
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn read_file(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("Failed to read file")
    }
}

/// A one-document dashboard manifest.
pub fn dashboard_yaml(uid: &str, title: &str) -> String {
    format!(
        "apiVersion: grizzly.test/v1\nkind: Dashboard\nmetadata:\n  name: {uid}\nspec:\n  uid: {uid}\n  title: {title}\n"
    )
}

/// Dashboard payload as the handler parses it from [`dashboard_yaml`].
pub fn dashboard_spec(uid: &str, title: &str) -> Value {
    serde_json::json!({ "uid": uid, "title": title })
}

/// Polls `condition` until it holds or `timeout` passes.
pub async fn wait_until(timeout: std::time::Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    condition()
}
