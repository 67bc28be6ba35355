//! Reconciliation event sink.

use crate::resource::Resource;

/// Receives structured events from reconciliation, preview and listen.
pub trait Notifier: Send + Sync {
    /// The remote has no object for this resource.
    fn not_found(&self, resource: &Resource);

    fn no_changes(&self, resource: &Resource);

    /// Local and remote differ; `diff` is a unified diff (remote to local).
    fn has_changes(&self, resource: &Resource, diff: &str);

    fn added(&self, resource: &Resource);

    fn updated(&self, resource: &Resource);

    /// The handler for `kind` cannot perform `action`.
    fn not_supported(&self, kind: &str, name: &str, action: &str);

    fn info(&self, resource: Option<&Resource>, message: &str);

    fn warn(&self, resource: Option<&Resource>, message: &str);

    fn error(&self, resource: Option<&Resource>, message: &str);
}

/// Writes every event as one line through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

fn label(resource: Option<&Resource>) -> String {
    match resource {
        Some(r) => format!("{}.{} ", r.kind, r.uid),
        None => String::new(),
    }
}

impl Notifier for LogNotifier {
    fn not_found(&self, resource: &Resource) {
        log::warn!("{}.{} not present at remote", resource.kind, resource.uid);
    }

    fn no_changes(&self, resource: &Resource) {
        log::info!("{}.{} no differences", resource.kind, resource.uid);
    }

    fn has_changes(&self, resource: &Resource, diff: &str) {
        log::info!("{}.{} changes detected:\n{}", resource.kind, resource.uid, diff);
    }

    fn added(&self, resource: &Resource) {
        log::info!("{}.{} added", resource.kind, resource.uid);
    }

    fn updated(&self, resource: &Resource) {
        log::info!("{}.{} updated", resource.kind, resource.uid);
    }

    fn not_supported(&self, kind: &str, name: &str, action: &str) {
        log::warn!("{}.{} {} not supported", kind, name, action);
    }

    fn info(&self, resource: Option<&Resource>, message: &str) {
        log::info!("{}{}", label(resource), message);
    }

    fn warn(&self, resource: Option<&Resource>, message: &str) {
        log::warn!("{}{}", label(resource), message);
    }

    fn error(&self, resource: Option<&Resource>, message: &str) {
        log::error!("{}{}", label(resource), message);
    }
}
