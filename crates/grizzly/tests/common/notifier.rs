//! Notifier that records events for assertions.

#![allow(dead_code)]

use std::sync::Mutex;

use grizzly::{Notifier, Resource};

/// One captured notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NotFound(String),
    NoChanges(String),
    HasChanges(String, String),
    Added(String),
    Updated(String),
    NotSupported {
        kind: String,
        name: String,
        action: String,
    },
    Info(String),
    Warn(String),
    Error(String),
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Event>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Notifier for RecordingNotifier {
    fn not_found(&self, resource: &Resource) {
        self.push(Event::NotFound(resource.key()));
    }

    fn no_changes(&self, resource: &Resource) {
        self.push(Event::NoChanges(resource.key()));
    }

    fn has_changes(&self, resource: &Resource, diff: &str) {
        self.push(Event::HasChanges(resource.key(), diff.to_string()));
    }

    fn added(&self, resource: &Resource) {
        self.push(Event::Added(resource.key()));
    }

    fn updated(&self, resource: &Resource) {
        self.push(Event::Updated(resource.key()));
    }

    fn not_supported(&self, kind: &str, name: &str, action: &str) {
        self.push(Event::NotSupported {
            kind: kind.to_string(),
            name: name.to_string(),
            action: action.to_string(),
        });
    }

    fn info(&self, _resource: Option<&Resource>, message: &str) {
        self.push(Event::Info(message.to_string()));
    }

    fn warn(&self, _resource: Option<&Resource>, message: &str) {
        self.push(Event::Warn(message.to_string()));
    }

    fn error(&self, _resource: Option<&Resource>, message: &str) {
        self.push(Event::Error(message.to_string()));
    }
}
