//! The handler plugin boundary.
//!
//! A [`Handler`] implements parsing, fetch and sync for one resource kind.
//! Previews and push subscriptions are optional capabilities, exposed through
//! [`Handler::as_preview`] and [`Handler::as_listen`] and queried only by the
//! operations that need them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::resource::{Manifest, Resource};

/// A pluggable strategy for one resource kind.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Registry name, also the UID prefix (`grafana.dashboard`).
    fn name(&self) -> &str;

    /// Resource kind (`Dashboard`).
    fn kind(&self) -> &str;

    /// API version written into exported manifests.
    fn api_version(&self) -> &str;

    /// File extension used when exporting resources of this kind.
    fn get_extension(&self) -> &str;

    /// Parses a manifest into one or more resources.
    ///
    /// Return [`GrizzlyError::MissingUids`](crate::GrizzlyError::MissingUids) for
    /// manifests that carry no identifying uid; the pipeline aggregates these.
    fn parse(&self, manifest: &Manifest) -> Result<Vec<Resource>>;

    /// Fetches the remote object for `uid`.
    ///
    /// Returns [`GrizzlyError::NotFound`](crate::GrizzlyError::NotFound) when the
    /// remote has no such object.
    async fn get_remote(&self, uid: &str) -> Result<Resource>;

    /// Creates a resource at the remote.
    async fn add(&self, resource: &Resource) -> Result<()>;

    /// Replaces `existing` at the remote with `resource`.
    async fn update(&self, existing: &Resource, resource: &Resource) -> Result<()>;

    /// Merges server-assigned fields of `existing` into a copy of `resource`.
    fn prepare(&self, _existing: &Resource, resource: &Resource) -> Resource {
        resource.clone()
    }

    /// Strips server-assigned fields from a remote resource.
    fn unprepare(&self, resource: &Resource) -> Resource {
        resource.clone()
    }

    /// Canonical text used for comparison and display.
    fn get_representation(&self, resource: &Resource) -> Result<String> {
        resource.json_representation()
    }

    fn as_preview(&self) -> Option<&dyn PreviewHandler> {
        None
    }

    fn as_listen(&self) -> Option<&dyn ListenHandler> {
        None
    }
}

/// Handlers that can publish a shareable preview of a resource.
#[async_trait]
pub trait PreviewHandler: Handler {
    /// Publishes a preview and returns where to find and delete it.
    ///
    /// Returns `Ok(None)` for resources that have nothing to preview.
    async fn preview(&self, resource: &Resource, opts: &PreviewOpts) -> Result<Option<Preview>>;
}

/// Handlers that can subscribe to remote change notifications.
#[async_trait]
pub trait ListenHandler: Handler {
    /// Name of the push channel carrying notifications for `id`.
    fn channel(&self, id: &str) -> String;

    /// Connects to the push transport and subscribes to `channel(id)`.
    async fn subscribe(&self, id: &str) -> Result<Box<dyn Subscription>>;
}

/// A live subscription on a push channel.
///
/// Reconnect and backoff belong to the transport; it reports a completed
/// reconnect with [`SubscriptionEvent::Reconnected`].
#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next event. `None` means the transport has closed.
    async fn next_event(&mut self) -> Option<SubscriptionEvent>;
}

/// Events delivered by a [`Subscription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// Raw publication payload.
    Publication(Vec<u8>),
    /// The transport reconnected; publications may have been missed.
    Reconnected,
    /// The transport lost its connection and is retrying.
    Disconnected(String),
}

/// Payload published on a per-UID channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub uid: String,
    pub action: String,
    pub user_id: i64,
}

impl PushPayload {
    /// The only action that triggers a resync.
    pub const SAVED: &'static str = "saved";

    pub fn is_saved(&self) -> bool {
        self.action == Self::SAVED
    }
}

/// What to do with a resource whose handler has no preview capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedPolicy {
    /// Notify and end the whole preview command.
    #[default]
    Stop,
    /// Notify and carry on with the next resource.
    Skip,
}

/// Options for preview publication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOpts {
    /// Seconds until the preview expires; zero keeps it forever.
    #[serde(default)]
    pub expires_seconds: u64,
    #[serde(default)]
    pub on_unsupported: UnsupportedPolicy,
}

/// A published preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub url: String,
    pub delete_url: String,
}
