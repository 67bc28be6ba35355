//! In-memory handler standing in for a remote API.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use grizzly::{
    ChannelSubscription, GrizzlyError, Handler, ListenHandler, Manifest, Preview, PreviewHandler,
    PreviewOpts, Resource, Result, Subscription,
};

pub const KIND: &str = "Dashboard";
pub const NAME: &str = "test.dashboard";
pub const API_VERSION: &str = "grizzly.test/v1";

/// Handler whose remote is a map of uid to payload.
///
/// The remote assigns a `version` field on every write; `unprepare` strips it
/// and `prepare` carries it over, the way real APIs behave.
pub struct MemoryHandler {
    kind: String,
    name: String,
    extension: String,
    remote: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    subscription: Mutex<Option<ChannelSubscription>>,
    previews: bool,
    listens: bool,
    adds: AtomicUsize,
    updates: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemoryHandler {
    pub fn new() -> Self {
        Self::with_kind(KIND, NAME)
    }

    pub fn with_kind(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            extension: "yaml".to_string(),
            remote: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            subscription: Mutex::new(None),
            previews: true,
            listens: true,
            adds: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    pub fn without_preview(mut self) -> Self {
        self.previews = false;
        self
    }

    pub fn without_listen(mut self) -> Self {
        self.listens = false;
        self
    }

    /// Seeds the remote with a payload (version is added).
    pub fn seed(&self, uid: &str, detail: Value) {
        let mut detail = detail;
        if let Some(obj) = detail.as_object_mut() {
            obj.insert("version".to_string(), json!(1));
        }
        self.remote.lock().unwrap().insert(uid.to_string(), detail);
    }

    /// Makes every fetch of `uid` fail with a non-not-found error.
    pub fn fail_on(&self, uid: &str) {
        self.failing.lock().unwrap().insert(uid.to_string());
    }

    pub fn set_subscription(&self, subscription: ChannelSubscription) {
        *self.subscription.lock().unwrap() = Some(subscription);
    }

    pub fn stored(&self, uid: &str) -> Option<Value> {
        self.remote.lock().unwrap().get(uid).cloned()
    }

    pub fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn version_of(detail: &Value) -> i64 {
        detail.get("version").and_then(Value::as_i64).unwrap_or(0)
    }
}

#[async_trait]
impl Handler for MemoryHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn api_version(&self) -> &str {
        API_VERSION
    }

    fn get_extension(&self) -> &str {
        &self.extension
    }

    fn parse(&self, manifest: &Manifest) -> Result<Vec<Resource>> {
        let uid = manifest
            .spec
            .get("uid")
            .and_then(Value::as_str)
            .unwrap_or_else(|| manifest.name());
        if uid.is_empty() {
            let title = manifest
                .spec
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("untitled");
            return Err(GrizzlyError::MissingUids(vec![title.to_string()]));
        }
        Ok(vec![Resource::new(&self.kind, uid, manifest.spec.clone())])
    }

    async fn get_remote(&self, uid: &str) -> Result<Resource> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(uid) {
            return Err(GrizzlyError::FileOperation("remote unavailable".to_string()));
        }
        match self.remote.lock().unwrap().get(uid) {
            Some(detail) => Ok(Resource::new(&self.kind, uid, detail.clone())),
            None => Err(GrizzlyError::not_found(&self.kind, uid)),
        }
    }

    async fn add(&self, resource: &Resource) -> Result<()> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        let mut detail = resource.detail.clone();
        if let Some(obj) = detail.as_object_mut() {
            obj.insert("version".to_string(), json!(1));
        }
        self.remote
            .lock()
            .unwrap()
            .insert(resource.uid.clone(), detail);
        Ok(())
    }

    async fn update(&self, existing: &Resource, resource: &Resource) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut detail = resource.detail.clone();
        let next = Self::version_of(&resource.detail).max(Self::version_of(&existing.detail)) + 1;
        if let Some(obj) = detail.as_object_mut() {
            obj.insert("version".to_string(), json!(next));
        }
        self.remote
            .lock()
            .unwrap()
            .insert(resource.uid.clone(), detail);
        Ok(())
    }

    fn prepare(&self, existing: &Resource, resource: &Resource) -> Resource {
        let mut detail = resource.detail.clone();
        if let (Some(obj), Some(version)) = (detail.as_object_mut(), existing.detail.get("version"))
        {
            obj.insert("version".to_string(), version.clone());
        }
        resource.with_detail(detail)
    }

    fn unprepare(&self, resource: &Resource) -> Resource {
        let mut detail = resource.detail.clone();
        if let Some(obj) = detail.as_object_mut() {
            obj.remove("version");
        }
        resource.with_detail(detail)
    }

    fn as_preview(&self) -> Option<&dyn PreviewHandler> {
        if self.previews {
            Some(self)
        } else {
            None
        }
    }

    fn as_listen(&self) -> Option<&dyn ListenHandler> {
        if self.listens {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl PreviewHandler for MemoryHandler {
    async fn preview(&self, resource: &Resource, _opts: &PreviewOpts) -> Result<Option<Preview>> {
        if resource.detail.get("skipPreview").is_some() {
            return Ok(None);
        }
        Ok(Some(Preview {
            url: format!("https://snapshots.test/view/{}", resource.uid),
            delete_url: format!("https://snapshots.test/delete/{}", resource.uid),
        }))
    }
}

#[async_trait]
impl ListenHandler for MemoryHandler {
    fn channel(&self, id: &str) -> String {
        format!("grafana/dashboard/uid/{}", id)
    }

    async fn subscribe(&self, id: &str) -> Result<Box<dyn Subscription>> {
        match self.subscription.lock().unwrap().take() {
            Some(subscription) => Ok(Box::new(subscription)),
            None => Err(GrizzlyError::Subscription(format!("no channel for {}", id))),
        }
    }
}
