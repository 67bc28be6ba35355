//! Resource and manifest types.
//!
//! A [`Manifest`] is the generic K8s-style document (`apiVersion`, `kind`,
//! `metadata`, `spec`) produced by decoding or evaluation. Handlers turn
//! manifests into typed [`Resource`]s, which are collected in a
//! [`ResourceList`] keyed by `Kind.uid`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GrizzlyError, Result};

/// A generic decoded document, prior to handler-specific parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// API version, e.g. `grizzly.grafana.com/v1alpha1`.
    #[serde(default)]
    pub api_version: String,

    /// The resource kind, used to route the manifest to its handler.
    pub kind: String,

    /// Free-form metadata. `name` identifies the resource.
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// The handler-defined payload.
    #[serde(default)]
    pub spec: Value,
}

impl Manifest {
    /// Creates a manifest with a name and spec.
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        spec: Value,
    ) -> Self {
        let mut metadata = Map::new();
        metadata.insert("name".to_string(), Value::String(name.into()));
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata,
            spec,
        }
    }

    /// Decodes a manifest from a generic JSON tree.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Returns `metadata.name`, or an empty string when absent.
    pub fn name(&self) -> &str {
        self.metadata_str("name").unwrap_or("")
    }

    /// Returns a string metadata entry.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// One configuration object intended to exist at a remote endpoint.
///
/// Resources are never mutated in place by reconciliation: handler transforms
/// take references and return new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// The resource kind, matching the owning handler's `kind()`.
    pub kind: String,
    /// Identifier of the resource at the remote, unique within its kind.
    pub uid: String,
    /// Name of the source this resource came from.
    pub filename: String,
    /// Location of the resource inside the evaluated tree.
    #[serde(default)]
    pub json_path: String,
    /// Handler-defined payload.
    pub detail: Value,
}

impl Resource {
    /// Creates a new resource.
    pub fn new(kind: impl Into<String>, uid: impl Into<String>, detail: Value) -> Self {
        Self {
            kind: kind.into(),
            uid: uid.into(),
            filename: String::new(),
            json_path: String::new(),
            detail,
        }
    }

    /// Sets the source filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Sets the path inside the evaluated tree.
    pub fn with_json_path(mut self, json_path: impl Into<String>) -> Self {
        self.json_path = json_path.into();
        self
    }

    /// Returns a copy of this resource carrying a different payload.
    pub fn with_detail(&self, detail: Value) -> Self {
        Self {
            detail,
            ..self.clone()
        }
    }

    /// Returns the list key, `Kind.uid`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.kind, self.uid)
    }

    /// Returns the resource name (its uid).
    pub fn name(&self) -> &str {
        &self.uid
    }

    /// Converts the resource back into a full manifest.
    pub fn to_manifest(&self, api_version: &str) -> Manifest {
        Manifest::new(api_version, &self.kind, &self.uid, self.detail.clone())
    }

    /// Pretty JSON rendering of the payload.
    pub fn json_representation(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.detail)?)
    }
}

/// Resources keyed by `Kind.uid`, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceList {
    resources: IndexMap<String, Resource>,
}

impl ResourceList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resource. Fails if its key is already present.
    pub fn insert(&mut self, resource: Resource) -> Result<()> {
        let key = resource.key();
        if self.resources.contains_key(&key) {
            return Err(GrizzlyError::DuplicateResource { key });
        }
        self.resources.insert(key, resource);
        Ok(())
    }

    /// Appends every resource from `other`, failing on the first duplicate.
    pub fn extend(&mut self, other: impl IntoIterator<Item = Resource>) -> Result<()> {
        for resource in other {
            self.insert(resource)?;
        }
        Ok(())
    }

    /// Looks up a resource by key.
    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.resources.get(key)
    }

    /// Iterates resources in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Returns the keys in processing order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl IntoIterator for ResourceList {
    type Item = Resource;
    type IntoIter = indexmap::map::IntoValues<String, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_values()
    }
}

impl<'a> IntoIterator for &'a ResourceList {
    type Item = &'a Resource;
    type IntoIter = indexmap::map::Values<'a, String, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.values()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_key() {
        let resource = Resource::new("Dashboard", "abc123", json!({}));
        assert_eq!(resource.key(), "Dashboard.abc123");
        assert_eq!(resource.name(), "abc123");
    }

    #[test]
    fn test_with_detail_leaves_original_untouched() {
        let original = Resource::new("Dashboard", "abc", json!({"title": "a"}));
        let changed = original.with_detail(json!({"title": "b"}));
        assert_eq!(original.detail["title"], "a");
        assert_eq!(changed.detail["title"], "b");
        assert_eq!(changed.uid, "abc");
    }

    #[test]
    fn test_list_rejects_duplicate_keys() {
        let mut list = ResourceList::new();
        list.insert(Resource::new("Dashboard", "abc", json!({})))
            .unwrap();
        let err = list
            .insert(Resource::new("Dashboard", "abc", json!({"x": 1})))
            .unwrap_err();
        assert!(matches!(err, GrizzlyError::DuplicateResource { ref key } if key == "Dashboard.abc"));

        // Same uid under another kind is a different key
        list.insert(Resource::new("Folder", "abc", json!({}))).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut list = ResourceList::new();
        for uid in ["c", "a", "b"] {
            list.insert(Resource::new("Dashboard", uid, json!({}))).unwrap();
        }
        let uids: Vec<_> = list.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(uids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_manifest_from_value() {
        let manifest = Manifest::from_value(json!({
            "apiVersion": "grizzly.grafana.com/v1alpha1",
            "kind": "Dashboard",
            "metadata": {"name": "abc", "folder": "ops"},
            "spec": {"uid": "abc"}
        }))
        .unwrap();
        assert_eq!(manifest.kind, "Dashboard");
        assert_eq!(manifest.name(), "abc");
        assert_eq!(manifest.metadata_str("folder"), Some("ops"));
    }

    #[test]
    fn test_manifest_without_kind_is_rejected() {
        assert!(Manifest::from_value(json!({"metadata": {"name": "abc"}})).is_err());
    }

    #[test]
    fn test_to_manifest_round_trip() {
        let resource = Resource::new("Dashboard", "abc", json!({"title": "t"}));
        let manifest = resource.to_manifest("v1");
        assert_eq!(manifest.name(), "abc");
        assert_eq!(manifest.spec, json!({"title": "t"}));
    }
}
