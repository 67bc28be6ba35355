//! One-shot operations over a [`ResourceList`].
//!
//! Resources are processed strictly in list order, one at a time. There is no
//! cross-resource transaction: an error stops the batch, leaving earlier
//! resources converged and later ones untouched. Only a remote not-found is
//! recovered from, per resource.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use similar::TextDiff;

use crate::config::Config;
use crate::error::{GrizzlyError, Result};
use crate::handler::{Handler, PreviewOpts, UnsupportedPolicy};
use crate::registry::validate_id;
use crate::resource::{Resource, ResourceList};

/// Lines of context in change diffs.
const DIFF_CONTEXT: usize = 3;

/// One row of [`Reconciler::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub api_version: String,
    pub kind: String,
    pub uid: String,
}

/// One rendered resource from [`Reconciler::show`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowItem {
    /// `Kind/uid`.
    pub name: String,
    pub content: String,
}

/// Unified diff from `remote` to `local`.
pub fn unified_diff(remote: &str, local: &str) -> String {
    TextDiff::from_lines(remote, local)
        .unified_diff()
        .context_radius(DIFF_CONTEXT)
        .header("Remote", "Local")
        .to_string()
}

/// Stateless reconciliation operations bound to a [`Config`].
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: Config,
}

impl Reconciler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn handler_for(&self, resource: &Resource) -> Result<Arc<dyn Handler>> {
        self.config.registry.handler_for_kind(&resource.kind)
    }

    /// Fetches a remote resource by UID and renders it.
    pub async fn get(&self, uid: &str) -> Result<String> {
        let (handler, id) = self.config.registry.resolve_uid(uid)?;
        let remote = handler
            .get_remote(&id)
            .await
            .map_err(|e| GrizzlyError::remote(handler.kind(), &id, &e))?;
        handler.get_representation(&handler.unprepare(&remote))
    }

    /// Lists resources with their handler's API version and kind.
    pub fn list(&self, resources: &ResourceList) -> Result<Vec<ListEntry>> {
        resources
            .iter()
            .map(|resource| {
                let handler = self.handler_for(resource)?;
                Ok(ListEntry {
                    api_version: handler.api_version().to_string(),
                    kind: handler.kind().to_string(),
                    uid: resource.uid.clone(),
                })
            })
            .collect()
    }

    /// Renders each resource as its handler presents it.
    pub fn show(&self, resources: &ResourceList) -> Result<Vec<ShowItem>> {
        resources
            .iter()
            .map(|resource| {
                let handler = self.handler_for(resource)?;
                let content = handler.get_representation(&handler.unprepare(resource))?;
                Ok(ShowItem {
                    name: format!("{}/{}", resource.kind, resource.uid),
                    content,
                })
            })
            .collect()
    }

    /// Compares each resource with its remote equivalent.
    pub async fn diff(&self, resources: &ResourceList) -> Result<()> {
        let notifier = &self.config.notifier;
        for resource in resources {
            let handler = self.handler_for(resource)?;
            let local = handler.get_representation(resource)?;

            let remote = match handler.get_remote(&resource.uid).await {
                Ok(remote) => remote,
                Err(e) if e.is_not_found() => {
                    notifier.not_found(resource);
                    continue;
                }
                Err(e) => return Err(GrizzlyError::remote(&resource.kind, &resource.uid, &e)),
            };
            let remote = handler.get_representation(&handler.unprepare(&remote))?;

            if local == remote {
                notifier.no_changes(resource);
            } else {
                notifier.has_changes(resource, &unified_diff(&remote, &local));
            }
        }
        Ok(())
    }

    /// Pushes each resource to its remote, adding or updating as needed.
    pub async fn apply(&self, resources: &ResourceList) -> Result<()> {
        for resource in resources {
            self.apply_one(resource).await?;
        }
        Ok(())
    }

    async fn apply_one(&self, resource: &Resource) -> Result<()> {
        let notifier = &self.config.notifier;
        let handler = self.handler_for(resource)?;
        let wrap = |e: GrizzlyError| GrizzlyError::remote(&resource.kind, &resource.uid, &e);

        let existing = match handler.get_remote(&resource.uid).await {
            Ok(existing) => existing,
            Err(e) if e.is_not_found() => {
                log::debug!("{} not found at remote, adding", resource.key());
                handler.add(resource).await.map_err(wrap)?;
                notifier.added(resource);
                return Ok(());
            }
            Err(e) => return Err(wrap(e)),
        };

        let local = handler.get_representation(resource)?;
        let prepared = handler.prepare(&existing, resource);
        let existing = handler.unprepare(&existing);
        let remote = handler.get_representation(&existing)?;

        if local == remote {
            notifier.no_changes(&prepared);
        } else {
            handler.update(&existing, &prepared).await.map_err(wrap)?;
            notifier.updated(&prepared);
        }
        Ok(())
    }

    /// Publishes previews for resources whose handler supports them.
    pub async fn preview(&self, resources: &ResourceList, opts: &PreviewOpts) -> Result<()> {
        let notifier = &self.config.notifier;
        for resource in resources {
            let handler = self.handler_for(resource)?;
            let Some(previewer) = handler.as_preview() else {
                notifier.not_supported(handler.kind(), &resource.uid, "preview");
                match opts.on_unsupported {
                    UnsupportedPolicy::Stop => return Ok(()),
                    UnsupportedPolicy::Skip => continue,
                }
            };

            let preview = previewer
                .preview(resource, opts)
                .await
                .map_err(|e| GrizzlyError::remote(&resource.kind, &resource.uid, &e))?;
            let Some(preview) = preview else {
                continue;
            };
            notifier.info(Some(resource), &format!("view: {}", preview.url));
            notifier.error(Some(resource), &format!("delete: {}", preview.delete_url));
            if opts.expires_seconds > 0 {
                notifier.warn(
                    Some(resource),
                    &format!(
                        "Previews will expire and be deleted automatically in {} seconds",
                        opts.expires_seconds
                    ),
                );
            }
        }
        Ok(())
    }

    /// Writes each resource to `<dir>/<Kind>/<uid>.<extension>`.
    ///
    /// Files whose content is already identical are left alone.
    pub async fn export(&self, dir: &Path, resources: &ResourceList) -> Result<()> {
        let notifier = &self.config.notifier;
        create_dir(dir).await?;

        for resource in resources {
            validate_id(&resource.uid)?;
            let handler = self.handler_for(resource)?;
            let content = export_content(handler.as_ref(), resource)?;

            let kind_dir = dir.join(&resource.kind);
            create_dir(&kind_dir).await?;
            let path = kind_dir.join(format!("{}.{}", resource.uid, handler.get_extension()));

            let existing = match tokio::fs::read_to_string(&path).await {
                Ok(existing) => Some(existing),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(source) => return Err(GrizzlyError::ReadFile { path, source }),
            };
            if existing.as_deref() == Some(content.as_str()) {
                notifier.no_changes(resource);
                continue;
            }

            tokio::fs::write(&path, content.as_bytes())
                .await
                .map_err(|source| GrizzlyError::WriteFile {
                    path: path.clone(),
                    source,
                })?;
            if existing.is_none() {
                notifier.added(resource);
            } else {
                notifier.updated(resource);
            }
        }
        Ok(())
    }
}

async fn create_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| GrizzlyError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })
}

/// Renders a resource as a full manifest in the handler's file format.
pub fn export_content(handler: &dyn Handler, resource: &Resource) -> Result<String> {
    let manifest = resource.to_manifest(handler.api_version());
    if handler.get_extension() == "json" {
        let mut json = serde_json::to_string_pretty(&manifest)?;
        json.push('\n');
        Ok(json)
    } else {
        Ok(serde_yaml::to_string(&manifest)?)
    }
}
