//! Multi-document YAML streams.

use std::path::Path;

use serde::Deserialize;

use crate::error::{GrizzlyError, Result};
use crate::resource::Manifest;

/// Decodes every non-empty document of a YAML stream as a manifest.
pub fn parse_manifests(text: &str, path: &Path) -> Result<Vec<Manifest>> {
    let mut manifests = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| {
            GrizzlyError::ParseYaml {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        if value.is_null() {
            continue;
        }
        let manifest: Manifest =
            serde_yaml::from_value(value).map_err(|e| GrizzlyError::InvalidManifest {
                path: path.to_path_buf(),
                message: format!("document {}: {}", index, e),
            })?;
        manifests.push(manifest);
    }
    Ok(manifests)
}
